//! Store service.
//!
//! A store CRUD service with a cache-aside read path, instrumented with
//! Prometheus metrics, OTLP trace spans and sampled JSON logs.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────────┐
//!                      │                   STORE SERVICE                    │
//!                      │                                                    │
//!   Client Request     │  ┌──────────┐   ┌────────────┐   ┌─────────────┐  │
//!   ───────────────────┼─▶│   http   │──▶│  pipeline  │──▶│  handlers / │  │
//!                      │  │  server  │   │ id/span/   │   │  graphql    │  │
//!                      │  └──────────┘   │ metrics/log│   └──────┬──────┘  │
//!                      │                 └────────────┘          │         │
//!                      │                                         ▼         │
//!                      │                                 ┌─────────────┐   │
//!                      │                  ┌──────────────│  resolver   │   │
//!                      │                  ▼              └──────┬──────┘   │
//!                      │           ┌────────────┐               ▼          │
//!                      │           │   cache    │        ┌─────────────┐   │
//!                      │           │ (side)     │        │ entity store│───┼── Postgres
//!                      │           └────────────┘        └─────────────┘   │
//!                      │                                                    │
//!                      │  ┌──────────────────────────────────────────────┐ │
//!                      │  │  config · observability · lifecycle          │ │
//!                      │  └──────────────────────────────────────────────┘ │
//!                      └───────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use store_service::config::load_effective;
use store_service::http::HttpServer;
use store_service::lifecycle::{signals, startup, Shutdown};
use store_service::observability::{logging, metrics, tracing as otel};

#[derive(Parser, Debug)]
#[command(name = "store-service", version, about = "Store CRUD service")]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_effective(args.config.as_deref())?;

    let provider = otel::build_tracer_provider(&config.observability)?;
    logging::init(&config.observability, provider.as_ref())?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        log_sample_rate = config.observability.log_sample_rate,
        otlp_endpoint = ?config.observability.otlp_endpoint,
        update_mode = ?config.resolver.update_mode,
        "store-service v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let metrics_handle = if config.observability.metrics_enabled {
        Some(metrics::install_recorder()?)
    } else {
        None
    };

    let services = startup::build_services(&config, metrics_handle).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let drained = shutdown.wait();
    tokio::spawn(signals::forward_signals(shutdown.clone()));

    let server = HttpServer::new(&config, services.state);
    let result = server.run(listener, drained).await;

    if let Some(sweeper) = services.sweeper {
        sweeper.abort();
    }
    if let Some(provider) = provider {
        otel::shutdown_tracer_provider(provider);
    }

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
