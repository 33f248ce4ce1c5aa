//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up the instrumentation pipeline
//! - Bind the server to a listener and drain on shutdown

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::{graphql, handlers, pipeline};
use crate::resolver::StoreResolver;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: StoreResolver,
    /// `None` when metrics are disabled.
    pub metrics: Option<PrometheusHandle>,
}

/// HTTP server for the store service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ServiceConfig, state: AppState) -> Self {
        Self {
            router: build_router(config, state),
        }
    }

    /// Run the server until `shutdown` resolves, then drain in-flight
    /// requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router. `/metrics` sits outside the pipeline so scrapes
/// do not count themselves.
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    let instrumented = Router::new()
        .route("/", get(handlers::root))
        .route("/store", get(handlers::get_store))
        .route("/graphql", post(graphql::execute).layer(graphql::cors()))
        .route("/health", get(handlers::health));
    let instrumented = pipeline::instrument(
        instrumented,
        Duration::from_secs(config.timeouts.request_secs),
    );

    instrumented
        .merge(Router::new().route("/metrics", get(handlers::metrics)))
        .with_state(state)
}
