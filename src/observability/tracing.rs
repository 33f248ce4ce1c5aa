//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OTLP/HTTP tracer provider when an endpoint is configured
//! - Extract W3C trace context from incoming request headers
//! - Flush pending spans on shutdown
//!
//! # Design Decisions
//! - Optional: with no endpoint, spans still exist for log context but are
//!   never exported
//! - Export is batched on a background worker and never blocks a request

use opentelemetry::propagation::Extractor;
use opentelemetry::global;
use opentelemetry_otlp::{ExporterBuildError, SpanExporter, WithExportConfig};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::OnceLock;

use crate::config::ObservabilityConfig;

const TRACES_PATH: &str = "/v1/traces";

static PROPAGATOR_INIT: OnceLock<()> = OnceLock::new();

/// Build a batching tracer provider exporting to `otlp_endpoint`.
///
/// Returns `Ok(None)` when no endpoint is configured.
pub fn build_tracer_provider(
    config: &ObservabilityConfig,
) -> Result<Option<SdkTracerProvider>, ExporterBuildError> {
    let Some(endpoint) = config.otlp_endpoint.as_deref() else {
        return Ok(None);
    };

    let exporter = SpanExporter::builder()
        .with_http()
        .with_endpoint(traces_url(endpoint))
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder()
                .with_service_name(config.service_name.clone())
                .build(),
        )
        .build();

    install_propagator();
    Ok(Some(provider))
}

/// Full traces URL for an OTLP/HTTP collector address. A bare `host:port`
/// is taken as plain HTTP.
pub fn traces_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    let base = if base.contains("://") {
        base.to_string()
    } else {
        format!("http://{base}")
    };
    if base.ends_with(TRACES_PATH) {
        base
    } else {
        format!("{base}{TRACES_PATH}")
    }
}

fn install_propagator() {
    PROPAGATOR_INIT.get_or_init(|| {
        global::set_text_map_propagator(TraceContextPropagator::new());
    });
}

/// Parent context carried by `traceparent` / `tracestate`, if any.
pub fn trace_context_from_headers(headers: &axum::http::HeaderMap) -> opentelemetry::Context {
    install_propagator();
    global::get_text_map_propagator(|prop| prop.extract(&HeaderMapExtractor(headers)))
}

struct HeaderMapExtractor<'a>(&'a axum::http::HeaderMap);

impl Extractor for HeaderMapExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

/// Flush and stop the exporter. Errors are logged, not returned.
pub fn shutdown_tracer_provider(provider: SdkTracerProvider) {
    match provider.shutdown() {
        Ok(()) => tracing::info!("Tracer provider shut down"),
        Err(e) => tracing::error!(error = %e, "Failed to shut down tracer provider"),
    }
}
