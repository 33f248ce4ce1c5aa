//! Request instrumentation pipeline.
//!
//! # Stages (outermost first)
//! ```text
//! set request id → echo request id → root `request` span → metrics
//!     → request log → timeout → handler
//! ```
//!
//! # Design Decisions
//! - Composed once at startup; every instrumented route gets the same chain
//! - Metrics are recorded exactly once per request, in one stage, including
//!   responses produced by the timeout stage
//! - `path` labels use the matched route template, never the raw URI

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response, StatusCode};
use axum::middleware::{self, Next};
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::observability::metrics;
use crate::observability::tracing::trace_context_from_headers;

/// Label used when no route matched.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Apply the full pipeline to `router`. Routes merged in afterwards are not
/// instrumented.
pub fn instrument<S>(router: axum::Router<S>, request_timeout: Duration) -> axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(make_request_span)
                    .on_request(())
                    .on_response(record_status)
                    .on_failure(()),
            )
            .layer(middleware::from_fn(record_metrics))
            .layer(middleware::from_fn(log_request))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                request_timeout,
            )),
    )
}

/// Root span covering the whole handler lifetime.
fn make_request_span(request: &Request<Body>) -> Span {
    let span = tracing::info_span!(
        "request",
        method = %request.method(),
        path = %matched_path(request),
        request_id = %request_id(request),
        status = tracing::field::Empty,
    );
    span.set_parent(trace_context_from_headers(request.headers()));
    span
}

fn record_status(response: &Response<Body>, _latency: Duration, span: &Span) {
    span.record("status", response.status().as_u16());
}

fn matched_path<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned())
}

async fn record_metrics(request: Request<Body>, next: Next) -> axum::response::Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = matched_path(&request);

    let response = next.run(request).await;

    metrics::record_request(&method, &path, response.status().as_u16(), start.elapsed());
    response
}

async fn log_request(request: Request<Body>, next: Next) -> axum::response::Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::error!(%method, %path, status, latency_ms, "request failed");
    } else if response.status().is_client_error() {
        tracing::warn!(%method, %path, status, latency_ms, "request rejected");
    } else {
        tracing::info!(%method, %path, status, latency_ms, "request completed");
    }
    response
}
