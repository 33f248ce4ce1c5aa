//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (RED for requests, hit/miss for the cache)
//! - Install the Prometheus recorder once per process
//! - Render the pull-style exposition for `/metrics`
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, path, status
//! - `http_request_duration_seconds` (histogram): latency by method, path
//! - `cache_hits_total` / `cache_misses_total` (counter): by cache key prefix
//! - `cache_errors_total` (counter): degraded cache calls by prefix, operation
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; when no recorder is
//!   installed (unit tests) every call is a no-op
//! - Histogram buckets match the Prometheus client defaults

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const CACHE_HITS_TOTAL: &str = "cache_hits_total";
pub const CACHE_MISSES_TOTAL: &str = "cache_misses_total";
pub const CACHE_ERRORS_TOTAL: &str = "cache_errors_total";

/// Prometheus client default buckets, in seconds.
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the process-wide Prometheus recorder.
///
/// Safe to call more than once; later calls return the first handle.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
            LATENCY_BUCKETS,
        )?
        .install_recorder()?;
    describe();
    Ok(METRICS_HANDLE.get_or_init(|| handle).clone())
}

fn describe() {
    metrics::describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests");
    metrics::describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "HTTP request duration in seconds"
    );
    metrics::describe_counter!(CACHE_HITS_TOTAL, "Total number of cache hits");
    metrics::describe_counter!(CACHE_MISSES_TOTAL, "Total number of cache misses");
    metrics::describe_counter!(CACHE_ERRORS_TOTAL, "Cache calls that failed or timed out");
}

/// Record one completed request. Called exactly once per request by the
/// metrics stage of the pipeline.
pub fn record_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    metrics::counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_owned(),
        "path" => path.to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method.to_owned(),
        "path" => path.to_owned()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_cache_hit(prefix: &str) {
    metrics::counter!(CACHE_HITS_TOTAL, "cache_key_prefix" => prefix.to_owned()).increment(1);
}

pub fn record_cache_miss(prefix: &str) {
    metrics::counter!(CACHE_MISSES_TOTAL, "cache_key_prefix" => prefix.to_owned()).increment(1);
}

pub fn record_cache_error(prefix: &str, operation: &'static str) {
    metrics::counter!(
        CACHE_ERRORS_TOTAL,
        "cache_key_prefix" => prefix.to_owned(),
        "operation" => operation
    )
    .increment(1);
}

/// Read a sample value out of a Prometheus text exposition.
///
/// Matches the first line for `name` whose label set contains every
/// `key="value"` pair in `labels`. Used by `/metrics` consumers in tests and
/// the CLI.
pub fn sample_value(exposition: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    exposition
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
        })
        .find(|line| {
            labels
                .iter()
                .all(|(k, v)| line.contains(&format!("{k}=\"{v}\"")))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}
