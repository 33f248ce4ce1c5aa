//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline, cache layer, resolver produce:
//!     → logging.rs (structured JSON events, sampled below WARN)
//!     → metrics.rs (request RED metrics, cache hit/miss/error counters)
//!     → tracing.rs (spans exported over OTLP/HTTP)
//!
//! Consumers:
//!     → stdout (JSON lines)
//!     → GET /metrics (Prometheus scrape)
//!     → OTLP collector (optional, e.g. Jaeger)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the root span of every request
//! - Metrics are cheap (atomic increments behind the `metrics` facade)
//! - Span export is optional; without an endpoint spans only feed log context

pub mod logging;
pub mod metrics;
pub mod tracing;
