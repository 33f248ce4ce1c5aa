//! Structured, sampled logging.
//!
//! # Responsibilities
//! - Decide per log call whether an event is emitted
//! - Provide the per-layer filter that applies that decision to the JSON
//!   output layer
//!
//! # Design Decisions
//! - WARN and ERROR are always emitted
//! - Lower levels are emitted with a fixed probability, drawn independently
//!   for every event. Two lines from the same request are not correlated:
//!   one may be kept while its sibling is dropped
//! - Spans are never sampled here, so trace export and span context in the
//!   log output are unaffected
//! - The decision does not depend on the logging backend

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use rand::Rng;
use tracing::{Level, Metadata};
use tracing_subscriber::layer::{Context, Filter, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::ObservabilityConfig;

/// Install the global subscriber: `EnvFilter`, the sampled JSON output layer,
/// and span export when a tracer provider is given.
///
/// `RUST_LOG` overrides `observability.log_level` when set.
pub fn init(
    config: &ObservabilityConfig,
    provider: Option<&SdkTracerProvider>,
) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let json = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_filter(SamplingFilter::new(config.log_sample_rate));

    let otel = provider.map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(otel)
        .try_init()
}

/// Whether a log record at `level` should be emitted under `rate`.
pub fn should_sample(level: &Level, rate: f64) -> bool {
    decide(level, rate, rand::thread_rng().gen::<f64>())
}

/// Sampling decision with an explicit uniform draw in `[0, 1)`.
pub fn decide(level: &Level, rate: f64, draw: f64) -> bool {
    // In `tracing`, more severe levels compare as smaller.
    if *level <= Level::WARN {
        return true;
    }
    draw < rate
}

/// Per-layer filter that samples events below WARN.
#[derive(Debug, Clone, Copy)]
pub struct SamplingFilter {
    rate: f64,
}

impl SamplingFilter {
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl<S> Filter<S> for SamplingFilter {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        if meta.is_span() {
            return true;
        }
        should_sample(meta.level(), self.rate)
    }

    fn callsite_enabled(
        &self,
        meta: &'static Metadata<'static>,
    ) -> tracing::subscriber::Interest {
        if meta.is_span() || *meta.level() <= Level::WARN {
            tracing::subscriber::Interest::always()
        } else {
            // Re-evaluated on every event.
            tracing::subscriber::Interest::sometimes()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_warn_and_error_always_emitted() {
        for draw in [0.0, 0.5, 0.999] {
            assert!(decide(&Level::WARN, 0.0, draw));
            assert!(decide(&Level::ERROR, 0.0, draw));
        }
    }

    #[test]
    fn test_info_follows_rate() {
        assert!(decide(&Level::INFO, 0.05, 0.01));
        assert!(!decide(&Level::INFO, 0.05, 0.05));
        assert!(!decide(&Level::DEBUG, 0.05, 0.9));
        assert!(!should_sample(&Level::INFO, 0.0));
        assert!(should_sample(&Level::INFO, 1.0));
    }

    #[test]
    fn test_rate_is_clamped() {
        assert_eq!(SamplingFilter::new(3.0).rate(), 1.0);
        assert_eq!(SamplingFilter::new(-1.0).rate(), 0.0);
    }

    #[derive(Clone, Default)]
    struct Counts {
        info: Arc<AtomicUsize>,
        warn: Arc<AtomicUsize>,
        error: Arc<AtomicUsize>,
    }

    impl<S: tracing::Subscriber> Layer<S> for Counts {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let counter = match *event.metadata().level() {
                Level::ERROR => &self.error,
                Level::WARN => &self.warn,
                Level::INFO => &self.info,
                _ => return,
            };
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_filter_drops_info_keeps_warn() {
        let counts = Counts::default();
        let subscriber = tracing_subscriber::registry()
            .with(counts.clone().with_filter(SamplingFilter::new(0.0)));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("request");
            let _guard = span.enter();
            for _ in 0..20 {
                tracing::info!("cache miss");
            }
            tracing::warn!("cache error");
            tracing::error!("database error");
        });

        assert_eq!(counts.info.load(Ordering::SeqCst), 0);
        assert_eq!(counts.warn.load(Ordering::SeqCst), 1);
        assert_eq!(counts.error.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_full_rate_keeps_everything() {
        let counts = Counts::default();
        let subscriber = tracing_subscriber::registry()
            .with(counts.clone().with_filter(SamplingFilter::new(1.0)));

        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..10 {
                tracing::info!("store query successful");
            }
        });

        assert_eq!(counts.info.load(Ordering::SeqCst), 10);
    }
}
