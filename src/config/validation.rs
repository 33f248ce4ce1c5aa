//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, sample rate within [0, 1])
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{CacheBackendKind, ServiceConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),
    #[error("cache.ttl_secs must be greater than zero")]
    ZeroCacheTtl,
    #[error("cache.timeout_ms must be greater than zero")]
    ZeroCacheTimeout,
    #[error("cache.redis_url must not be empty when cache.backend is redis")]
    EmptyRedisUrl,
    #[error("cache.connect_timeout_ms must be greater than zero")]
    ZeroConnectTimeout,
    #[error("cache.key_prefix must not be empty")]
    EmptyKeyPrefix,
    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
    #[error("observability.log_sample_rate {0} is outside 0.0..=1.0")]
    SampleRate(f64),
    #[error("database.max_connections must be greater than zero")]
    ZeroPoolSize,
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::ZeroCacheTtl);
    }
    if config.cache.timeout_ms == 0 {
        errors.push(ValidationError::ZeroCacheTimeout);
    }
    if config.cache.backend == CacheBackendKind::Redis && config.cache.redis_url.is_empty() {
        errors.push(ValidationError::EmptyRedisUrl);
    }
    if config.cache.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if config.cache.key_prefix.is_empty() {
        errors.push(ValidationError::EmptyKeyPrefix);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    let rate = config.observability.log_sample_rate;
    if !(0.0..=1.0).contains(&rate) {
        errors.push(ValidationError::SampleRate(rate));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::ZeroPoolSize);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
