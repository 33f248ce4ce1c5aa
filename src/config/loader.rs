//! Configuration loading from disk and environment.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{CacheBackendKind, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
    #[error("Invalid value `{value}` for {var}")]
    Env { var: &'static str, value: String },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read configuration from a TOML file.
///
/// A missing file is not an error: the service starts on defaults. Any other
/// IO failure or a parse error is returned. No validation happens here.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Config file not found; using defaults");
            return Ok(ServiceConfig::default());
        }
        Err(e) => return Err(e.into()),
    };
    Ok(toml::from_str(&content)?)
}

/// Resolve the effective configuration for the binary.
///
/// Order: file (or defaults when no path is given), then process environment,
/// then validation of the merged result.
pub fn load_effective(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    let config = apply_overrides(config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Recognized variables:
/// - `DATABASE_URL`
/// - `STORE_BIND_ADDRESS`
/// - `STORE_CACHE_ENABLED` (`true`/`false`)
/// - `REDIS_ADDR` (`host:port` or a `redis://` URL), which also selects the
///   Redis backend
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`, falling back to `JAEGER_ENDPOINT`
pub fn apply_overrides<F>(mut config: ServiceConfig, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
        config.database.url = Some(url);
    }
    if let Some(addr) = lookup("STORE_BIND_ADDRESS").filter(|v| !v.is_empty()) {
        config.listener.bind_address = addr;
    }
    if let Some(flag) = lookup("STORE_CACHE_ENABLED") {
        config.cache.enabled = flag.parse().map_err(|_| ConfigError::Env {
            var: "STORE_CACHE_ENABLED",
            value: flag.clone(),
        })?;
    }
    if let Some(addr) = lookup("REDIS_ADDR").filter(|v| !v.is_empty()) {
        config.cache.backend = CacheBackendKind::Redis;
        config.cache.redis_url = redis_url(&addr);
    }
    let endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
        .or_else(|| lookup("JAEGER_ENDPOINT"))
        .filter(|v| !v.is_empty());
    if let Some(endpoint) = endpoint {
        config.observability.otlp_endpoint = Some(endpoint);
    }
    Ok(config)
}

/// Accept a bare `host:port` as well as a full connection URL.
fn redis_url(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("redis://{addr}")
    }
}
