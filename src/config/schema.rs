//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the store service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Entity store connection settings.
    pub database: DatabaseConfig,

    /// Side-cache settings.
    pub cache: CacheConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// CRUD resolver behavior.
    pub resolver: ResolverConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Entity store configuration.
///
/// Without a `url` the service keeps its stores in process memory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection string. May contain credentials; never logged.
    pub url: Option<String>,

    /// Upper bound on pooled connections.
    pub max_connections: u32,

    /// How long a request waits for a pooled connection, in milliseconds.
    pub acquire_timeout_ms: u64,

    /// Create the `stores` table on startup when it is missing.
    pub ensure_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_ms: 5_000,
            ensure_schema: true,
        }
    }
}

/// Side-cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the cache. When false every read goes to the entity store.
    pub enabled: bool,

    /// Which backend holds the entries.
    pub backend: CacheBackendKind,

    /// Redis connection string, used when `backend = "redis"`.
    pub redis_url: String,

    /// Deadline for the startup connect and PING, in milliseconds. On
    /// failure the service runs without a cache.
    pub connect_timeout_ms: u64,

    /// Entry lifetime in seconds, counted from the write.
    pub ttl_secs: u64,

    /// Per-operation deadline for cache calls, in milliseconds.
    /// Independent of the request timeout.
    pub timeout_ms: u64,

    /// Key prefix; entries are stored under `<prefix>:<id>`.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackendKind::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            connect_timeout_ms: 5_000,
            ttl_secs: 300, // 5 minutes
            timeout_ms: 2_000,
            key_prefix: "store".to_string(),
        }
    }
}

/// Cache backend selection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    /// In-process map, private to this instance.
    #[default]
    Memory,
    /// Shared Redis server.
    Redis,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Probability that a sub-warning log line is emitted (0.0..=1.0).
    pub log_sample_rate: f64,

    /// OTLP/HTTP trace collector endpoint. Tracing export is off when unset.
    pub otlp_endpoint: Option<String>,

    /// `service.name` resource attribute for exported spans.
    pub service_name: String,

    /// Expose `/metrics` on the main listener.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_sample_rate: 0.05,
            otlp_endpoint: None,
            service_name: "store-service".to_string(),
            metrics_enabled: true,
        }
    }
}

/// How `updateStore` treats fields the caller did not supply.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Omitted fields keep their stored value.
    #[default]
    PreserveUnspecified,
    /// Omitted fields are written as the zero value of their type
    /// (empty string, 0, false). Full-row overwrite.
    ResetUnspecified,
}

/// CRUD resolver configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResolverConfig {
    pub update_mode: UpdateMode,
}
