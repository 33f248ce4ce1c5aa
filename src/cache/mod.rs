//! Cache-aside layer for store reads.
//!
//! # Data Flow
//! ```text
//! GET /store?id=N
//!     → lookup("store:N")        Hit  → cached body, X-Cache: HIT
//!                                Miss → entity store
//!     → populate("store:N", body, ttl)  → X-Cache: MISS
//!
//! create / update / delete (after commit)
//!     → invalidate("store:N")
//! ```
//!
//! # Degradation
//! A backend error or a call exceeding the cache timeout is `Unavailable`:
//! logged at WARN, counted in `cache_errors_total`, and otherwise ignored.
//! Lookups then behave as misses and writes are skipped. With no backend at
//! all the layer is a silent pass-through.
//!
//! # Consistency
//! Invalidation is not ordered against concurrent reads. A reader that misses,
//! loads the row, and populates after a writer's invalidate puts the old body
//! back with a fresh TTL. No lock or version guards this window; staleness is
//! bounded by the TTL.

pub mod backend;
pub mod memory;
pub mod redis;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

pub use backend::{CacheBackend, CacheError};
pub use memory::MemoryCache;
pub use self::redis::RedisCache;

use crate::config::CacheConfig;
use crate::observability::metrics;

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(String),
    Miss,
    Unavailable,
}

/// Outcome of a populate or invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    Ok,
    /// No backend configured; nothing was attempted.
    Skipped,
    Unavailable,
}

/// Value of the `X-Cache` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Shared handle to the optional side-cache. Cheap to clone.
#[derive(Clone)]
pub struct StoreCache {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
    timeout: Duration,
    prefix: Arc<str>,
}

impl StoreCache {
    pub fn new(backend: Arc<dyn CacheBackend>, config: &CacheConfig) -> Self {
        Self {
            backend: Some(backend),
            ..Self::disabled(config)
        }
    }

    /// A cache that never stores anything and never warns.
    pub fn disabled(config: &CacheConfig) -> Self {
        Self {
            backend: None,
            ttl: Duration::from_secs(config.ttl_secs),
            timeout: Duration::from_millis(config.timeout_ms),
            prefix: Arc::from(config.key_prefix.as_str()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn key(&self, id: i64) -> String {
        format!("{}:{}", self.prefix, id)
    }

    pub async fn lookup(&self, id: i64) -> CacheLookup {
        let Some(backend) = &self.backend else {
            return CacheLookup::Miss;
        };
        let key = self.key(id);
        let span = tracing::info_span!("cache.get", operation = "read", cache.key = %key, store.id = id);

        match self.bounded(backend.get(&key)).instrument(span).await {
            Ok(Some(body)) => {
                tracing::info!(store_id = id, cache_key = %key, "cache hit");
                metrics::record_cache_hit(&self.prefix);
                CacheLookup::Hit(body)
            }
            Ok(None) => {
                tracing::info!(store_id = id, "cache miss");
                metrics::record_cache_miss(&self.prefix);
                CacheLookup::Miss
            }
            Err(e) => {
                tracing::warn!(store_id = id, error = %e, "cache error");
                metrics::record_cache_error(&self.prefix, "get");
                CacheLookup::Unavailable
            }
        }
    }

    pub async fn populate(&self, id: i64, body: &str) -> CacheWrite {
        let Some(backend) = &self.backend else {
            return CacheWrite::Skipped;
        };
        let key = self.key(id);
        let span = tracing::info_span!(
            "cache.set",
            operation = "read",
            cache.key = %key,
            cache.ttl_seconds = self.ttl.as_secs(),
            store.id = id
        );

        match self
            .bounded(backend.set(&key, body.to_string(), self.ttl))
            .instrument(span)
            .await
        {
            Ok(()) => {
                tracing::info!(store_id = id, ttl_secs = self.ttl.as_secs(), "response cached");
                CacheWrite::Ok
            }
            Err(e) => {
                tracing::warn!(store_id = id, error = %e, "failed to cache response");
                metrics::record_cache_error(&self.prefix, "set");
                CacheWrite::Unavailable
            }
        }
    }

    /// Remove the entry for `id`. `operation` names the mutation for logs and
    /// spans ("create", "update", "delete").
    pub async fn invalidate(&self, id: i64, operation: &'static str) -> CacheWrite {
        let Some(backend) = &self.backend else {
            return CacheWrite::Skipped;
        };
        let key = self.key(id);
        let span = tracing::info_span!("cache.del", operation, cache.key = %key, store.id = id);

        match self.bounded(backend.delete(&key)).instrument(span).await {
            Ok(()) => {
                tracing::info!(store_id = id, operation, "cache invalidated");
                CacheWrite::Ok
            }
            Err(e) => {
                tracing::warn!(store_id = id, operation, error = %e, "failed to invalidate cache");
                metrics::record_cache_error(&self.prefix, "delete");
                CacheWrite::Unavailable
            }
        }
    }

    /// Apply the cache deadline. Elapsed calls become `CacheError::Timeout`.
    async fn bounded<T, F>(&self, call: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }
}

impl std::fmt::Debug for StoreCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCache")
            .field("backend", &self.backend.as_ref().map(|b| b.backend_name()))
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .field("prefix", &self.prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Stalled;

    #[async_trait]
    impl CacheBackend for Stalled {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            std::future::pending().await
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            std::future::pending().await
        }
        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            std::future::pending().await
        }
        fn backend_name(&self) -> &'static str {
            "stalled"
        }
    }

    fn config() -> CacheConfig {
        CacheConfig {
            timeout_ms: 50,
            ..CacheConfig::default()
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let cache = StoreCache::new(Arc::new(MemoryCache::new()), &config());
        assert_eq!(cache.lookup(1).await, CacheLookup::Miss);
        assert_eq!(cache.populate(1, "{\"a\": 1}").await, CacheWrite::Ok);
        assert_eq!(cache.lookup(1).await, CacheLookup::Hit("{\"a\": 1}".into()));
        assert_eq!(cache.invalidate(1, "update").await, CacheWrite::Ok);
        assert_eq!(cache.lookup(1).await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_disabled_is_pass_through() {
        let cache = StoreCache::disabled(&config());
        assert!(!cache.is_enabled());
        assert_eq!(cache.lookup(1).await, CacheLookup::Miss);
        assert_eq!(cache.populate(1, "x").await, CacheWrite::Skipped);
        assert_eq!(cache.invalidate(1, "delete").await, CacheWrite::Skipped);
    }

    #[tokio::test]
    async fn test_stalled_backend_times_out() {
        let cache = StoreCache::new(Arc::new(Stalled), &config());
        assert_eq!(cache.lookup(1).await, CacheLookup::Unavailable);
        assert_eq!(cache.populate(1, "x").await, CacheWrite::Unavailable);
        assert_eq!(cache.invalidate(1, "create").await, CacheWrite::Unavailable);
    }

    #[test]
    fn test_key_format() {
        let cache = StoreCache::disabled(&CacheConfig::default());
        assert_eq!(cache.key(42), "store:42");
        assert_eq!(CacheStatus::Hit.as_str(), "HIT");
        assert_eq!(CacheStatus::Miss.as_str(), "MISS");
    }
}
