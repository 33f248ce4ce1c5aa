//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the entity store (Postgres when a URL is configured, in-memory
//!   otherwise)
//! - Create the side-cache: in-process with an expiry sweeper, or Redis
//! - Assemble the shared application state
//!
//! # Design Decisions
//! - Fail fast: an unreachable database is fatal
//! - A disabled or unreachable cache is not an error; the service runs
//!   without it

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::cache::{MemoryCache, RedisCache, StoreCache};
use crate::config::{CacheBackendKind, CacheConfig, ServiceConfig};
use crate::http::AppState;
use crate::resolver::StoreResolver;
use crate::store::{MemoryStoreRepository, PostgresStoreRepository, StoreError, StoreRepository};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("entity store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Shared state plus the background tasks started alongside it.
pub struct Services {
    pub state: AppState,
    pub sweeper: Option<JoinHandle<()>>,
}

pub async fn build_services(
    config: &ServiceConfig,
    metrics: Option<PrometheusHandle>,
) -> Result<Services, StartupError> {
    let store = open_store(config).await?;
    store.health_check().await?;
    tracing::info!(backend = store.backend_name(), "Entity store ready");

    let (cache, sweeper) = open_cache(&config.cache).await;

    let resolver = StoreResolver::new(store, cache, config.resolver.update_mode);
    Ok(Services {
        state: AppState { resolver, metrics },
        sweeper,
    })
}

/// Pick the cache backend. Redis that cannot be reached within the connect
/// deadline leaves the service running without a cache.
async fn open_cache(config: &CacheConfig) -> (StoreCache, Option<JoinHandle<()>>) {
    if !config.enabled {
        tracing::warn!("Cache disabled; continuing without cache");
        return (StoreCache::disabled(config), None);
    }

    match config.backend {
        CacheBackendKind::Memory => {
            let backend = MemoryCache::new();
            let period = Duration::from_secs(config.ttl_secs.max(1));
            let sweeper = backend.spawn_sweeper(period);
            tracing::info!(
                backend = "memory",
                ttl_secs = config.ttl_secs,
                timeout_ms = config.timeout_ms,
                "Cache enabled"
            );
            (StoreCache::new(Arc::new(backend), config), Some(sweeper))
        }
        CacheBackendKind::Redis => {
            let deadline = Duration::from_millis(config.connect_timeout_ms);
            match RedisCache::connect(&config.redis_url, deadline).await {
                Ok(backend) => {
                    tracing::info!(
                        backend = "redis",
                        ttl_secs = config.ttl_secs,
                        timeout_ms = config.timeout_ms,
                        "Cache enabled"
                    );
                    (StoreCache::new(Arc::new(backend), config), None)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Redis connection failed; continuing without cache");
                    (StoreCache::disabled(config), None)
                }
            }
        }
    }
}

async fn open_store(config: &ServiceConfig) -> Result<Arc<dyn StoreRepository>, StoreError> {
    match config.database.url.as_deref() {
        Some(url) => {
            let repo = PostgresStoreRepository::connect(url, &config.database).await?;
            Ok(Arc::new(repo))
        }
        None => {
            tracing::warn!("No database URL configured; using in-memory entity store");
            Ok(Arc::new(MemoryStoreRepository::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_build_memory_services() {
        let services = build_services(&ServiceConfig::default(), None).await.unwrap();
        assert!(services.state.resolver.cache().is_enabled());
        assert!(services.sweeper.is_some());
        assert!(services.state.metrics.is_none());
    }

    #[tokio::test]
    async fn test_cache_can_be_disabled() {
        let mut config = ServiceConfig::default();
        config.cache.enabled = false;
        let services = build_services(&config, None).await.unwrap();
        assert!(!services.state.resolver.cache().is_enabled());
        assert!(services.sweeper.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_redis_runs_without_cache() {
        let mut config = ServiceConfig::default();
        config.cache.backend = CacheBackendKind::Redis;
        config.cache.redis_url = "redis://127.0.0.1:1".into();
        config.cache.connect_timeout_ms = 300;

        let services = build_services(&config, None).await.unwrap();
        assert!(!services.state.resolver.cache().is_enabled());
        assert!(services.sweeper.is_none());
    }

    #[tokio::test]
    async fn test_malformed_redis_url_runs_without_cache() {
        let mut config = ServiceConfig::default();
        config.cache.backend = CacheBackendKind::Redis;
        config.cache.redis_url = "not a url".into();

        let services = build_services(&config, None).await.unwrap();
        assert!(!services.state.resolver.cache().is_enabled());
    }
}
