//! Cache backend seam.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache call exceeded {0:?}")]
    Timeout(Duration),
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
}

/// A string key/value store with per-entry expiry.
///
/// Implementations must be safe to share across request tasks. Errors are
/// reported, never retried; the caller decides how to degrade.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// `Ok(None)` is a miss. Expired entries are misses.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    fn backend_name(&self) -> &'static str;
}
