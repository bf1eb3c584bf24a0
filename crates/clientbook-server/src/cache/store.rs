//! The cache capability consumed by the record service.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Failures of the cache store. A miss is not an error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache could not be reached (pool exhausted, connection refused, timeout).
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// The cache was reached but rejected the command.
    #[error("Cache command failed: {0}")]
    Command(String),
}

/// Key/value store with per-key expiration.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored bytes, or `None` on a miss or an expired entry.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Replaces the entry wholesale with a fresh TTL.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Removes the entry. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Removes every entry whose key starts with `prefix`, returning how many went.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str;
}

pub type DynCacheStore = Arc<dyn CacheStore>;
