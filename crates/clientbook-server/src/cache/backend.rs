//! Cache backends: process-local (DashMap) and Redis.

use async_trait::async_trait;
use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::{AsyncCommands, RedisError};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::store::{CacheError, CacheStore};

/// Keys fetched per `SCAN` round trip during prefix deletion.
const SCAN_COUNT: usize = 100;

/// A cached entry with TTL support.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub cached_at: Instant,
    pub ttl: Duration,
}

impl CachedEntry {
    /// Create a new cached entry.
    pub fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            cached_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.cached_at.elapsed() >= self.ttl
    }
}

/// Cache backend selected at startup.
///
/// ## Cache Modes
///
/// - **Local**: Single-instance mode using only DashMap; expired entries
///   read as misses and are evicted lazily
/// - **Redis**: Shared mode; every command is awaited so a write-through
///   is only reported as done once Redis acknowledged it. Each operation,
///   connection checkout included, is bounded by `command_timeout`.
#[derive(Clone)]
pub enum CacheBackend {
    /// Single-instance: local DashMap only
    Local(Arc<DashMap<String, CachedEntry>>),

    /// Shared: Redis connection pool
    Redis {
        redis: Pool,
        command_timeout: Duration,
    },
}

impl CacheBackend {
    /// Create a new local-only cache backend.
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(DashMap::new()))
    }

    /// Create a new Redis-backed cache backend.
    pub fn new_redis(redis_pool: Pool, command_timeout: Duration) -> Self {
        CacheBackend::Redis {
            redis: redis_pool,
            command_timeout,
        }
    }

    async fn redis_conn(redis: &Pool) -> Result<deadpool_redis::Connection, CacheError> {
        redis.get().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to get Redis connection");
            CacheError::Unavailable(e.to_string())
        })
    }
}

/// Runs one Redis operation, failing with `Unavailable` once `limit` elapses.
async fn bounded<T, F>(limit: Duration, op: &'static str, fut: F) -> Result<T, CacheError>
where
    F: Future<Output = Result<T, CacheError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            let limit_ms = limit.as_millis();
            tracing::warn!(limit_ms = %limit_ms, "Redis {op} timed out");
            Err(CacheError::Unavailable(format!(
                "Redis {op} timed out after {limit_ms} ms"
            )))
        }
    }
}

fn map_redis_error(key: &str, op: &'static str, e: RedisError) -> CacheError {
    tracing::warn!(key = %key, error = %e, "Redis {op} error");
    if e.is_io_error() || e.is_timeout() || e.is_connection_dropped() || e.is_connection_refusal()
    {
        CacheError::Unavailable(e.to_string())
    } else {
        CacheError::Command(e.to_string())
    }
}

/// Escapes glob metacharacters so a literal prefix can be used in `MATCH`.
fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl CacheStore for CacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self {
            CacheBackend::Local(map) => {
                let Some(entry) = map.get(key) else {
                    return Ok(None);
                };
                if entry.is_expired() {
                    drop(entry);
                    map.remove_if(key, |_, e| e.is_expired());
                    return Ok(None);
                }
                Ok(Some(entry.data.as_ref().clone()))
            }
            CacheBackend::Redis {
                redis,
                command_timeout,
            } => {
                bounded(*command_timeout, "GET", async {
                    let mut conn = Self::redis_conn(redis).await?;
                    conn.get::<_, Option<Vec<u8>>>(key)
                        .await
                        .map_err(|e| map_redis_error(key, "GET", e))
                })
                .await
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(map) => {
                map.insert(key.to_string(), CachedEntry::new(value, ttl));
                Ok(())
            }
            CacheBackend::Redis {
                redis,
                command_timeout,
            } => {
                bounded(*command_timeout, "SET", async {
                    let mut conn = Self::redis_conn(redis).await?;
                    let result = if ttl.as_secs() == 0 {
                        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                        conn.pset_ex::<_, _, ()>(key, value, millis).await
                    } else {
                        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await
                    };
                    result.map_err(|e| map_redis_error(key, "SET", e))
                })
                .await?;
                tracing::debug!(key = %key, ttl_ms = %ttl.as_millis(), "cache set");
                Ok(())
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(map) => {
                map.remove(key);
            }
            CacheBackend::Redis {
                redis,
                command_timeout,
            } => {
                bounded(*command_timeout, "DEL", async {
                    let mut conn = Self::redis_conn(redis).await?;
                    conn.del::<_, ()>(key)
                        .await
                        .map_err(|e| map_redis_error(key, "DEL", e))
                })
                .await?;
            }
        }
        tracing::debug!(key = %key, "cache invalidated");
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let removed = match self {
            CacheBackend::Local(map) => {
                let keys: Vec<String> = map
                    .iter()
                    .filter(|entry| entry.key().starts_with(prefix))
                    .map(|entry| entry.key().clone())
                    .collect();
                keys.iter().filter(|k| map.remove(k.as_str()).is_some()).count() as u64
            }
            CacheBackend::Redis {
                redis,
                command_timeout,
            } => {
                let limit = *command_timeout;
                let mut conn = bounded(limit, "checkout", Self::redis_conn(redis)).await?;
                let pattern = scan_pattern(prefix);
                let mut cursor: u64 = 0;
                let mut removed: u64 = 0;
                // Each SCAN/DEL round trip gets its own budget.
                loop {
                    let (next, keys): (u64, Vec<String>) = bounded(limit, "SCAN", async {
                        redis::cmd("SCAN")
                            .arg(cursor)
                            .arg("MATCH")
                            .arg(&pattern)
                            .arg("COUNT")
                            .arg(SCAN_COUNT)
                            .query_async(&mut conn)
                            .await
                            .map_err(|e| map_redis_error(prefix, "SCAN", e))
                    })
                    .await?;
                    if !keys.is_empty() {
                        removed += bounded(limit, "DEL", async {
                            conn.del::<_, u64>(&keys)
                                .await
                                .map_err(|e| map_redis_error(prefix, "DEL", e))
                        })
                        .await?;
                    }
                    if next == 0 {
                        break;
                    }
                    cursor = next;
                }
                removed
            }
        };
        tracing::debug!(prefix = %prefix, removed, "cache prefix invalidated");
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(_) => Ok(()),
            CacheBackend::Redis {
                redis,
                command_timeout,
            } => {
                bounded(*command_timeout, "PING", async {
                    let mut conn = Self::redis_conn(redis).await?;
                    let pong: Result<String, RedisError> =
                        redis::cmd("PING").query_async(&mut conn).await;
                    pong.map(drop).map_err(|e| map_redis_error("", "PING", e))
                })
                .await
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            CacheBackend::Local(_) => "local",
            CacheBackend::Redis { .. } => "redis",
        }
    }
}
