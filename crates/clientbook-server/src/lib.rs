pub mod auth;
pub mod cache;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod service;

pub use cache::{CacheBackend, CacheError, CacheStore, CachedEntry, DynCacheStore};
pub use config::{AppConfig, AuthConfig, CacheConfig, PostgresStorageConfig, RedisConfig, ServerConfig};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, ClientbookServer, ServerBuilder, build_app};
pub use service::{
    CachePolicy, CacheSource, CustomerService, InvalidationPolicy, ListOutcome, ServiceError,
};

/// Create a cache backend based on configuration.
///
/// ## Cache Modes
///
/// - **Redis disabled**: Returns local-only cache (DashMap)
/// - **Redis enabled**: Connects to Redis and verifies it with `PING`
///
/// An unreachable Redis is a startup error; the server never silently
/// degrades to a per-instance cache.
pub async fn create_cache_backend(config: &RedisConfig) -> Result<CacheBackend, CacheError> {
    use std::time::Duration;

    if !config.enabled {
        tracing::info!("Redis disabled, using local cache only");
        return Ok(CacheBackend::new_local());
    }

    tracing::info!(url = %config.redacted_url(), "Connecting to Redis");

    // Create Redis pool configuration
    let mut redis_config = deadpool_redis::Config::from_url(&config.url);
    let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size);
    pool_config.timeouts.wait = Some(Duration::from_millis(config.timeout_ms));
    pool_config.timeouts.create = Some(Duration::from_millis(config.timeout_ms));
    pool_config.timeouts.recycle = Some(Duration::from_millis(config.timeout_ms));
    redis_config.pool = Some(pool_config);

    let pool = redis_config
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .map_err(|e| CacheError::Unavailable(format!("failed to create Redis pool: {e}")))?;

    let backend = CacheBackend::new_redis(pool, Duration::from_millis(config.timeout_ms));
    backend.ping().await?;
    tracing::info!("Connected to Redis successfully");
    Ok(backend)
}
