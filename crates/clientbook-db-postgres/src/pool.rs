//! PostgreSQL connection pool.

use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgPool, Postgres};
use tracing::{debug, info, instrument};

use crate::config::PostgresConfig;
use crate::error::{PostgresError, Result};

/// Opens a pool sized and timed by `config`.
#[instrument(skip(config), fields(url = %config.redacted_url()))]
pub async fn connect(config: &PostgresConfig) -> Result<PgPool> {
    if config.max_connections == 0 {
        return Err(PostgresError::config("max_connections must be at least 1"));
    }

    info!(
        max_connections = config.max_connections,
        acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
        "Opening PostgreSQL pool"
    );

    let pool = PoolOptions::<Postgres>::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .connect(&config.url)
        .await?;

    debug!("PostgreSQL pool ready");
    Ok(pool)
}

/// Round-trips a trivial statement to prove the pool can reach the server.
pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx_core::query::query("SELECT 1").execute(pool).await?;
    Ok(())
}
