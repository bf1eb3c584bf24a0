//! PostgreSQL implementation of the CustomerStorage trait.

use async_trait::async_trait;
use sqlx_postgres::PgPool;

use clientbook_storage::{Customer, CustomerStorage, NewCustomer, PageParams, StorageError};

use crate::config::PostgresConfig;
use crate::migrations;
use crate::pool;
use crate::queries::customers;

/// PostgreSQL storage backend for customer records.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a new `PostgresStorage` with the given configuration.
    ///
    /// This will:
    /// 1. Create a connection pool
    /// 2. Run migrations (if configured)
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created
    /// or if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::connect(&config).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CustomerStorage for PostgresStorage {
    async fn create(&self, new: &NewCustomer) -> Result<Customer, StorageError> {
        customers::create(&self.pool, new).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, StorageError> {
        customers::find_by_email(&self.pool, email).await
    }

    async fn find_page(&self, page: PageParams) -> Result<Vec<Customer>, StorageError> {
        customers::find_page(&self.pool, page).await
    }

    async fn save(&self, customer: &Customer) -> Result<Customer, StorageError> {
        customers::save(&self.pool, customer).await
    }

    async fn delete(&self, customer: &Customer) -> Result<(), StorageError> {
        customers::soft_delete(&self.pool, customer).await
    }

    async fn ping(&self) -> Result<(), StorageError> {
        pool::ping(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
