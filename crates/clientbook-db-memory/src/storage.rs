use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use clientbook_storage::{Customer, CustomerStorage, NewCustomer, PageParams, StorageError};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// In-memory customer storage.
///
/// Rows are kept in a `BTreeMap` keyed by id, so iteration order is
/// creation order. Soft-deleted rows stay in the map with `deleted_at` set
/// and are skipped by every read.
#[derive(Debug)]
pub struct InMemoryStorage {
    rows: RwLock<BTreeMap<i64, Customer>>,
    /// Atomic counter for generating ids
    id_counter: AtomicI64,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            id_counter: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.id_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of live (not soft-deleted) customers.
    pub async fn live_count(&self) -> usize {
        self.rows
            .read()
            .await
            .values()
            .filter(|c| !c.is_deleted())
            .count()
    }
}

#[async_trait]
impl CustomerStorage for InMemoryStorage {
    async fn create(&self, new: &NewCustomer) -> Result<Customer, StorageError> {
        if new.email.is_empty() {
            return Err(StorageError::invalid_record("email must not be empty"));
        }

        let mut rows = self.rows.write().await;
        if rows
            .values()
            .any(|c| !c.is_deleted() && c.email == new.email)
        {
            return Err(StorageError::already_exists(&new.email));
        }

        let now = OffsetDateTime::now_utc();
        let customer = Customer {
            id: self.next_id(),
            name: new.name.clone(),
            email: new.email.clone(),
            address: new.address.clone(),
            number: new.number,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, StorageError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .find(|c| !c.is_deleted() && c.email == email)
            .cloned())
    }

    async fn find_page(&self, page: PageParams) -> Result<Vec<Customer>, StorageError> {
        let skip = usize::try_from(page.offset).unwrap_or(0);
        let take = usize::try_from(page.limit).unwrap_or(0);
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|c| !c.is_deleted())
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn save(&self, customer: &Customer) -> Result<Customer, StorageError> {
        let mut rows = self.rows.write().await;
        let stored = rows
            .get_mut(&customer.id)
            .filter(|c| !c.is_deleted())
            .ok_or_else(|| StorageError::not_found(&customer.email))?;

        stored.name = customer.name.clone();
        stored.address = customer.address.clone();
        stored.number = customer.number;
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(stored.clone())
    }

    async fn delete(&self, customer: &Customer) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        let stored = rows
            .get_mut(&customer.id)
            .filter(|c| !c.is_deleted())
            .ok_or_else(|| StorageError::not_found(&customer.email))?;

        stored.deleted_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
