//! Storage trait for the customer record store.
//!
//! This module defines the contract every storage backend must implement.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{Customer, NewCustomer, PageParams};

/// The record store contract.
///
/// Implementations must be thread-safe (`Send + Sync`) and apply one
/// soft-delete policy uniformly: every read excludes soft-deleted rows.
///
/// # Example
///
/// ```ignore
/// use clientbook_storage::{CustomerStorage, StorageError, Customer};
///
/// async fn require(storage: &dyn CustomerStorage, email: &str) -> Result<Customer, StorageError> {
///     storage
///         .find_by_email(email)
///         .await?
///         .ok_or_else(|| StorageError::not_found(email))
/// }
/// ```
#[async_trait]
pub trait CustomerStorage: Send + Sync {
    /// Persists a new customer and returns it with store-assigned `id` and
    /// timestamps.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if a live customer has the same email.
    /// Returns `StorageError::InvalidRecord` if the email is empty.
    async fn create(&self, new: &NewCustomer) -> Result<Customer, StorageError>;

    /// Looks up a live customer by email.
    ///
    /// Returns `None` when no live row matches.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing rows.
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, StorageError>;

    /// Returns up to `page.limit` live customers starting at `page.offset`,
    /// in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error for infrastructure issues. An empty window is `Ok(vec![])`.
    async fn find_page(&self, page: PageParams) -> Result<Vec<Customer>, StorageError>;

    /// Writes every mutable field of `customer` (matched by `id`) and returns
    /// the stored row with a refreshed `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row is missing or soft-deleted.
    async fn save(&self, customer: &Customer) -> Result<Customer, StorageError>;

    /// Soft-deletes `customer` (matched by `id`).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row is missing or already deleted.
    async fn delete(&self, customer: &Customer) -> Result<(), StorageError>;

    /// Checks that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot serve queries.
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Returns the name of this storage backend.
    fn backend_name(&self) -> &'static str;
}
