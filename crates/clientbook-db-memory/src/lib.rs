//! In-memory customer storage backend for clientbook.
//!
//! This crate provides an in-memory implementation of the `CustomerStorage`
//! trait from `clientbook-storage`. It backs local development runs
//! (`storage.backend = "memory"`) and the service tests.
//!
//! # Example
//!
//! ```ignore
//! use clientbook_db_memory::InMemoryStorage;
//! use clientbook_storage::{CustomerStorage, NewCustomer};
//!
//! let storage = InMemoryStorage::new();
//! let created = storage.create(&NewCustomer::new("a@x.com")).await?;
//! assert_eq!(created.id, 1);
//! ```

pub mod storage;

pub use clientbook_storage::{CustomerStorage, StorageError};
pub use storage::InMemoryStorage;

/// Type alias for a shareable CustomerStorage instance.
pub type DynCustomerStorage = std::sync::Arc<dyn CustomerStorage>;

/// Creates a new in-memory CustomerStorage instance.
pub fn create_storage() -> DynCustomerStorage {
    std::sync::Arc::new(InMemoryStorage::new())
}
