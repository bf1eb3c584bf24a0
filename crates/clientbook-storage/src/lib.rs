//! # clientbook-storage
//!
//! Record store contract for the clientbook service.
//!
//! This crate defines the customer types, the storage error taxonomy and the
//! [`CustomerStorage`] trait every backend implements. It contains no
//! backend itself; see `clientbook-db-postgres` and `clientbook-db-memory`.
//!
//! ## Example
//!
//! ```ignore
//! use clientbook_storage::{CustomerStorage, PageParams, StorageError};
//!
//! async fn first_page(storage: &dyn CustomerStorage) -> Result<usize, StorageError> {
//!     let rows = storage.find_page(PageParams::default()).await?;
//!     Ok(rows.len())
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::CustomerStorage;
pub use types::{
    Customer, CustomerPatch, DEFAULT_LIMIT, DEFAULT_OFFSET, NewCustomer, PageParams,
};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared storage trait object.
pub type DynStorage = std::sync::Arc<dyn CustomerStorage>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use clientbook_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::traits::CustomerStorage;
    pub use crate::types::{Customer, CustomerPatch, NewCustomer, PageParams};
    pub use crate::{DynStorage, StorageResult};
}
