//! Cache layer for customer records and collection pages.
//!
//! ## Architecture
//!
//! - **Keys**: pure derivation of cache keys from logical queries
//! - **Store**: the `CacheStore` capability the record service depends on
//! - **Backend**: local (DashMap) and Redis implementations of the store
//!
//! ```text
//! customer:<email>                  single record
//! customers:limit=<l>:offset=<o>    collection page
//! ```

pub mod backend;
pub mod keys;
pub mod store;

pub use backend::{CacheBackend, CachedEntry};
pub use keys::{COLLECTION_PREFIX, DEFAULT_COLLECTION_KEY, SINGLE_PREFIX, collection_key, single_key};
pub use store::{CacheError, CacheStore, DynCacheStore};
