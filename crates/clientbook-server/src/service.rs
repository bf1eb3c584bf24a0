//! Cache-coordinated customer service.
//!
//! Reads go cache first and fill the cache on a miss. Writes commit to the
//! record store first, then refresh the single-record entry and drop the
//! collection entries a write may have made stale. A failed store write
//! leaves the cache untouched; a failed cache step after a committed write
//! is reported to the caller instead of being swallowed.

use std::time::Duration;

use clientbook_api::ApiError;
use clientbook_storage::{Customer, CustomerPatch, DynStorage, NewCustomer, PageParams, StorageError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cache::{
    COLLECTION_PREFIX, CacheError, DEFAULT_COLLECTION_KEY, DynCacheStore, collection_key,
    single_key,
};

pub const MISSING_EMAIL: &str = "Missing customer email";
pub const CUSTOMER_NOT_FOUND: &str = "Customer not found";

/// Which collection entries a write drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationPolicy {
    /// Only the default page (`limit=10, offset=0`); other pages age out by TTL.
    #[default]
    DefaultPage,
    /// Every cached page, via a prefix scan.
    AllPages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub invalidation: InvalidationPolicy,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            invalidation: InvalidationPolicy::default(),
        }
    }
}

/// Where a listing was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    CacheHit,
    Store,
}

impl CacheSource {
    /// Value of the `x-cache` response header.
    pub fn header_value(&self) -> &'static str {
        match self {
            CacheSource::CacheHit => "HIT",
            CacheSource::Store => "MISS",
        }
    }
}

/// A serialized collection page and where it came from.
#[derive(Debug, Clone)]
pub struct ListOutcome {
    pub payload: Vec<u8>,
    pub source: CacheSource,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("{context}: {source}")]
    Cache {
        context: &'static str,
        #[source]
        source: CacheError,
    },

    #[error("Failed to serialize customer data: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Classifies a store failure, keeping not-found and uniqueness apart
    /// from generic persistence failures.
    pub fn store(context: &'static str, source: StorageError) -> Self {
        match source {
            StorageError::NotFound { .. } => Self::NotFound(CUSTOMER_NOT_FOUND.into()),
            StorageError::AlreadyExists { email } => {
                Self::Conflict(format!("Customer with email {email} already exists"))
            }
            StorageError::InvalidRecord { message } => Self::Validation(message),
            source => {
                warn!(category = %source.category(), error = %source, "{context}");
                Self::Store { context, source }
            }
        }
    }

    pub fn cache(context: &'static str, source: CacheError) -> Self {
        warn!(error = %source, "{context}");
        Self::Cache { context, source }
    }
}

impl From<StorageError> for ServiceError {
    fn from(source: StorageError) -> Self {
        Self::store("Record store failure", source)
    }
}

impl From<CacheError> for ServiceError {
    fn from(source: CacheError) -> Self {
        Self::cache("Cache failure", source)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::bad_request(msg),
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Conflict(msg) => ApiError::conflict(msg),
            ServiceError::Store { context, .. } | ServiceError::Cache { context, .. } => {
                ApiError::internal(context)
            }
            ServiceError::Serialization(_) => {
                ApiError::internal("Failed to serialize customer data")
            }
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

fn require_email(email: &str) -> ServiceResult<()> {
    if email.trim().is_empty() {
        return Err(ServiceError::Validation(MISSING_EMAIL.into()));
    }
    Ok(())
}

/// Orchestrates the record store and the cache store.
#[derive(Clone)]
pub struct CustomerService {
    storage: DynStorage,
    cache: DynCacheStore,
    policy: CachePolicy,
}

impl CustomerService {
    pub fn new(storage: DynStorage, cache: DynCacheStore, policy: CachePolicy) -> Self {
        Self {
            storage,
            cache,
            policy,
        }
    }

    pub fn storage(&self) -> &DynStorage {
        &self.storage
    }

    pub fn cache(&self) -> &DynCacheStore {
        &self.cache
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Returns one page of live customers as a JSON array.
    ///
    /// A cache hit is returned verbatim without touching the store. Empty
    /// pages are never cached.
    #[instrument(skip(self), fields(limit = page.limit, offset = page.offset))]
    pub async fn list(&self, page: PageParams) -> ServiceResult<ListOutcome> {
        let key = collection_key(page);
        let cached = self
            .cache
            .get(&key)
            .await
            .map_err(|e| ServiceError::cache("Failed to retrieve customers from cache", e))?;
        if let Some(payload) = cached {
            debug!(key = %key, "cache hit");
            return Ok(ListOutcome {
                payload,
                source: CacheSource::CacheHit,
            });
        }
        debug!(key = %key, "cache miss");

        let customers = self
            .storage
            .find_page(page)
            .await
            .map_err(|e| ServiceError::store("Failed to retrieve customers from the database", e))?;
        let payload = serde_json::to_vec(&customers)?;
        if !customers.is_empty() {
            self.cache
                .set(&key, payload.clone(), self.policy.ttl)
                .await
                .map_err(|e| ServiceError::cache("Failed to cache customers list", e))?;
        }
        Ok(ListOutcome {
            payload,
            source: CacheSource::Store,
        })
    }

    /// Returns one live customer as a JSON object.
    #[instrument(skip(self))]
    pub async fn get(&self, email: &str) -> ServiceResult<Vec<u8>> {
        require_email(email)?;
        let key = single_key(email);
        let cached = self
            .cache
            .get(&key)
            .await
            .map_err(|e| ServiceError::cache("Failed to retrieve customer from cache", e))?;
        if let Some(payload) = cached {
            debug!(key = %key, "cache hit");
            return Ok(payload);
        }
        debug!(key = %key, "cache miss");

        let customer = self
            .storage
            .find_by_email(email)
            .await
            .map_err(|e| ServiceError::store("Failed to retrieve customer from the database", e))?
            .ok_or_else(|| ServiceError::NotFound(CUSTOMER_NOT_FOUND.into()))?;
        let payload = serde_json::to_vec(&customer)?;
        self.cache
            .set(&key, payload.clone(), self.policy.ttl)
            .await
            .map_err(|e| ServiceError::cache("Failed to add customer to the cache", e))?;
        Ok(payload)
    }

    #[instrument(skip(self, new), fields(email = %new.email))]
    pub async fn create(&self, new: NewCustomer) -> ServiceResult<Customer> {
        require_email(&new.email)?;
        let customer = self
            .storage
            .create(&new)
            .await
            .map_err(|e| ServiceError::store("Failed to add customer to the database", e))?;
        self.refresh_single(&customer).await?;
        self.invalidate_collections().await?;
        debug!(id = customer.id, "customer created");
        Ok(customer)
    }

    /// Applies a field-level patch. A patch that changes nothing still
    /// persists and refreshes the cache.
    #[instrument(skip(self, patch), fields(email = %patch.email))]
    pub async fn update(&self, patch: CustomerPatch) -> ServiceResult<Customer> {
        require_email(&patch.email)?;
        let mut customer = self.find_live(&patch.email).await?;
        let changed = patch.apply(&mut customer);
        let saved = self
            .storage
            .save(&customer)
            .await
            .map_err(|e| ServiceError::store("Failed to update customer in the database", e))?;
        self.refresh_single(&saved).await?;
        self.invalidate_collections().await?;
        debug!(id = saved.id, changed, "customer updated");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, email: &str) -> ServiceResult<()> {
        require_email(email)?;
        let customer = self.find_live(email).await?;
        self.storage
            .delete(&customer)
            .await
            .map_err(|e| ServiceError::store("Failed to delete customer from database", e))?;
        self.cache
            .delete(&single_key(email))
            .await
            .map_err(|e| ServiceError::cache("Failed to delete the customer from the cache", e))?;
        self.invalidate_collections().await?;
        debug!(id = customer.id, "customer deleted");
        Ok(())
    }

    async fn find_live(&self, email: &str) -> ServiceResult<Customer> {
        self.storage
            .find_by_email(email)
            .await
            .map_err(|e| ServiceError::store("Failed to retrieve customer from the database", e))?
            .ok_or_else(|| ServiceError::NotFound(CUSTOMER_NOT_FOUND.into()))
    }

    async fn refresh_single(&self, customer: &Customer) -> ServiceResult<()> {
        let payload = serde_json::to_vec(customer)?;
        self.cache
            .set(&single_key(&customer.email), payload, self.policy.ttl)
            .await
            .map_err(|e| ServiceError::cache("Failed to add customer to the cache", e))
    }

    async fn invalidate_collections(&self) -> ServiceResult<()> {
        let result = match self.policy.invalidation {
            InvalidationPolicy::DefaultPage => self.cache.delete(DEFAULT_COLLECTION_KEY).await,
            InvalidationPolicy::AllPages => self
                .cache
                .delete_prefix(COLLECTION_PREFIX)
                .await
                .map(|removed| debug!(removed, "collection pages invalidated")),
        };
        result.map_err(|e| ServiceError::cache("Failed to invalidate cache", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn store_errors_are_classified() {
        let err = ServiceError::store("ctx", StorageError::not_found("a@x.com"));
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == CUSTOMER_NOT_FOUND));

        let err = ServiceError::store("ctx", StorageError::already_exists("a@x.com"));
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = ServiceError::store("ctx", StorageError::invalid_record("email must not be empty"));
        assert!(matches!(err, ServiceError::Validation(_)));

        let err: ServiceError = StorageError::connection_error("refused").into();
        assert!(matches!(err, ServiceError::Store { .. }));
    }

    #[test]
    fn api_mapping_hides_internal_detail() {
        let api: ApiError = ServiceError::cache(
            "Failed to retrieve customers from cache",
            CacheError::Unavailable("connection refused".into()),
        )
        .into();
        assert_eq!(api.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.to_string(), "Failed to retrieve customers from cache");

        let api: ApiError = ServiceError::Validation(MISSING_EMAIL.into()).into();
        assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);

        let api: ApiError = ServiceError::NotFound(CUSTOMER_NOT_FOUND.into()).into();
        assert_eq!(api.status_code(), StatusCode::NOT_FOUND);

        let api: ApiError = ServiceError::Conflict("dup".into()).into();
        assert_eq!(api.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn cache_source_header_values() {
        assert_eq!(CacheSource::CacheHit.header_value(), "HIT");
        assert_eq!(CacheSource::Store.header_value(), "MISS");
    }

    #[test]
    fn invalidation_policy_parses_snake_case() {
        let p: InvalidationPolicy = serde_json::from_str("\"all_pages\"").unwrap();
        assert_eq!(p, InvalidationPolicy::AllPages);
        assert_eq!(InvalidationPolicy::default(), InvalidationPolicy::DefaultPage);
    }
}
