//! Cache-consistency tests for the customer service.
//!
//! Run against the in-memory record store and the local cache, wrapped so
//! the tests can count store reads and inject failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use clientbook_db_memory::InMemoryStorage;
use clientbook_server::cache::{DEFAULT_COLLECTION_KEY, collection_key, single_key};
use clientbook_server::{
    CacheBackend, CacheError, CachePolicy, CacheSource, CacheStore, CustomerService,
    InvalidationPolicy, ServiceError,
};
use clientbook_storage::{
    Customer, CustomerPatch, CustomerStorage, NewCustomer, PageParams, StorageError,
};

/// Record store wrapper that counts page reads and can be switched to fail.
#[derive(Default)]
struct CountingStorage {
    inner: InMemoryStorage,
    page_reads: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

#[async_trait]
impl CustomerStorage for CountingStorage {
    async fn create(&self, new: &NewCustomer) -> Result<Customer, StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::connection_error("store down"));
        }
        self.inner.create(new).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, StorageError> {
        self.inner.find_by_email(email).await
    }

    async fn find_page(&self, page: PageParams) -> Result<Vec<Customer>, StorageError> {
        self.page_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::connection_error("store down"));
        }
        self.inner.find_page(page).await
    }

    async fn save(&self, customer: &Customer) -> Result<Customer, StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::connection_error("store down"));
        }
        self.inner.save(customer).await
    }

    async fn delete(&self, customer: &Customer) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::connection_error("store down"));
        }
        self.inner.delete(customer).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// Cache wrapper whose every command can be switched to fail.
struct FlakyCache {
    inner: CacheBackend,
    down: AtomicBool,
}

impl FlakyCache {
    fn new() -> Self {
        Self {
            inner: CacheBackend::new_local(),
            down: AtomicBool::new(false),
        }
    }

    fn check(&self) -> Result<&CacheBackend, CacheError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("connection refused".into()));
        }
        Ok(&self.inner)
    }
}

#[async_trait]
impl CacheStore for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.check()?.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.check()?.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check()?.delete(key).await
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        self.check()?.delete_prefix(prefix).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

struct Harness {
    service: CustomerService,
    storage: Arc<CountingStorage>,
    cache: Arc<FlakyCache>,
}

fn harness_with(invalidation: InvalidationPolicy) -> Harness {
    let storage = Arc::new(CountingStorage::default());
    let cache = Arc::new(FlakyCache::new());
    let policy = CachePolicy {
        ttl: Duration::from_secs(600),
        invalidation,
    };
    let service = CustomerService::new(storage.clone(), cache.clone(), policy);
    Harness {
        service,
        storage,
        cache,
    }
}

fn harness() -> Harness {
    harness_with(InvalidationPolicy::DefaultPage)
}

impl Harness {
    fn page_reads(&self) -> usize {
        self.storage.page_reads.load(Ordering::SeqCst)
    }

    async fn cached(&self, key: &str) -> Option<Vec<u8>> {
        self.cache.get(key).await.expect("cache reachable")
    }

    async fn cached_customer(&self, email: &str) -> Option<Customer> {
        self.cached(&single_key(email))
            .await
            .map(|bytes| serde_json::from_slice(&bytes).expect("cached customer json"))
    }
}

fn customer(email: &str, name: &str) -> NewCustomer {
    NewCustomer::new(email).with_name(name).with_number(1)
}

#[tokio::test]
async fn read_through_fills_cache_and_skips_store_on_hit() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    h.service.create(customer("b@x.com", "B")).await.unwrap();

    let page = PageParams::new(10, 0);
    let first = h.service.list(page).await.unwrap();
    assert_eq!(first.source, CacheSource::Store);
    assert_eq!(h.page_reads(), 1);

    let direct = h.storage.find_page(page).await.unwrap();
    let listed: Vec<Customer> = serde_json::from_slice(&first.payload).unwrap();
    assert_eq!(listed, direct);

    let second = h.service.list(page).await.unwrap();
    assert_eq!(second.source, CacheSource::CacheHit);
    assert_eq!(second.payload, first.payload);
    // Only the direct comparison read above touched the store again.
    assert_eq!(h.page_reads(), 2);
}

#[tokio::test]
async fn empty_pages_are_never_cached() {
    let h = harness();
    let page = PageParams::default();

    let outcome = h.service.list(page).await.unwrap();
    assert_eq!(outcome.payload, b"[]");
    assert!(h.cached(DEFAULT_COLLECTION_KEY).await.is_none());

    // A zero limit is a valid window that is always empty.
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    let zero = h.service.list(PageParams::new(0, 0)).await.unwrap();
    assert_eq!(zero.payload, b"[]");
    assert!(h.cached(&collection_key(PageParams::new(0, 0))).await.is_none());

    let outcome = h.service.list(page).await.unwrap();
    assert_eq!(outcome.source, CacheSource::Store);
    let listed: Vec<Customer> = serde_json::from_slice(&outcome.payload).unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn writes_refresh_single_record_entry() {
    let h = harness();
    let created = h.service.create(customer("a@x.com", "A")).await.unwrap();
    assert_eq!(h.cached_customer("a@x.com").await, Some(created.clone()));

    h.service
        .update(CustomerPatch::new("a@x.com").with_name("Renamed"))
        .await
        .unwrap();
    let cached = h.cached_customer("a@x.com").await.unwrap();
    assert_eq!(cached.name, "Renamed");
    assert_eq!(cached.id, created.id);
}

#[tokio::test]
async fn every_write_invalidates_default_page() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    let page = PageParams::default();

    h.service.list(page).await.unwrap();
    assert!(h.cached(DEFAULT_COLLECTION_KEY).await.is_some());
    h.service.create(customer("b@x.com", "B")).await.unwrap();
    assert!(h.cached(DEFAULT_COLLECTION_KEY).await.is_none());

    h.service.list(page).await.unwrap();
    h.service
        .update(CustomerPatch::new("a@x.com").with_address("new"))
        .await
        .unwrap();
    assert_eq!(h.service.list(page).await.unwrap().source, CacheSource::Store);

    h.service.delete("b@x.com").await.unwrap();
    assert_eq!(h.service.list(page).await.unwrap().source, CacheSource::Store);
}

#[tokio::test]
async fn default_page_policy_leaves_other_pages_until_ttl() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    let other = PageParams::new(5, 0);
    h.service.list(other).await.unwrap();

    h.service.create(customer("b@x.com", "B")).await.unwrap();
    let outcome = h.service.list(other).await.unwrap();
    assert_eq!(outcome.source, CacheSource::CacheHit);
    let listed: Vec<Customer> = serde_json::from_slice(&outcome.payload).unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn all_pages_policy_drops_every_window() {
    let h = harness_with(InvalidationPolicy::AllPages);
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    let other = PageParams::new(5, 0);
    h.service.list(other).await.unwrap();
    h.service.list(PageParams::default()).await.unwrap();

    h.service.create(customer("b@x.com", "B")).await.unwrap();
    assert!(h.cached(&collection_key(other)).await.is_none());
    assert!(h.cached(DEFAULT_COLLECTION_KEY).await.is_none());
    // Single-record entries live outside the collection namespace.
    assert!(h.cached_customer("a@x.com").await.is_some());

    let listed: Vec<Customer> =
        serde_json::from_slice(&h.service.list(other).await.unwrap().payload).unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn partial_update_preserves_untouched_fields() {
    let h = harness();
    h.service
        .create(
            NewCustomer::new("a@x.com")
                .with_name("A")
                .with_address("old")
                .with_number(7),
        )
        .await
        .unwrap();

    let updated = h
        .service
        .update(CustomerPatch::new("a@x.com").with_name("B"))
        .await
        .unwrap();
    assert_eq!(updated.name, "B");
    assert_eq!(updated.address, "old");
    assert_eq!(updated.number, 7);
}

#[tokio::test]
async fn no_op_update_still_refreshes_cache() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    h.cache.delete(&single_key("a@x.com")).await.unwrap();

    h.service.update(CustomerPatch::new("a@x.com")).await.unwrap();
    assert!(h.cached_customer("a@x.com").await.is_some());
}

#[tokio::test]
async fn delete_clears_both_keys_and_store() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    h.service.list(PageParams::default()).await.unwrap();

    h.service.delete("a@x.com").await.unwrap();
    assert!(h.cached(&single_key("a@x.com")).await.is_none());
    assert!(h.cached(DEFAULT_COLLECTION_KEY).await.is_none());
    assert!(h.storage.find_by_email("a@x.com").await.unwrap().is_none());
    assert!(matches!(
        h.service.get("a@x.com").await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn concrete_scenario() {
    let h = harness();
    h.service
        .create(NewCustomer::new("a@x.com").with_name("A").with_number(1))
        .await
        .unwrap();

    let listed: Vec<Customer> =
        serde_json::from_slice(&h.service.list(PageParams::new(10, 0)).await.unwrap().payload)
            .unwrap();
    assert!(listed.iter().any(|c| c.email == "a@x.com"));

    h.service
        .update(CustomerPatch::new("a@x.com").with_address("new"))
        .await
        .unwrap();
    let cached = h.cached_customer("a@x.com").await.unwrap();
    assert_eq!(
        (cached.name.as_str(), cached.address.as_str(), cached.number),
        ("A", "new", 1)
    );

    h.service.delete("a@x.com").await.unwrap();
    let outcome = h.service.list(PageParams::new(10, 0)).await.unwrap();
    assert_eq!(outcome.source, CacheSource::Store);
    let listed: Vec<Customer> = serde_json::from_slice(&outcome.payload).unwrap();
    assert!(listed.iter().all(|c| c.email != "a@x.com"));
}

#[tokio::test]
async fn get_reads_through_single_record_cache() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    h.cache.delete(&single_key("a@x.com")).await.unwrap();

    let payload = h.service.get("a@x.com").await.unwrap();
    let fetched: Customer = serde_json::from_slice(&payload).unwrap();
    assert_eq!(fetched.email, "a@x.com");
    assert_eq!(h.cached(&single_key("a@x.com")).await, Some(payload));

    assert!(matches!(
        h.service.get("nobody@x.com").await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(h.cached(&single_key("nobody@x.com")).await.is_none());
}

#[tokio::test]
async fn validation_happens_before_any_access() {
    let h = harness();
    assert!(matches!(
        h.service.create(NewCustomer::new("")).await,
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        h.service.update(CustomerPatch::new("  ")).await,
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        h.service.delete("").await,
        Err(ServiceError::Validation(_))
    ));
    assert_eq!(h.storage.inner.live_count().await, 0);
}

#[tokio::test]
async fn missing_targets_are_not_found() {
    let h = harness();
    assert!(matches!(
        h.service.update(CustomerPatch::new("a@x.com").with_name("B")).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        h.service.delete("a@x.com").await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    assert!(matches!(
        h.service.create(customer("a@x.com", "Other")).await,
        Err(ServiceError::Conflict(_))
    ));
    assert_eq!(h.cached_customer("a@x.com").await.unwrap().name, "A");
}

#[tokio::test]
async fn store_failure_leaves_cache_untouched() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    h.service.list(PageParams::default()).await.unwrap();

    h.storage.fail_writes.store(true, Ordering::SeqCst);
    assert!(matches!(
        h.service
            .update(CustomerPatch::new("a@x.com").with_name("B"))
            .await,
        Err(ServiceError::Store { .. })
    ));
    assert_eq!(h.cached_customer("a@x.com").await.unwrap().name, "A");
    assert!(h.cached(DEFAULT_COLLECTION_KEY).await.is_some());
}

#[tokio::test]
async fn list_store_error_is_not_cached() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    let page = PageParams::new(5, 0);

    h.storage.fail_reads.store(true, Ordering::SeqCst);
    assert!(matches!(
        h.service.list(page).await,
        Err(ServiceError::Store { .. })
    ));
    assert!(h.cached(&collection_key(page)).await.is_none());

    h.storage.fail_reads.store(false, Ordering::SeqCst);
    assert_eq!(h.service.list(page).await.unwrap().source, CacheSource::Store);
}

#[tokio::test]
async fn failed_create_leaves_cache_untouched() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    h.service.list(PageParams::default()).await.unwrap();

    h.storage.fail_writes.store(true, Ordering::SeqCst);
    assert!(matches!(
        h.service.create(customer("b@x.com", "B")).await,
        Err(ServiceError::Store { .. })
    ));
    assert!(h.cached(&single_key("b@x.com")).await.is_none());
    assert!(h.cached(DEFAULT_COLLECTION_KEY).await.is_some());
}

#[tokio::test]
async fn failed_delete_keeps_single_record_entry() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    h.service.list(PageParams::default()).await.unwrap();

    h.storage.fail_writes.store(true, Ordering::SeqCst);
    assert!(matches!(
        h.service.delete("a@x.com").await,
        Err(ServiceError::Store { .. })
    ));
    assert_eq!(h.cached_customer("a@x.com").await.unwrap().name, "A");
    assert!(h.cached(DEFAULT_COLLECTION_KEY).await.is_some());
    assert!(h.storage.find_by_email("a@x.com").await.unwrap().is_some());
}

#[tokio::test]
async fn cache_failures_surface() {
    let h = harness();
    h.service.create(customer("a@x.com", "A")).await.unwrap();
    h.cache.down.store(true, Ordering::SeqCst);

    let reads_before = h.page_reads();
    assert!(matches!(
        h.service.list(PageParams::default()).await,
        Err(ServiceError::Cache { .. })
    ));
    // No silent fallback to the store.
    assert_eq!(h.page_reads(), reads_before);

    // The store write commits, the cache step still reports failure.
    assert!(matches!(
        h.service.create(customer("b@x.com", "B")).await,
        Err(ServiceError::Cache { .. })
    ));
    assert!(h.storage.find_by_email("b@x.com").await.unwrap().is_some());
}

#[tokio::test]
async fn concurrent_writes_to_distinct_emails() {
    let h = harness();
    let mut tasks = Vec::new();
    for i in 0..20 {
        let service = h.service.clone();
        tasks.push(tokio::spawn(async move {
            service
                .create(customer(&format!("c{i}@x.com"), "C"))
                .await
                .map(|c| c.id)
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    let outcome = h.service.list(PageParams::new(100, 0)).await.unwrap();
    let listed: Vec<Customer> = serde_json::from_slice(&outcome.payload).unwrap();
    assert_eq!(listed.len(), 20);
    for i in 0..20 {
        assert!(h.cached_customer(&format!("c{i}@x.com")).await.is_some());
    }
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let storage = Arc::new(CountingStorage::default());
    let policy = CachePolicy {
        ttl: Duration::from_millis(30),
        invalidation: InvalidationPolicy::DefaultPage,
    };
    let service = CustomerService::new(storage.clone(), Arc::new(CacheBackend::new_local()), policy);
    service.create(customer("a@x.com", "A")).await.unwrap();

    let page = PageParams::new(3, 0);
    service.list(page).await.unwrap();
    assert_eq!(service.list(page).await.unwrap().source, CacheSource::CacheHit);
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(service.list(page).await.unwrap().source, CacheSource::Store);
}
