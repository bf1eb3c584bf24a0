//! Cache key derivation.
//!
//! Keys are namespaced by entity type so single-record and collection
//! entries can never collide, and a prefix scan over [`COLLECTION_PREFIX`]
//! touches every cached page and nothing else.

use clientbook_storage::PageParams;

/// Namespace of single-record entries.
pub const SINGLE_PREFIX: &str = "customer:";

/// Namespace of collection page entries.
pub const COLLECTION_PREFIX: &str = "customers:";

/// Key of the default page (`limit=10, offset=0`), dropped by every write.
pub const DEFAULT_COLLECTION_KEY: &str = "customers:limit=10:offset=0";

/// Key of the single-record entry for `email`.
pub fn single_key(email: &str) -> String {
    format!("{SINGLE_PREFIX}{email}")
}

/// Key of the collection entry for a page window.
pub fn collection_key(page: PageParams) -> String {
    format!(
        "{COLLECTION_PREFIX}limit={}:offset={}",
        page.limit, page.offset
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_key_is_namespaced() {
        assert_eq!(single_key("a@x.com"), "customer:a@x.com");
    }

    #[test]
    fn default_page_matches_constant() {
        assert_eq!(collection_key(PageParams::default()), DEFAULT_COLLECTION_KEY);
    }

    #[test]
    fn collection_keys_distinguish_windows() {
        let a = collection_key(PageParams::new(1, 10));
        let b = collection_key(PageParams::new(10, 1));
        let c = collection_key(PageParams::new(11, 0));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
        assert_eq!(a, collection_key(PageParams::new(1, 10)));
    }

    #[test]
    fn namespaces_never_overlap() {
        // An email shaped like a collection key still lands in the single namespace.
        let tricky = single_key("s:limit=10:offset=0");
        assert!(!tricky.starts_with(COLLECTION_PREFIX));
        assert!(collection_key(PageParams::new(5, 5)).starts_with(COLLECTION_PREFIX));
    }
}
