//! Record types shared by every storage backend.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Page size used when the caller gives none (or an unusable one).
pub const DEFAULT_LIMIT: i64 = 10;

/// Page offset used when the caller gives none (or an unusable one).
pub const DEFAULT_OFFSET: i64 = 0;

/// A customer as persisted by the record store.
///
/// `id` and the timestamps are assigned by the store. `email` is the
/// business key: unique among live (not soft-deleted) customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub number: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl Customer {
    /// Returns `true` if the customer has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for creating a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub address: String,
    pub number: i64,
}

impl NewCustomer {
    /// Creates a new customer input with only the email set.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    #[must_use]
    pub fn with_number(mut self, number: i64) -> Self {
        self.number = number;
        self
    }
}

/// Field-level patch for an existing customer, identified by `email`.
///
/// A field is applied only when it is present and non-default: an empty
/// string or a zero number leaves the stored value untouched. The email
/// itself is never changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerPatch {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
}

impl CustomerPatch {
    /// Creates an empty patch targeting `email`.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_number(mut self, number: i64) -> Self {
        self.number = Some(number);
        self
    }

    /// Merges the patch into `customer`. Returns `true` if any field changed.
    pub fn apply(&self, customer: &mut Customer) -> bool {
        let mut changed = false;
        if let Some(name) = self.name.as_deref().filter(|s| !s.is_empty()) {
            changed |= customer.name != name;
            customer.name = name.to_string();
        }
        if let Some(address) = self.address.as_deref().filter(|s| !s.is_empty()) {
            changed |= customer.address != address;
            customer.address = address.to_string();
        }
        if let Some(number) = self.number.filter(|n| *n != 0) {
            changed |= customer.number != number;
            customer.number = number;
        }
        changed
    }
}

/// Pagination window for collection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageParams {
    pub limit: i64,
    pub offset: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl PageParams {
    #[must_use]
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// Builds page parameters from raw query-string values.
    ///
    /// Absent, non-numeric and negative values fall back to the defaults
    /// instead of failing.
    #[must_use]
    pub fn from_query(limit: Option<&str>, offset: Option<&str>) -> Self {
        Self {
            limit: parse_non_negative(limit).unwrap_or(DEFAULT_LIMIT),
            offset: parse_non_negative(offset).unwrap_or(DEFAULT_OFFSET),
        }
    }
}

fn parse_non_negative(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|n| *n >= 0)
}
