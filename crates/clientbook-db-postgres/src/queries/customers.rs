//! Customer queries.
//!
//! Every read filters `deleted_at IS NULL`; deletion is a soft delete.

use chrono::{DateTime, Utc};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use time::OffsetDateTime;

use clientbook_storage::{Customer, NewCustomer, PageParams, StorageError};

use crate::error::map_query_error;

type CustomerRow = (
    i64,
    String,
    String,
    String,
    i64,
    DateTime<Utc>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

const COLUMNS: &str = "id, name, email, address, number, created_at, updated_at, deleted_at";

/// Converts chrono DateTime to time OffsetDateTime.
fn chrono_to_time(dt: DateTime<Utc>) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(dt.timestamp()).unwrap_or(OffsetDateTime::UNIX_EPOCH)
        + time::Duration::nanoseconds(dt.timestamp_subsec_nanos() as i64)
}

fn row_to_customer(row: CustomerRow) -> Customer {
    let (id, name, email, address, number, created_at, updated_at, deleted_at) = row;
    Customer {
        id,
        name,
        email,
        address,
        number,
        created_at: chrono_to_time(created_at),
        updated_at: chrono_to_time(updated_at),
        deleted_at: deleted_at.map(chrono_to_time),
    }
}

/// Inserts a new customer and returns the stored row.
pub async fn create(pool: &PgPool, new: &NewCustomer) -> Result<Customer, StorageError> {
    if new.email.is_empty() {
        return Err(StorageError::invalid_record("email must not be empty"));
    }

    let sql = format!(
        "INSERT INTO customers (name, email, address, number, created_at, updated_at)
         VALUES ($1, $2, $3, $4, now(), now())
         RETURNING {COLUMNS}"
    );

    let row: CustomerRow = query_as(&sql)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.address)
        .bind(new.number)
        .fetch_one(pool)
        .await
        .map_err(|e| map_query_error(e, &new.email, "Failed to create customer"))?;

    Ok(row_to_customer(row))
}

/// Reads a live customer by email.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Customer>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM customers WHERE email = $1 AND deleted_at IS NULL");

    let row: Option<CustomerRow> = query_as(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_query_error(e, email, "Failed to read customer"))?;

    Ok(row.map(row_to_customer))
}

/// Reads one page of live customers in creation order.
pub async fn find_page(pool: &PgPool, page: PageParams) -> Result<Vec<Customer>, StorageError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM customers
         WHERE deleted_at IS NULL
         ORDER BY id ASC
         LIMIT $1 OFFSET $2"
    );

    let rows: Vec<CustomerRow> = query_as(&sql)
        .bind(page.limit.max(0))
        .bind(page.offset.max(0))
        .fetch_all(pool)
        .await
        .map_err(|e| map_query_error(e, "", "Failed to list customers"))?;

    Ok(rows.into_iter().map(row_to_customer).collect())
}

/// Overwrites the mutable fields of a live customer.
pub async fn save(pool: &PgPool, customer: &Customer) -> Result<Customer, StorageError> {
    let sql = format!(
        "UPDATE customers
         SET name = $2, address = $3, number = $4, updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING {COLUMNS}"
    );

    let row: Option<CustomerRow> = query_as(&sql)
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.address)
        .bind(customer.number)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_query_error(e, &customer.email, "Failed to update customer"))?;

    row.map(row_to_customer)
        .ok_or_else(|| StorageError::not_found(&customer.email))
}

/// Soft-deletes a live customer.
pub async fn soft_delete(pool: &PgPool, customer: &Customer) -> Result<(), StorageError> {
    let result = query(
        "UPDATE customers
         SET deleted_at = now(), updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(customer.id)
    .execute(pool)
    .await
    .map_err(|e| map_query_error(e, &customer.email, "Failed to delete customer"))?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(&customer.email));
    }
    Ok(())
}
