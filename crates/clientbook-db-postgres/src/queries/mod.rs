//! SQL query implementations.

pub mod customers;
