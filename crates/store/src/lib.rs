//! Storage adapters.
//!
//! In-memory stores back tests and single-process deployments; the `postgres`
//! feature adds sqlx-backed implementations of the same traits.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(test)]
mod integration_tests;

pub use in_memory::{InMemoryStockStore, InMemoryTransferStore};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresStockStore, PostgresTransferStore};
