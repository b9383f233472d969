//! Repositories used by the checkout workflow.
//!
//! Two traits stand in for the storefront's data access layer:
//! - [`Catalog`] reads products and mutates their inventory counters
//! - [`OrderStore`] commits, queries and updates orders
//!
//! Each has an in-memory implementation (tests, local runs) and a
//! PostgreSQL implementation.

pub mod catalog;
pub mod error;
pub mod memory;
pub mod orders;
pub mod postgres;

pub use catalog::{Catalog, Reservation};
pub use error::{Result, StoreError};
pub use memory::{InMemoryCatalog, InMemoryOrderStore};
pub use orders::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, OrderQuery, OrderStore, Page};
pub use postgres::{PostgresCatalog, PostgresOrderStore, run_migrations};
