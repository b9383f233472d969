use domain::{DomainError, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with the catalog or order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An inventory adjustment would leave the counter outside `0..=u32::MAX`.
    #[error(
        "Inventory adjustment of {delta} for product {product_id} is out of range (available: {available})"
    )]
    InventoryOutOfRange {
        product_id: ProductId,
        available: u32,
        delta: i64,
    },

    /// A record failed domain validation.
    #[error("Invalid record: {0}")]
    Invalid(#[from] DomainError),

    /// A stored row could not be mapped back to a domain record.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The backing store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
