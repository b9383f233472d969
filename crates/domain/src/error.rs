//! Domain error types.

use thiserror::Error;

/// Errors raised when a domain record fails validation or parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Quantity must be a positive integer.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Price must be strictly positive.
    #[error("Invalid price: {price} (must be greater than 0)")]
    InvalidPrice { price: i64 },

    /// An order amount does not fit in a 64-bit count of cents.
    #[error("Order amount overflow: {0}")]
    AmountOverflow(&'static str),

    /// The string is not one of the five order statuses.
    #[error("Unknown order status: {0}")]
    UnknownOrderStatus(String),

    /// The string is not one of the four payment statuses.
    #[error("Unknown payment status: {0}")]
    UnknownPaymentStatus(String),
}
