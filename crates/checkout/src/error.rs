//! Checkout error types.

use common::OrderId;
use domain::ProductId;
use store::StoreError;
use thiserror::Error;

/// Errors returned by order placement and order administration.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request failed validation; nothing was touched.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A requested product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A requested product does not have enough stock.
    #[error(
        "Insufficient inventory for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientInventory {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The gateway declined the charge.
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    /// The gateway failed or did not answer in time.
    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    /// The order store failed.
    #[error("Order persistence error: {0}")]
    Persistence(#[source] StoreError),

    /// The catalog failed while reserving inventory.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(#[source] StoreError),

    /// No order with this id.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
}

impl OrderError {
    /// Short label used for the `reason` metric dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::ProductNotFound(_) => "product_not_found",
            Self::InsufficientInventory { .. } => "insufficient_inventory",
            Self::PaymentDeclined(_) => "payment_declined",
            Self::PaymentGateway(_) => "payment_gateway",
            Self::Persistence(_) => "persistence",
            Self::CatalogUnavailable(_) => "catalog_unavailable",
            Self::OrderNotFound(_) => "order_not_found",
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, OrderError>;
