//! Domain layer for the storefront checkout system.
//!
//! This crate holds the records the checkout workflow reads and writes:
//! - Catalog products and caller-supplied cart lines
//! - Pricing rules (free-shipping threshold, flat shipping fee, tax rate)
//! - Orders with frozen line snapshots and their status values
//! - Order analytics for the admin console

pub mod address;
pub mod analytics;
pub mod cart;
pub mod error;
pub mod order;
pub mod pricing;
pub mod product;
pub mod value_objects;

pub use address::Address;
pub use analytics::OrderSummary;
pub use cart::CartLine;
pub use error::DomainError;
pub use order::{
    CURRENCY_USD, NewOrder, Order, OrderLineSnapshot, OrderNumber, OrderStatus, PaymentStatus,
};
pub use pricing::{PriceBreakdown, PricingConfig};
pub use product::{PLACEHOLDER_IMAGE, Product};
pub use value_objects::{Money, ProductId, VariantId};
