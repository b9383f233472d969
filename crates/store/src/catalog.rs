use async_trait::async_trait;
use domain::{Product, ProductId};

use crate::Result;

/// Outcome of an atomic check-and-decrement of a product's inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    /// Stock was decremented; carries the product as it is after the update.
    Reserved(Product),

    /// Not enough stock; nothing was changed.
    Insufficient { available: u32 },

    /// No product with this id.
    NotFound,
}

/// Catalog access needed by checkout.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Looks up a product by id.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Adds `delta` (positive or negative) to the product's inventory.
    ///
    /// Returns the updated product, or `None` if the product does not exist.
    /// An adjustment that would make inventory negative fails with
    /// `InventoryOutOfRange` and changes nothing.
    async fn adjust_inventory(&self, id: &ProductId, delta: i64) -> Result<Option<Product>>;

    /// Decrements inventory by `quantity` only if at least that much is
    /// available.
    ///
    /// The availability check and the decrement happen as one atomic step,
    /// so concurrent reservations can never oversell a product.
    async fn reserve(&self, id: &ProductId, quantity: u32) -> Result<Reservation>;
}
