//! Catalog product record as seen by the checkout workflow.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{Money, ProductId};

/// Image path snapshotted for products that have no image.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// A product owned by the catalog.
///
/// The checkout workflow only reads `price`, `name`, `sku` and the primary
/// image, and writes `inventory` through the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Money,
    /// Units available for sale.
    pub inventory: u32,
    pub primary_image: Option<String>,
}

impl Product {
    /// Creates a product with no stock and no image.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        sku: impl Into<String>,
        price: Money,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sku: sku.into(),
            price,
            inventory: 0,
            primary_image: None,
        }
    }

    /// Sets the available inventory.
    pub fn with_inventory(mut self, inventory: u32) -> Self {
        self.inventory = inventory;
        self
    }

    /// Sets the primary image.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.primary_image = Some(image.into());
        self
    }

    /// Returns the primary image, or the placeholder when none is set.
    pub fn image_or_placeholder(&self) -> &str {
        self.primary_image.as_deref().unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Returns true if at least `quantity` units are available.
    pub fn can_fulfill(&self, quantity: u32) -> bool {
        self.inventory >= quantity
    }

    /// Checks the catalog invariants (price strictly positive).
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.price.is_positive() {
            return Err(DomainError::InvalidPrice {
                price: self.price.cents(),
            });
        }
        Ok(())
    }
}
