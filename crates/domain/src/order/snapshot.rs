//! Frozen copy of product data embedded in an order line.

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::error::DomainError;
use crate::product::Product;
use crate::value_objects::{Money, ProductId, VariantId};

/// An order line captured at checkout time.
///
/// Fields are private and there are no setters: once captured, later catalog
/// edits (price, name, image) never reach an existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineSnapshot {
    product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variant_id: Option<VariantId>,
    quantity: u32,
    unit_price: Money,
    line_total: Money,
    product_name: String,
    product_image: String,
    sku: String,
}

impl OrderLineSnapshot {
    /// Captures a line from the product as it was when the line was reserved.
    pub fn capture(product: &Product, line: &CartLine) -> Result<Self, DomainError> {
        let line_total = product
            .price
            .checked_multiply(line.quantity)
            .ok_or(DomainError::AmountOverflow("line total"))?;

        Ok(Self {
            product_id: product.id.clone(),
            variant_id: line.variant_id.clone(),
            quantity: line.quantity,
            unit_price: product.price,
            line_total,
            product_name: product.name.clone(),
            product_image: product.image_or_placeholder().to_string(),
            sku: product.sku.clone(),
        })
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn variant_id(&self) -> Option<&VariantId> {
        self.variant_id.as_ref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// `quantity * unit_price`.
    pub fn line_total(&self) -> Money {
        self.line_total
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn product_image(&self) -> &str {
        &self.product_image
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }
}
