//! Pricing rules applied to reserved order lines.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::order::OrderLineSnapshot;
use crate::value_objects::Money;

/// Tunable pricing constants.
///
/// Defaults: free shipping above $100.00, otherwise a flat $9.99, and 8% tax
/// on the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Subtotals strictly above this amount ship for free.
    pub free_shipping_threshold: Money,
    pub flat_shipping_fee: Money,
    /// Tax rate in basis points (800 = 8%).
    pub tax_rate_bps: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::from_dollars(100),
            flat_shipping_fee: Money::from_cents(999),
            tax_rate_bps: 800,
        }
    }
}

impl PricingConfig {
    /// Shipping charged for a given subtotal.
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal > self.free_shipping_threshold {
            Money::zero()
        } else {
            self.flat_shipping_fee
        }
    }

    /// Tax charged on a given subtotal, rounded half-up to the cent.
    pub fn tax_for(&self, subtotal: Money) -> Money {
        subtotal.apply_rate_bps(self.tax_rate_bps)
    }

    /// Prices a set of captured lines.
    pub fn price(&self, lines: &[OrderLineSnapshot]) -> Result<PriceBreakdown, DomainError> {
        let subtotal = lines
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.line_total()))
            .ok_or(DomainError::AmountOverflow("subtotal"))?;
        self.price_subtotal(subtotal)
    }

    /// Prices an already summed subtotal.
    pub fn price_subtotal(&self, subtotal: Money) -> Result<PriceBreakdown, DomainError> {
        let shipping = self.shipping_for(subtotal);
        let tax = self.tax_for(subtotal);
        let total = subtotal
            .checked_add(shipping)
            .and_then(|amount| amount.checked_add(tax))
            .ok_or(DomainError::AmountOverflow("total"))?;

        Ok(PriceBreakdown {
            subtotal,
            shipping,
            tax,
            total,
        })
    }
}

/// Amounts charged for an order. `total = subtotal + shipping + tax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}
