//! Order placement request.

use common::UserId;
use domain::{Address, CartLine};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::services::PaymentDetails;

/// Everything the caller supplies to place an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub user_id: UserId,
    /// Recipient of the confirmation message.
    pub email: String,
    pub lines: Vec<CartLine>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_details: PaymentDetails,
}

/// A request that passed validation.
#[derive(Debug)]
pub(crate) struct ValidatedOrder {
    pub user_id: UserId,
    pub email: String,
    pub lines: Vec<CartLine>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: String,
    pub payment_details: PaymentDetails,
}

impl PlaceOrder {
    /// Checks the request before anything is reserved or charged.
    pub(crate) fn validate(self) -> Result<ValidatedOrder, OrderError> {
        if self.lines.is_empty() {
            return Err(OrderError::InvalidRequest("Cart is empty".to_string()));
        }

        for line in &self.lines {
            line.validate().map_err(|e| {
                OrderError::InvalidRequest(format!("Line for product {}: {e}", line.product_id))
            })?;
        }

        let shipping_address = self
            .shipping_address
            .ok_or_else(|| OrderError::InvalidRequest("Shipping address is required".to_string()))?;
        let billing_address = self
            .billing_address
            .ok_or_else(|| OrderError::InvalidRequest("Billing address is required".to_string()))?;

        let payment_method = self
            .payment_method
            .map(|method| method.trim().to_string())
            .filter(|method| !method.is_empty())
            .ok_or_else(|| OrderError::InvalidRequest("Payment method is required".to_string()))?;

        Ok(ValidatedOrder {
            user_id: self.user_id,
            email: self.email,
            lines: self.lines,
            shipping_address,
            billing_address,
            payment_method,
            payment_details: self.payment_details,
        })
    }
}
