//! Payment gateway trait and the simulated gateway.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Card number the simulated gateway declines for insufficient funds.
pub const DECLINED_INSUFFICIENT_FUNDS_CARD: &str = "4000000000000002";

/// Card number the simulated gateway declines with a processing error.
pub const DECLINED_PROCESSING_ERROR_CARD: &str = "4000000000000119";

/// Method-specific payment data passed through to the gateway untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl PaymentDetails {
    pub fn card(number: impl Into<String>) -> Self {
        Self {
            card_number: Some(number.into()),
            extra: HashMap::new(),
        }
    }
}

/// A single charge submitted to the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    pub amount: Money,
    pub currency: String,
    pub payment_method: String,
    pub details: PaymentDetails,
}

/// The gateway's answer to a charge it was able to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Approved { transaction_id: String },
    Declined { reason: String },
}

/// The gateway could not process the charge.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),

    #[error("Payment gateway timed out after {0:?}")]
    Timeout(Duration),
}

/// Trait for payment authorization.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Authorizes and captures a charge.
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome, GatewayError>;
}

#[derive(Debug, Default)]
struct SimulatedGatewayState {
    charges: Vec<ChargeRequest>,
    latency: Duration,
    unavailable: bool,
}

/// Gateway that approves every charge except two well-known test cards.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPaymentGateway {
    state: Arc<RwLock<SimulatedGatewayState>>,
}

impl SimulatedPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway that waits `latency` before answering.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(SimulatedGatewayState {
                latency,
                ..Default::default()
            })),
        }
    }

    pub async fn set_latency(&self, latency: Duration) {
        self.state.write().await.latency = latency;
    }

    /// Makes every subsequent charge fail with `Unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Number of charges the gateway has received, declined ones included.
    pub async fn charge_count(&self) -> usize {
        self.state.read().await.charges.len()
    }

    /// Every charge received so far, oldest first.
    pub async fn charges(&self) -> Vec<ChargeRequest> {
        self.state.read().await.charges.clone()
    }

    fn decline_reason(details: &PaymentDetails) -> Option<&'static str> {
        let digits: String = details
            .card_number
            .as_deref()?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();

        match digits.as_str() {
            DECLINED_INSUFFICIENT_FUNDS_CARD => Some("Payment declined - insufficient funds"),
            DECLINED_PROCESSING_ERROR_CARD => Some("Payment declined - processing error"),
            _ => None,
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    #[tracing::instrument(skip(self, request), fields(amount = %request.amount))]
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        let (latency, unavailable) = {
            let mut state = self.state.write().await;
            state.charges.push(request.clone());
            (state.latency, state.unavailable)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if unavailable {
            return Err(GatewayError::Unavailable(
                "simulated gateway outage".to_string(),
            ));
        }

        if let Some(reason) = Self::decline_reason(&request.details) {
            tracing::info!(reason, "charge declined");
            return Ok(ChargeOutcome::Declined {
                reason: reason.to_string(),
            });
        }

        let transaction_id = format!("txn_{}", uuid::Uuid::new_v4().simple());
        tracing::info!(%transaction_id, "charge approved");
        Ok(ChargeOutcome::Approved { transaction_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(card: &str) -> ChargeRequest {
        ChargeRequest {
            amount: Money::from_cents(14040),
            currency: "USD".to_string(),
            payment_method: "card".to_string(),
            details: PaymentDetails::card(card),
        }
    }

    #[tokio::test]
    async fn test_approves_regular_card() {
        let gateway = SimulatedPaymentGateway::new();

        let outcome = gateway.charge(request("4242424242424242")).await.unwrap();
        match outcome {
            ChargeOutcome::Approved { transaction_id } => {
                assert!(transaction_id.starts_with("txn_"))
            }
            other => panic!("expected approval, got {other:?}"),
        }
        assert_eq!(gateway.charge_count().await, 1);
    }

    #[tokio::test]
    async fn test_declines_test_cards() {
        let gateway = SimulatedPaymentGateway::new();

        let outcome = gateway
            .charge(request(DECLINED_INSUFFICIENT_FUNDS_CARD))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ChargeOutcome::Declined {
                reason: "Payment declined - insufficient funds".to_string()
            }
        );

        let outcome = gateway
            .charge(request("4000 0000 0000 0119"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ChargeOutcome::Declined {
                reason: "Payment declined - processing error".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_card_number_is_approved() {
        let gateway = SimulatedPaymentGateway::new();
        let mut req = request("");
        req.details = PaymentDetails::default();
        req.payment_method = "paypal".to_string();

        let outcome = gateway.charge(req).await.unwrap();
        assert!(matches!(outcome, ChargeOutcome::Approved { .. }));
    }

    #[tokio::test]
    async fn test_unavailable_gateway_errors() {
        let gateway = SimulatedPaymentGateway::new();
        gateway.set_unavailable(true).await;

        let result = gateway.charge(request("4242424242424242")).await;
        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
        assert_eq!(gateway.charge_count().await, 1);
    }

    #[test]
    fn test_payment_details_keep_extra_fields() {
        let details: PaymentDetails = serde_json::from_value(serde_json::json!({
            "card_number": "4242424242424242",
            "expiry": "12/30",
            "cvv": "123"
        }))
        .unwrap();

        assert_eq!(details.card_number.as_deref(), Some("4242424242424242"));
        assert_eq!(details.extra.get("expiry"), Some(&serde_json::json!("12/30")));
        assert_eq!(details.extra.len(), 2);
    }
}
