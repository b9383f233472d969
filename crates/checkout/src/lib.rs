//! Order placement workflow for the storefront.
//!
//! Placing an order runs these steps in sequence:
//! 1. Reserve inventory for every cart line
//! 2. Price the reserved lines
//! 3. Charge the payment gateway
//! 4. Commit the order
//! 5. Send the confirmation (fire-and-forget)
//!
//! A failure before step 4 restores all inventory reserved by the attempt.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod orders;
pub mod request;
pub mod services;

pub use config::{CheckoutConfig, DEFAULT_GATEWAY_TIMEOUT};
pub use coordinator::CheckoutCoordinator;
pub use error::{OrderError, Result};
pub use ledger::{LedgerEntry, ReservationLedger, RollbackReport};
pub use orders::{OrderService, RECENT_ORDER_WINDOW_DAYS};
pub use request::PlaceOrder;
pub use services::{
    ChargeOutcome, ChargeRequest, GatewayError, InMemoryNotificationSender,
    LoggingNotificationSender, NotificationError, NotificationKind, NotificationSender,
    PaymentDetails, PaymentGateway, SentNotification, SimulatedPaymentGateway,
};
