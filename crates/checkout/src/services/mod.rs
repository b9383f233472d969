//! External collaborators of the checkout workflow.

pub mod notification;
pub mod payment;

pub use notification::{
    InMemoryNotificationSender, LoggingNotificationSender, NotificationError, NotificationKind,
    NotificationSender, SentNotification,
};
pub use payment::{
    ChargeOutcome, ChargeRequest, DECLINED_INSUFFICIENT_FUNDS_CARD, DECLINED_PROCESSING_ERROR_CARD,
    GatewayError, PaymentDetails, PaymentGateway, SimulatedPaymentGateway,
};
