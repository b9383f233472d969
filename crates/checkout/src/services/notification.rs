//! Notification sender trait and implementations.
//!
//! Notifications are fire-and-forget: callers dispatch them on a detached
//! task and never wait for, or react to, the outcome.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderNumber, OrderStatus};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::Instrument;

/// A notification could not be delivered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Notification delivery failed: {0}")]
pub struct NotificationError(pub String);

/// Trait for customer notifications.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends the order confirmation to `email`.
    async fn send_order_confirmation(
        &self,
        order: &Order,
        email: &str,
    ) -> Result<(), NotificationError>;

    /// Tells the customer the order moved to a new status.
    async fn send_status_update(&self, order: &Order) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    OrderConfirmation,
    StatusUpdate,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderConfirmation => "order_confirmation",
            Self::StatusUpdate => "status_update",
        }
    }
}

/// A message to send on a detached task.
#[derive(Debug, Clone)]
pub(crate) enum Dispatch {
    Confirmation { order: Order, email: String },
    StatusUpdate { order: Order },
}

impl Dispatch {
    fn kind(&self) -> NotificationKind {
        match self {
            Self::Confirmation { .. } => NotificationKind::OrderConfirmation,
            Self::StatusUpdate { .. } => NotificationKind::StatusUpdate,
        }
    }

    fn order(&self) -> &Order {
        match self {
            Self::Confirmation { order, .. } | Self::StatusUpdate { order } => order,
        }
    }

    /// Spawns the send and returns immediately.
    ///
    /// Failures are logged and counted under `notification_failures_total`.
    pub(crate) fn spawn<N>(self, notifier: Arc<N>) -> tokio::task::JoinHandle<()>
    where
        N: NotificationSender + ?Sized + 'static,
    {
        let kind = self.kind();
        let span = tracing::info_span!(
            "notification",
            kind = kind.as_str(),
            order_id = %self.order().id,
        );

        tokio::spawn(
            async move {
                let result = match &self {
                    Self::Confirmation { order, email } => {
                        notifier.send_order_confirmation(order, email).await
                    }
                    Self::StatusUpdate { order } => notifier.send_status_update(order).await,
                };

                if let Err(e) = result {
                    metrics::counter!("notification_failures_total", "kind" => kind.as_str())
                        .increment(1);
                    tracing::warn!(error = %e, "notification not delivered");
                }
            }
            .instrument(span),
        )
    }
}

/// Sender that only writes the message to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotificationSender;

#[async_trait]
impl NotificationSender for LoggingNotificationSender {
    async fn send_order_confirmation(
        &self,
        order: &Order,
        email: &str,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            order_number = %order.order_number,
            total = %order.total,
            email,
            "order confirmation sent"
        );
        Ok(())
    }

    async fn send_status_update(&self, order: &Order) -> Result<(), NotificationError> {
        tracing::info!(
            order_number = %order.order_number,
            status = %order.status,
            "order status update sent"
        );
        Ok(())
    }
}

/// A message recorded by [`InMemoryNotificationSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub kind: NotificationKind,
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    /// Recipient address, for confirmations.
    pub email: Option<String>,
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<SentNotification>,
    latency: Duration,
    fail: bool,
}

/// In-memory sender for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationSender {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail.
    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }

    /// Delays every subsequent send by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        self.state.write().await.latency = latency;
    }

    /// Messages delivered so far, oldest first.
    pub async fn sent(&self) -> Vec<SentNotification> {
        self.state.read().await.sent.clone()
    }

    async fn record(
        &self,
        kind: NotificationKind,
        order: &Order,
        email: Option<&str>,
    ) -> Result<(), NotificationError> {
        let (latency, fail) = {
            let state = self.state.read().await;
            (state.latency, state.fail)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if fail {
            return Err(NotificationError(format!(
                "{} for {} rejected",
                kind.as_str(),
                order.order_number
            )));
        }

        self.state.write().await.sent.push(SentNotification {
            kind,
            order_id: order.id,
            order_number: order.order_number.clone(),
            status: order.status,
            email: email.map(str::to_string),
        });
        Ok(())
    }
}

#[async_trait]
impl NotificationSender for InMemoryNotificationSender {
    async fn send_order_confirmation(
        &self,
        order: &Order,
        email: &str,
    ) -> Result<(), NotificationError> {
        self.record(NotificationKind::OrderConfirmation, order, Some(email))
            .await
    }

    async fn send_status_update(&self, order: &Order) -> Result<(), NotificationError> {
        self.record(NotificationKind::StatusUpdate, order, None)
            .await
    }
}
