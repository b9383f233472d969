//! Order lookup, history and administration.

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::OrderId;
use domain::{Order, OrderStatus, OrderSummary};
use store::{OrderQuery, OrderStore, Page};

use crate::error::OrderError;
use crate::services::NotificationSender;
use crate::services::notification::Dispatch;

/// Orders created within this many days count as recent in the summary.
pub const RECENT_ORDER_WINDOW_DAYS: i64 = 30;

/// Read access to committed orders plus the admin status transition.
pub struct OrderService<O, N>
where
    O: OrderStore,
    N: NotificationSender + 'static,
{
    orders: O,
    notifier: Arc<N>,
}

impl<O, N> OrderService<O, N>
where
    O: OrderStore,
    N: NotificationSender + 'static,
{
    pub fn new(orders: O, notifier: N) -> Self {
        Self {
            orders,
            notifier: Arc::new(notifier),
        }
    }

    /// Loads an order by id.
    pub async fn get_order(&self, id: OrderId) -> Result<Order, OrderError> {
        self.orders
            .get_order(id)
            .await
            .map_err(OrderError::Persistence)?
            .ok_or(OrderError::OrderNotFound(id))
    }

    /// Lists orders, newest first.
    pub async fn list_orders(&self, query: OrderQuery) -> Result<Page<Order>, OrderError> {
        self.orders
            .list_orders(query)
            .await
            .map_err(OrderError::Persistence)
    }

    /// Moves an order to `status`.
    ///
    /// Any status may follow any other. The customer is notified on a
    /// detached task once the change is stored.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = self
            .orders
            .update_status(id, status)
            .await
            .map_err(OrderError::Persistence)?
            .ok_or(OrderError::OrderNotFound(id))?;

        metrics::counter!("order_status_updates_total", "status" => status.as_str()).increment(1);
        tracing::info!(order_number = %order.order_number, %status, "order status updated");

        Dispatch::StatusUpdate {
            order: order.clone(),
        }
        .spawn(Arc::clone(&self.notifier));

        Ok(order)
    }

    /// Summarizes all orders; recent means the last
    /// [`RECENT_ORDER_WINDOW_DAYS`] days.
    pub async fn summary(&self) -> Result<OrderSummary, OrderError> {
        let since = Utc::now() - Duration::days(RECENT_ORDER_WINDOW_DAYS);
        self.orders
            .summary(since)
            .await
            .map_err(OrderError::Persistence)
    }
}
