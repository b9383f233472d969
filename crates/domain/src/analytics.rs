//! Order analytics for the admin console.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::Order;
use crate::value_objects::Money;

/// Aggregate figures over all committed orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub total_orders: u64,
    pub total_revenue: Money,
    /// Orders created strictly after the reporting window start.
    pub recent_orders: u64,
    /// Revenue per order rounded to the nearest cent; zero with no orders.
    pub average_order_value: Money,
}

impl OrderSummary {
    /// Builds a summary from pre-aggregated counts.
    pub fn new(total_orders: u64, total_revenue: Money, recent_orders: u64) -> Self {
        let average_order_value = if total_orders == 0 {
            Money::zero()
        } else {
            let count = i128::from(total_orders);
            let cents = i128::from(total_revenue.cents());
            Money::from_cents(((cents + count / 2) / count) as i64)
        };
        Self {
            total_orders,
            total_revenue,
            recent_orders,
            average_order_value,
        }
    }

    /// Summarizes a set of orders, counting those created after `since` as
    /// recent.
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>, since: DateTime<Utc>) -> Self {
        let mut total_orders = 0;
        let mut total_revenue = Money::zero();
        let mut recent_orders = 0;
        for order in orders {
            total_orders += 1;
            total_revenue += order.total;
            if order.created_at > since {
                recent_orders += 1;
            }
        }
        Self::new(total_orders, total_revenue, recent_orders)
    }
}
