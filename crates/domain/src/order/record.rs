//! The persisted order record.

use chrono::{DateTime, Datelike, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::snapshot::OrderLineSnapshot;
use super::status::{OrderStatus, PaymentStatus};
use crate::address::Address;
use crate::pricing::PriceBreakdown;
use crate::value_objects::Money;

/// The only currency the storefront charges in.
pub const CURRENCY_USD: &str = "USD";

/// Human-readable order number, e.g. `ORD-2026-007`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Formats the number for the given year and store sequence value.
    pub fn new(year: i32, sequence: u64) -> Self {
        Self(format!("ORD-{year}-{sequence:03}"))
    }

    /// Formats the number from the year of `at`.
    pub fn for_date(at: DateTime<Utc>, sequence: u64) -> Self {
        Self::new(at.year(), sequence)
    }

    /// Wraps an already formatted number loaded from storage.
    pub fn from_string(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An order ready to be committed; the store assigns id, number and
/// timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub status: OrderStatus,
    pub lines: Vec<OrderLineSnapshot>,
    pub totals: PriceBreakdown,
    pub currency: String,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    /// Gateway transaction id of the captured charge.
    pub transaction_id: Option<String>,
}

/// A committed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub lines: Vec<OrderLineSnapshot>,
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
    pub currency: String,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Builds the committed record from a pending insert.
    pub fn from_new(
        new: NewOrder,
        id: OrderId,
        order_number: OrderNumber,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            order_number,
            user_id: new.user_id,
            status: new.status,
            lines: new.lines,
            subtotal: new.totals.subtotal,
            shipping: new.totals.shipping,
            tax: new.totals.tax,
            total: new.totals.total,
            currency: new.currency,
            shipping_address: new.shipping_address,
            billing_address: new.billing_address,
            payment_method: new.payment_method,
            payment_status: new.payment_status,
            transaction_id: new.transaction_id,
            created_at: now,
            updated_at: now,
            shipped_at: None,
            delivered_at: None,
        }
    }

    /// Moves the order to `status`.
    ///
    /// Always stamps `updated_at`; entering `shipped` stamps `shipped_at` and
    /// entering `delivered` stamps `delivered_at`.
    pub fn apply_status(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
        match status {
            OrderStatus::Shipped => self.shipped_at = Some(at),
            OrderStatus::Delivered => self.delivered_at = Some(at),
            _ => {}
        }
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(OrderLineSnapshot::quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::cart::CartLine;
    use crate::pricing::PricingConfig;
    use crate::product::Product;

    fn address() -> Address {
        Address {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            company: None,
            address1: "12 Analytical Row".to_string(),
            address2: None,
            city: "London".to_string(),
            state: "LDN".to_string(),
            zip_code: "N1 9GU".to_string(),
            country: "GB".to_string(),
        }
    }

    fn sample_order(now: DateTime<Utc>) -> Order {
        let product = Product::new("p1", "Desk", "DESK-01", Money::from_dollars(50));
        let lines = vec![OrderLineSnapshot::capture(&product, &CartLine::new("p1", 2)).unwrap()];
        let totals = PricingConfig::default().price(&lines).unwrap();
        let new = NewOrder {
            user_id: UserId::new(),
            status: OrderStatus::Pending,
            lines,
            totals,
            currency: CURRENCY_USD.to_string(),
            shipping_address: address(),
            billing_address: address(),
            payment_method: "card".to_string(),
            payment_status: PaymentStatus::Paid,
            transaction_id: Some("txn_1".to_string()),
        };
        Order::from_new(new, OrderId::new(), OrderNumber::new(2026, 1), now)
    }

    #[test]
    fn test_order_number_format() {
        assert_eq!(OrderNumber::new(2026, 7).as_str(), "ORD-2026-007");
        assert_eq!(OrderNumber::new(2026, 1234).as_str(), "ORD-2026-1234");

        let at = Utc.with_ymd_and_hms(2025, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(OrderNumber::for_date(at, 12).to_string(), "ORD-2025-012");
    }

    #[test]
    fn test_from_new_copies_totals_and_stamps_times() {
        let now = Utc::now();
        let order = sample_order(now);

        assert_eq!(order.subtotal, Money::from_dollars(100));
        assert_eq!(order.shipping, Money::from_cents(999));
        assert_eq!(order.tax, Money::from_dollars(8));
        assert_eq!(order.total, Money::from_cents(11799));
        assert_eq!(order.created_at, now);
        assert_eq!(order.updated_at, now);
        assert!(order.shipped_at.is_none());
        assert_eq!(order.item_count(), 2);
    }

    #[test]
    fn test_apply_status_stamps_shipping_and_delivery() {
        let created = Utc::now();
        let mut order = sample_order(created);

        let processing_at = created + Duration::minutes(5);
        order.apply_status(OrderStatus::Processing, processing_at);
        assert_eq!(order.updated_at, processing_at);
        assert!(order.shipped_at.is_none());

        let shipped_at = created + Duration::hours(2);
        order.apply_status(OrderStatus::Shipped, shipped_at);
        assert_eq!(order.shipped_at, Some(shipped_at));
        assert!(order.delivered_at.is_none());

        let delivered_at = created + Duration::days(2);
        order.apply_status(OrderStatus::Delivered, delivered_at);
        assert_eq!(order.delivered_at, Some(delivered_at));
        assert_eq!(order.shipped_at, Some(shipped_at));
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_apply_status_allows_any_jump() {
        let created = Utc::now();
        let mut order = sample_order(created);

        order.apply_status(OrderStatus::Delivered, created);
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.shipped_at.is_none());

        order.apply_status(OrderStatus::Pending, created);
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
