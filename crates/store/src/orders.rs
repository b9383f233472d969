use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{NewOrder, Order, OrderStatus, OrderSummary};
use serde::Serialize;

use crate::Result;

/// Largest page size a listing will return.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default page size for order listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filter and pagination for order listings.
///
/// Results are always ordered newest first.
#[derive(Debug, Clone)]
pub struct OrderQuery {
    /// Filter by owning user.
    pub user_id: Option<UserId>,

    /// Filter by order status.
    pub status: Option<OrderStatus>,

    /// 1-based page number.
    pub page: u32,

    /// Page size.
    pub limit: u32,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            user_id: None,
            status: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl OrderQuery {
    /// Creates a query over all orders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for one user's order history.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    /// Filters by user.
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Selects a page; 0 is treated as the first page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Sets the page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Number of matching orders to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }

    /// Returns true if `order` passes the filters.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(user_id) = self.user_id
            && order.user_id != user_id
        {
            return false;
        }
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        true
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    /// Number of matching records across all pages.
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            items,
            page,
            limit,
            total,
            total_pages,
        }
    }

    /// Converts the items, keeping the pagination figures.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// Persistence for committed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Commits a new order, assigning id, a unique order number and
    /// timestamps.
    async fn insert_order(&self, order: NewOrder) -> Result<Order>;

    /// Loads an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists orders matching the query, newest first.
    async fn list_orders(&self, query: OrderQuery) -> Result<Page<Order>>;

    /// Sets the order status (see [`Order::apply_status`]).
    ///
    /// Returns `None` if the order does not exist.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>>;

    /// Summarizes all orders; those created after `since` count as recent.
    async fn summary(&self, since: DateTime<Utc>) -> Result<OrderSummary>;
}
