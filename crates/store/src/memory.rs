use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{NewOrder, Order, OrderNumber, OrderStatus, OrderSummary, Product, ProductId};
use tokio::sync::RwLock;

use crate::{Catalog, OrderQuery, OrderStore, Page, Reservation, Result, StoreError};

#[derive(Debug, Default)]
struct CatalogState {
    products: HashMap<ProductId, Product>,
    fail_on_reserve: bool,
    fail_on_adjust: bool,
}

/// In-memory catalog.
///
/// Every mutation runs under a single write lock, which makes `reserve` an
/// atomic check-and-decrement.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the given products.
    pub async fn with_products(products: impl IntoIterator<Item = Product>) -> Result<Self> {
        let catalog = Self::new();
        for product in products {
            catalog.upsert_product(product).await?;
        }
        Ok(catalog)
    }

    /// Inserts or replaces a product.
    pub async fn upsert_product(&self, product: Product) -> Result<()> {
        product.validate()?;
        self.state
            .write()
            .await
            .products
            .insert(product.id.clone(), product);
        Ok(())
    }

    /// Returns the inventory of a product, if it exists.
    pub async fn inventory_of(&self, id: &ProductId) -> Option<u32> {
        self.state.read().await.products.get(id).map(|p| p.inventory)
    }

    /// Makes every subsequent `reserve` call fail with `Unavailable`.
    pub async fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().await.fail_on_reserve = fail;
    }

    /// Makes every subsequent `adjust_inventory` call fail with `Unavailable`.
    pub async fn set_fail_on_adjust(&self, fail: bool) {
        self.state.write().await.fail_on_adjust = fail;
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(id).cloned())
    }

    async fn adjust_inventory(&self, id: &ProductId, delta: i64) -> Result<Option<Product>> {
        let mut state = self.state.write().await;

        if state.fail_on_adjust {
            return Err(StoreError::Unavailable(
                "inventory adjustments disabled".to_string(),
            ));
        }

        let Some(product) = state.products.get_mut(id) else {
            return Ok(None);
        };

        let available = product.inventory;
        product.inventory = u32::try_from(i64::from(available) + delta).map_err(|_| {
            StoreError::InventoryOutOfRange {
                product_id: id.clone(),
                available,
                delta,
            }
        })?;

        Ok(Some(product.clone()))
    }

    async fn reserve(&self, id: &ProductId, quantity: u32) -> Result<Reservation> {
        let mut state = self.state.write().await;

        if state.fail_on_reserve {
            return Err(StoreError::Unavailable(
                "inventory reservations disabled".to_string(),
            ));
        }

        let Some(product) = state.products.get_mut(id) else {
            return Ok(Reservation::NotFound);
        };

        if !product.can_fulfill(quantity) {
            return Ok(Reservation::Insufficient {
                available: product.inventory,
            });
        }

        product.inventory -= quantity;
        Ok(Reservation::Reserved(product.clone()))
    }
}

#[derive(Debug, Default)]
struct OrderState {
    /// Orders in insertion order.
    orders: Vec<Order>,
    next_sequence: u64,
    fail_on_insert: bool,
}

/// In-memory order store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<OrderState>>,
}

impl InMemoryOrderStore {
    /// Creates an empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Makes every subsequent `insert_order` call fail with `Unavailable`.
    pub async fn set_fail_on_insert(&self, fail: bool) {
        self.state.write().await.fail_on_insert = fail;
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;

        if state.fail_on_insert {
            return Err(StoreError::Unavailable("order inserts disabled".to_string()));
        }

        state.next_sequence += 1;
        let now = Utc::now();
        let order = Order::from_new(
            order,
            OrderId::new(),
            OrderNumber::for_date(now, state.next_sequence),
            now,
        );
        state.orders.push(order.clone());

        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Page<Order>> {
        let state = self.state.read().await;

        // Reverse insertion order first so equal timestamps stay newest-first
        // under the stable sort.
        let mut matching: Vec<&Order> =
            state.orders.iter().rev().filter(|o| query.matches(o)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, query.page, query.limit, total))
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        let mut state = self.state.write().await;
        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        order.apply_status(status, Utc::now());
        Ok(Some(order.clone()))
    }

    async fn summary(&self, since: DateTime<Utc>) -> Result<OrderSummary> {
        let state = self.state.read().await;
        Ok(OrderSummary::from_orders(&state.orders, since))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use common::UserId;
    use domain::{
        Address, CURRENCY_USD, CartLine, Money, OrderLineSnapshot, PaymentStatus, PricingConfig,
    };

    use super::*;

    fn lamp(inventory: u32) -> Product {
        Product::new("lamp", "Desk lamp", "LAMP-01", Money::from_cents(2_500))
            .with_inventory(inventory)
    }

    fn address() -> Address {
        Address {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            company: None,
            address1: "1 Harbor Way".to_string(),
            address2: None,
            city: "Arlington".to_string(),
            state: "VA".to_string(),
            zip_code: "22201".to_string(),
            country: "US".to_string(),
        }
    }

    fn new_order(user_id: UserId, quantity: u32) -> NewOrder {
        let lines = vec![OrderLineSnapshot::capture(
            &lamp(10),
            &CartLine::new("lamp", quantity),
        )
        .unwrap()];
        NewOrder {
            user_id,
            status: OrderStatus::Pending,
            totals: PricingConfig::default().price(&lines).unwrap(),
            lines,
            currency: CURRENCY_USD.to_string(),
            shipping_address: address(),
            billing_address: address(),
            payment_method: "card".to_string(),
            payment_status: PaymentStatus::Paid,
            transaction_id: Some("txn_test".to_string()),
        }
    }

    #[tokio::test]
    async fn test_reserve_decrements_when_available() {
        let catalog = InMemoryCatalog::with_products([lamp(5)]).await.unwrap();
        let id = ProductId::new("lamp");

        let outcome = catalog.reserve(&id, 3).await.unwrap();
        match outcome {
            Reservation::Reserved(product) => assert_eq!(product.inventory, 2),
            other => panic!("expected reservation, got {other:?}"),
        }
        assert_eq!(catalog.inventory_of(&id).await, Some(2));
    }

    #[tokio::test]
    async fn test_reserve_insufficient_changes_nothing() {
        let catalog = InMemoryCatalog::with_products([lamp(3)]).await.unwrap();
        let id = ProductId::new("lamp");

        let outcome = catalog.reserve(&id, 5).await.unwrap();
        assert_eq!(outcome, Reservation::Insufficient { available: 3 });
        assert_eq!(catalog.inventory_of(&id).await, Some(3));
    }

    #[tokio::test]
    async fn test_reserve_unknown_product() {
        let catalog = InMemoryCatalog::new();
        let outcome = catalog.reserve(&ProductId::new("nope"), 1).await.unwrap();
        assert_eq!(outcome, Reservation::NotFound);
    }

    #[tokio::test]
    async fn test_adjust_inventory_both_directions() {
        let catalog = InMemoryCatalog::with_products([lamp(4)]).await.unwrap();
        let id = ProductId::new("lamp");

        let product = catalog.adjust_inventory(&id, 6).await.unwrap().unwrap();
        assert_eq!(product.inventory, 10);

        let product = catalog.adjust_inventory(&id, -10).await.unwrap().unwrap();
        assert_eq!(product.inventory, 0);

        let missing = catalog
            .adjust_inventory(&ProductId::new("nope"), 1)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_adjust_inventory_rejects_underflow() {
        let catalog = InMemoryCatalog::with_products([lamp(2)]).await.unwrap();
        let id = ProductId::new("lamp");

        let result = catalog.adjust_inventory(&id, -3).await;
        assert!(matches!(
            result,
            Err(StoreError::InventoryOutOfRange { available: 2, delta: -3, .. })
        ));
        assert_eq!(catalog.inventory_of(&id).await, Some(2));
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_price() {
        let catalog = InMemoryCatalog::new();
        let free = Product::new("free", "Free", "FREE", Money::zero());
        assert!(matches!(
            catalog.upsert_product(free).await,
            Err(StoreError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let catalog = InMemoryCatalog::with_products([lamp(2)]).await.unwrap();
        let id = ProductId::new("lamp");

        catalog.set_fail_on_reserve(true).await;
        assert!(catalog.reserve(&id, 1).await.is_err());

        catalog.set_fail_on_adjust(true).await;
        assert!(catalog.adjust_inventory(&id, 1).await.is_err());
        assert_eq!(catalog.inventory_of(&id).await, Some(2));
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_order_numbers() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();

        let first = store.insert_order(new_order(user, 1)).await.unwrap();
        let second = store.insert_order(new_order(user, 1)).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(first.order_number.as_str().ends_with("-001"));
        assert!(second.order_number.as_str().ends_with("-002"));
        assert_eq!(first.payment_status, PaymentStatus::Paid);
        assert_eq!(store.order_count().await, 2);
    }

    #[tokio::test]
    async fn test_insert_failure_persists_nothing() {
        let store = InMemoryOrderStore::new();
        store.set_fail_on_insert(true).await;

        let result = store.insert_order(new_order(UserId::new(), 1)).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates_newest_first() {
        let store = InMemoryOrderStore::new();
        let alice = UserId::new();
        let bob = UserId::new();

        let mut alice_orders = Vec::new();
        for _ in 0..3 {
            alice_orders.push(store.insert_order(new_order(alice, 1)).await.unwrap());
        }
        store.insert_order(new_order(bob, 1)).await.unwrap();

        let page = store
            .list_orders(OrderQuery::for_user(alice).limit(2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, alice_orders[2].id);
        assert_eq!(page.items[1].id, alice_orders[1].id);

        let page = store
            .list_orders(OrderQuery::for_user(alice).limit(2).page(2))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, alice_orders[0].id);

        let all = store.list_orders(OrderQuery::new()).await.unwrap();
        assert_eq!(all.total, 4);
    }

    #[tokio::test]
    async fn test_update_status_and_filter() {
        let store = InMemoryOrderStore::new();
        let order = store
            .insert_order(new_order(UserId::new(), 1))
            .await
            .unwrap();

        let shipped = store
            .update_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert!(shipped.shipped_at.is_some());
        assert!(shipped.updated_at >= order.updated_at);

        let page = store
            .list_orders(OrderQuery::new().status(OrderStatus::Shipped))
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let missing = store
            .update_status(OrderId::new(), OrderStatus::Cancelled)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_summary() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();
        let a = store.insert_order(new_order(user, 1)).await.unwrap();
        let b = store.insert_order(new_order(user, 5)).await.unwrap();

        let summary = store
            .summary(Utc::now() - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.recent_orders, 2);
        assert_eq!(summary.total_revenue, a.total + b.total);

        let summary = store
            .summary(Utc::now() + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(summary.recent_orders, 0);
    }
}
