//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::UserId;
use domain::{
    Address, CURRENCY_USD, CartLine, Money, NewOrder, OrderLineSnapshot, OrderStatus,
    PaymentStatus, PricingConfig, Product, ProductId,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    Catalog, OrderQuery, OrderStore, PostgresCatalog, PostgresOrderStore, Reservation, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            store::run_migrations(&temp_pool).await.unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Fresh pool with cleared tables and a restarted order sequence
async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders, products")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("ALTER SEQUENCE order_number_seq RESTART WITH 1")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn address() -> Address {
    Address {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        company: Some("Navy".to_string()),
        address1: "1 Compiler Way".to_string(),
        address2: None,
        city: "Arlington".to_string(),
        state: "VA".to_string(),
        zip_code: "22201".to_string(),
        country: "US".to_string(),
    }
}

fn new_order(user_id: UserId, product: &Product, quantity: u32) -> NewOrder {
    let lines = vec![OrderLineSnapshot::capture(
        product,
        &CartLine::new(product.id.clone(), quantity),
    )
    .unwrap()];
    let totals = PricingConfig::default().price(&lines).unwrap();
    NewOrder {
        user_id,
        status: OrderStatus::Pending,
        lines,
        totals,
        currency: CURRENCY_USD.to_string(),
        shipping_address: address(),
        billing_address: address(),
        payment_method: "card".to_string(),
        payment_status: PaymentStatus::Paid,
        transaction_id: Some("txn_test".to_string()),
    }
}

fn desk() -> Product {
    Product::new("desk", "Standing Desk", "DESK-01", Money::from_dollars(50))
        .with_inventory(5)
        .with_image("/img/desk.png")
}

#[tokio::test]
#[serial]
async fn upsert_and_get_product() {
    let catalog = PostgresCatalog::new(get_test_pool().await);

    catalog.upsert_product(desk()).await.unwrap();

    let loaded = catalog
        .get_product(&ProductId::new("desk"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, desk());

    let missing = catalog.get_product(&ProductId::new("nope")).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[serial]
async fn upsert_rejects_non_positive_price() {
    let catalog = PostgresCatalog::new(get_test_pool().await);

    let free = Product::new("free", "Free", "FREE", Money::zero());
    let result = catalog.upsert_product(free).await;
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

#[tokio::test]
#[serial]
async fn reserve_decrements_and_reports_shortage() {
    let catalog = PostgresCatalog::new(get_test_pool().await);
    catalog.upsert_product(desk()).await.unwrap();
    let id = ProductId::new("desk");

    match catalog.reserve(&id, 3).await.unwrap() {
        Reservation::Reserved(product) => assert_eq!(product.inventory, 2),
        other => panic!("expected reservation, got {other:?}"),
    }

    let short = catalog.reserve(&id, 3).await.unwrap();
    assert_eq!(short, Reservation::Insufficient { available: 2 });

    let missing = catalog.reserve(&ProductId::new("nope"), 1).await.unwrap();
    assert_eq!(missing, Reservation::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn refused_reservation_reports_stock_it_was_checked_against() {
    let catalog = PostgresCatalog::new(get_test_pool().await);
    catalog.upsert_product(desk()).await.unwrap();
    let id = ProductId::new("desk");

    let mut reservations = Vec::new();
    let mut restocks = Vec::new();
    for _ in 0..20 {
        let reserving = catalog.clone();
        let reserve_id = id.clone();
        reservations.push(tokio::spawn(async move {
            reserving.reserve(&reserve_id, 3).await.unwrap()
        }));

        let restocking = catalog.clone();
        let restock_id = id.clone();
        restocks.push(tokio::spawn(async move {
            restocking.adjust_inventory(&restock_id, 1).await.unwrap()
        }));
    }

    let mut reserved = 0;
    for handle in reservations {
        match handle.await.unwrap() {
            Reservation::Reserved(_) => reserved += 1,
            Reservation::Insufficient { available } => assert!(available < 3),
            Reservation::NotFound => panic!("product disappeared"),
        }
    }
    for handle in restocks {
        handle.await.unwrap();
    }

    let product = catalog.get_product(&id).await.unwrap().unwrap();
    assert_eq!(i64::from(product.inventory), 5 + 20 - 3 * reserved);
}

#[tokio::test]
#[serial]
async fn adjust_inventory_restores_and_guards_range() {
    let catalog = PostgresCatalog::new(get_test_pool().await);
    catalog.upsert_product(desk()).await.unwrap();
    let id = ProductId::new("desk");

    let restored = catalog.adjust_inventory(&id, 4).await.unwrap().unwrap();
    assert_eq!(restored.inventory, 9);

    let result = catalog.adjust_inventory(&id, -10).await;
    assert!(matches!(
        result,
        Err(StoreError::InventoryOutOfRange { available: 9, .. })
    ));

    let missing = catalog
        .adjust_inventory(&ProductId::new("nope"), 1)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn concurrent_reservations_never_oversell() {
    let catalog = PostgresCatalog::new(get_test_pool().await);
    catalog.upsert_product(desk()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..12 {
        let catalog = catalog.clone();
        handles.push(tokio::spawn(async move {
            catalog.reserve(&ProductId::new("desk"), 1).await.unwrap()
        }));
    }

    let mut reserved = 0;
    for handle in handles {
        if matches!(handle.await.unwrap(), Reservation::Reserved(_)) {
            reserved += 1;
        }
    }

    assert_eq!(reserved, 5);
    let product = catalog
        .get_product(&ProductId::new("desk"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.inventory, 0);
}

#[tokio::test]
#[serial]
async fn insert_assigns_sequential_order_numbers() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let user = UserId::new();
    let year = Utc::now().format("%Y").to_string();

    let first = store.insert_order(new_order(user, &desk(), 1)).await.unwrap();
    let second = store.insert_order(new_order(user, &desk(), 2)).await.unwrap();

    assert_eq!(first.order_number.as_str(), format!("ORD-{year}-001"));
    assert_eq!(second.order_number.as_str(), format!("ORD-{year}-002"));
    assert_ne!(first.id, second.id);
}

#[tokio::test]
#[serial]
async fn inserted_order_round_trips_through_database() {
    let store = PostgresOrderStore::new(get_test_pool().await);

    let inserted = store
        .insert_order(new_order(UserId::new(), &desk(), 2))
        .await
        .unwrap();
    let loaded = store.get_order(inserted.id).await.unwrap().unwrap();

    assert_eq!(loaded.order_number, inserted.order_number);
    assert_eq!(loaded.lines, inserted.lines);
    assert_eq!(loaded.total, Money::from_cents(11799));
    assert_eq!(loaded.shipping_address, address());
    assert_eq!(loaded.payment_status, PaymentStatus::Paid);
    assert_eq!(loaded.transaction_id.as_deref(), Some("txn_test"));
    assert_eq!(loaded.lines[0].product_image(), "/img/desk.png");
}

#[tokio::test]
#[serial]
async fn list_filters_by_user_and_status() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let alice = UserId::new();
    let bob = UserId::new();

    for _ in 0..3 {
        store.insert_order(new_order(alice, &desk(), 1)).await.unwrap();
    }
    let bobs = store.insert_order(new_order(bob, &desk(), 1)).await.unwrap();
    store
        .update_status(bobs.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let page = store
        .list_orders(OrderQuery::for_user(alice).limit(2))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 2);
    assert!(page.items[0].created_at >= page.items[1].created_at);

    let second = store
        .list_orders(OrderQuery::for_user(alice).limit(2).page(2))
        .await
        .unwrap();
    assert_eq!(second.items.len(), 1);

    let shipped = store
        .list_orders(OrderQuery::new().status(OrderStatus::Shipped))
        .await
        .unwrap();
    assert_eq!(shipped.total, 1);
    assert_eq!(shipped.items[0].id, bobs.id);
}

#[tokio::test]
#[serial]
async fn update_status_stamps_timestamps() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = store
        .insert_order(new_order(UserId::new(), &desk(), 1))
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

    let loaded = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, OrderStatus::Shipped);
    assert!(loaded.shipped_at.is_some());
    assert!(loaded.delivered_at.is_none());

    let missing = store
        .update_status(common::OrderId::new(), OrderStatus::Delivered)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[serial]
async fn summary_totals_revenue_and_recent_orders() {
    let store = PostgresOrderStore::new(get_test_pool().await);

    let empty = store.summary(Utc::now() - Duration::days(30)).await.unwrap();
    assert_eq!(empty.total_orders, 0);
    assert!(empty.total_revenue.is_zero());

    store
        .insert_order(new_order(UserId::new(), &desk(), 2))
        .await
        .unwrap();
    store
        .insert_order(new_order(UserId::new(), &desk(), 1))
        .await
        .unwrap();

    let summary = store.summary(Utc::now() - Duration::days(30)).await.unwrap();
    assert_eq!(summary.total_orders, 2);
    // 117.99 + 63.99
    assert_eq!(summary.total_revenue, Money::from_cents(18198));
    assert_eq!(summary.recent_orders, 2);
    assert_eq!(summary.average_order_value, Money::from_cents(9099));

    let future = store.summary(Utc::now() + Duration::days(1)).await.unwrap();
    assert_eq!(future.recent_orders, 0);
}
