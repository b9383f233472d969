use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{
    Money, NewOrder, Order, OrderNumber, OrderStatus, OrderSummary, PaymentStatus, Product,
    ProductId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{Catalog, OrderQuery, OrderStore, Page, Reservation, Result, StoreError};

const PRODUCT_COLUMNS: &str = "id, name, sku, price_cents, inventory, primary_image";

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, lines, subtotal_cents, \
     shipping_cents, tax_cents, total_cents, currency, shipping_address, billing_address, \
     payment_method, payment_status, transaction_id, created_at, updated_at, shipped_at, \
     delivered_at";

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{what}: {err}"))
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    let inventory: i64 = row.try_get("inventory")?;
    Ok(Product {
        id: ProductId::new(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        sku: row.try_get("sku")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        inventory: u32::try_from(inventory).map_err(|e| corrupt("inventory", e))?,
        primary_image: row.try_get("primary_image")?,
    })
}

fn row_to_order(row: &PgRow) -> Result<Order> {
    let status: String = row.try_get("status")?;
    let payment_status: String = row.try_get("payment_status")?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_number: OrderNumber::from_string(row.try_get::<String, _>("order_number")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        status: status
            .parse::<OrderStatus>()
            .map_err(|e| corrupt("status", e))?,
        lines: serde_json::from_value(row.try_get("lines")?)?,
        subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
        shipping: Money::from_cents(row.try_get("shipping_cents")?),
        tax: Money::from_cents(row.try_get("tax_cents")?),
        total: Money::from_cents(row.try_get("total_cents")?),
        currency: row.try_get("currency")?,
        shipping_address: serde_json::from_value(row.try_get("shipping_address")?)?,
        billing_address: serde_json::from_value(row.try_get("billing_address")?)?,
        payment_method: row.try_get("payment_method")?,
        payment_status: payment_status
            .parse::<PaymentStatus>()
            .map_err(|e| corrupt("payment_status", e))?,
        transaction_id: row.try_get("transaction_id")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        shipped_at: row.try_get("shipped_at")?,
        delivered_at: row.try_get("delivered_at")?,
    })
}

/// PostgreSQL-backed catalog.
///
/// Reservations are a single conditional `UPDATE`, so the database row lock
/// serializes concurrent check-and-decrement on the same product.
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }


    /// Inserts or replaces a product.
    pub async fn upsert_product(&self, product: Product) -> Result<()> {
        product.validate()?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, sku, price_cents, inventory, primary_image, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                sku = EXCLUDED.sku,
                price_cents = EXCLUDED.price_cents,
                inventory = EXCLUDED.inventory,
                primary_image = EXCLUDED.primary_image,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.price.cents())
        .bind(i64::from(product.inventory))
        .bind(&product.primary_image)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Catalog for PostgresCatalog {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn adjust_inventory(&self, id: &ProductId, delta: i64) -> Result<Option<Product>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut product = row_to_product(&row)?;

        let available = product.inventory;
        product.inventory = u32::try_from(i64::from(available) + delta).map_err(|_| {
            StoreError::InventoryOutOfRange {
                product_id: id.clone(),
                available,
                delta,
            }
        })?;

        sqlx::query("UPDATE products SET inventory = $2, updated_at = now() WHERE id = $1")
            .bind(id.as_str())
            .bind(i64::from(product.inventory))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(product))
    }

    async fn reserve(&self, id: &ProductId, quantity: u32) -> Result<Reservation> {
        let mut tx = self.pool.begin().await?;

        // Locked until commit; a refusal reports the stock the check saw.
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(Reservation::NotFound);
        };
        let current = row_to_product(&row)?;

        if current.inventory < quantity {
            tracing::debug!(
                product_id = %id,
                available = current.inventory,
                quantity,
                "reservation refused"
            );
            return Ok(Reservation::Insufficient {
                available: current.inventory,
            });
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET inventory = inventory - $2, updated_at = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_str())
        .bind(i64::from(quantity))
        .fetch_one(&mut *tx)
        .await?;
        let product = row_to_product(&row)?;

        tx.commit().await?;
        Ok(Reservation::Reserved(product))
    }
}

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let sequence: i64 = sqlx::query_scalar("SELECT nextval('order_number_seq')")
            .fetch_one(&self.pool)
            .await?;

        let now = Utc::now();
        let order = Order::from_new(
            order,
            OrderId::new(),
            OrderNumber::for_date(now, sequence as u64),
            now,
        );

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_seq, order_number, user_id, status, lines,
                subtotal_cents, shipping_cents, tax_cents, total_cents, currency,
                shipping_address, billing_address, payment_method, payment_status,
                transaction_id, created_at, updated_at, shipped_at, delivered_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(sequence)
        .bind(order.order_number.as_str())
        .bind(order.user_id.as_uuid())
        .bind(order.status.as_str())
        .bind(serde_json::to_value(&order.lines)?)
        .bind(order.subtotal.cents())
        .bind(order.shipping.cents())
        .bind(order.tax.cents())
        .bind(order.total.cents())
        .bind(&order.currency)
        .bind(serde_json::to_value(&order.shipping_address)?)
        .bind(serde_json::to_value(&order.billing_address)?)
        .bind(&order.payment_method)
        .bind(order.payment_status.as_str())
        .bind(&order.transaction_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.shipped_at)
        .bind(order.delivered_at)
        .execute(&self.pool)
        .await?;

        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Page<Order>> {
        let mut conditions = Vec::new();
        let mut param_count = 0;

        if query.user_id.is_some() {
            param_count += 1;
            conditions.push(format!("user_id = ${param_count}"));
        }
        if query.status.is_some() {
            param_count += 1;
            conditions.push(format!("status = ${param_count}"));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM orders{where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(user_id) = query.user_id {
            count_query = count_query.bind(user_id.as_uuid());
        }
        if let Some(status) = query.status {
            count_query = count_query.bind(status.as_str());
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let list_sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders{where_clause} \
             ORDER BY created_at DESC, order_seq DESC LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        );
        let mut list_query = sqlx::query(&list_sql);
        if let Some(user_id) = query.user_id {
            list_query = list_query.bind(user_id.as_uuid());
        }
        if let Some(status) = query.status {
            list_query = list_query.bind(status.as_str());
        }
        let rows = list_query
            .bind(i64::from(query.limit))
            .bind(query.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = rows.iter().map(row_to_order).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, query.page, query.limit, total as u64))
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut order = row_to_order(&row)?;
        order.apply_status(status, Utc::now());

        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = $3, shipped_at = $4, delivered_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.updated_at)
        .bind(order.shipped_at)
        .bind(order.delivered_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(order))
    }

    async fn summary(&self, since: DateTime<Utc>) -> Result<OrderSummary> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_orders,
                COALESCE(SUM(total_cents), 0)::BIGINT AS total_revenue,
                COUNT(*) FILTER (WHERE created_at > $1) AS recent_orders
            FROM orders
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let total_orders: i64 = row.try_get("total_orders")?;
        let total_revenue: i64 = row.try_get("total_revenue")?;
        let recent_orders: i64 = row.try_get("recent_orders")?;

        Ok(OrderSummary::new(
            total_orders as u64,
            Money::from_cents(total_revenue),
            recent_orders as u64,
        ))
    }
}
