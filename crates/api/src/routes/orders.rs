//! Checkout and order history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use checkout::{
    CheckoutCoordinator, LoggingNotificationSender, OrderService, PaymentDetails, PlaceOrder,
    SimulatedPaymentGateway,
};
use common::{OrderId, UserId};
use domain::{Address, CartLine, Order, OrderLineSnapshot, OrderStatus};
use serde::{Deserialize, Serialize};
use store::{Catalog, OrderQuery, OrderStore, Page};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<C: Catalog, O: OrderStore> {
    pub checkout:
        CheckoutCoordinator<C, O, SimulatedPaymentGateway, LoggingNotificationSender>,
    pub orders: OrderService<O, LoggingNotificationSender>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub items: Vec<CartLine>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_details: PaymentDetails,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersParams {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub product_name: String,
    pub product_image: String,
    pub sku: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<&OrderLineSnapshot> for OrderLineResponse {
    fn from(line: &OrderLineSnapshot) -> Self {
        Self {
            product_id: line.product_id().to_string(),
            variant_id: line.variant_id().map(|v| v.to_string()),
            product_name: line.product_name().to_string(),
            product_image: line.product_image().to_string(),
            sku: line.sku().to_string(),
            quantity: line.quantity(),
            unit_price_cents: line.unit_price().cents(),
            line_total_cents: line.line_total().cents(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub currency: String,
    pub lines: Vec<OrderLineResponse>,
    pub item_count: u32,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            order_number: order.order_number.to_string(),
            user_id: order.user_id.to_string(),
            status: order.status.to_string(),
            payment_status: order.payment_status.to_string(),
            payment_method: order.payment_method.clone(),
            transaction_id: order.transaction_id.clone(),
            currency: order.currency.clone(),
            lines: order.lines.iter().map(OrderLineResponse::from).collect(),
            item_count: order.item_count(),
            subtotal_cents: order.subtotal.cents(),
            shipping_cents: order.shipping.cents(),
            tax_cents: order.tax.cents(),
            total_cents: order.total.cents(),
            shipping_address: order.shipping_address.clone(),
            billing_address: order.billing_address.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
            shipped_at: order.shipped_at,
            delivered_at: order.delivered_at,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self::from(&order)
    }
}

// -- Handlers --

/// POST /orders: place an order.
#[tracing::instrument(skip(state, payload))]
pub async fn create<C: Catalog + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(req) = payload?;
    let user_id = req
        .user_id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("user_id is required".to_string()))
        .and_then(parse_user_id)?;

    let email = req
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("email is required".to_string()))?;

    let order = state
        .checkout
        .place_order(PlaceOrder {
            user_id,
            email,
            lines: req.items,
            shipping_address: req.shipping_address,
            billing_address: req.billing_address,
            payment_method: req.payment_method,
            payment_details: req.payment_details,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

/// GET /orders/{id}: load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<C: Catalog + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orders.get_order(order_id).await?;
    Ok(Json(OrderResponse::from(order)))
}

/// GET /orders?user_id=…: one user's order history, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<C: Catalog + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<Page<OrderResponse>>, ApiError> {
    let Query(params) = params?;
    if params.user_id.is_none() {
        return Err(ApiError::BadRequest(
            "user_id query parameter is required".to_string(),
        ));
    }

    let query = build_query(&params, store::DEFAULT_PAGE_SIZE)?;
    let page = state.orders.list_orders(query).await?;
    Ok(Json(page.map(OrderResponse::from)))
}

/// Builds an order query from listing parameters.
pub(crate) fn build_query(
    params: &ListOrdersParams,
    default_limit: u32,
) -> Result<OrderQuery, ApiError> {
    let mut query = OrderQuery::new()
        .page(params.page.unwrap_or(1))
        .limit(params.limit.unwrap_or(default_limit));

    if let Some(user_id) = params.user_id.as_deref() {
        query = query.user_id(parse_user_id(user_id)?);
    }
    if let Some(status) = params.status.as_deref() {
        query = query.status(parse_status(status)?);
    }

    Ok(query)
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

pub(crate) fn parse_user_id(id: &str) -> Result<UserId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid user_id: {e}")))?;
    Ok(UserId::from_uuid(uuid))
}

pub(crate) fn parse_status(status: &str) -> Result<OrderStatus, ApiError> {
    status
        .parse()
        .map_err(|e: domain::DomainError| ApiError::BadRequest(e.to_string()))
}
