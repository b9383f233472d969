//! Admin endpoints: order listing, status changes and analytics.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use store::{Catalog, OrderStore, Page};

use crate::error::ApiError;
use crate::routes::orders::{
    AppState, ListOrdersParams, OrderResponse, build_query, parse_order_id, parse_status,
};

/// Default page size of the admin order listing.
pub const ADMIN_PAGE_SIZE: u32 = 20;

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct AnalyticsResponse {
    pub total_orders: u64,
    pub total_revenue_cents: i64,
    pub recent_orders: u64,
    pub average_order_value_cents: i64,
}

/// GET /admin/orders: all orders, optionally filtered by user or status.
#[tracing::instrument(skip(state))]
pub async fn list<C: Catalog + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<Page<OrderResponse>>, ApiError> {
    let Query(params) = params?;
    let query = build_query(&params, ADMIN_PAGE_SIZE)?;
    let page = state.orders.list_orders(query).await?;
    Ok(Json(page.map(OrderResponse::from)))
}

/// PUT /admin/orders/{id}/status: move an order to another status.
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<C: Catalog + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Json(req) = payload?;
    let order_id = parse_order_id(&id)?;
    let status = parse_status(&req.status)?;

    let order = state.orders.update_status(order_id, status).await?;
    Ok(Json(OrderResponse::from(order)))
}

/// GET /admin/analytics: order totals and the last 30 days' activity.
#[tracing::instrument(skip(state))]
pub async fn analytics<C: Catalog + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let summary = state.orders.summary().await?;

    Ok(Json(AnalyticsResponse {
        total_orders: summary.total_orders,
        total_revenue_cents: summary.total_revenue.cents(),
        recent_orders: summary.recent_orders,
        average_order_value_cents: summary.average_order_value.cents(),
    }))
}
