//! HTTP API server with observability for the storefront checkout system.
//!
//! Provides REST endpoints for placing orders, order history and order
//! administration, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::{
    CheckoutCoordinator, LoggingNotificationSender, OrderService, SimulatedPaymentGateway,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{Catalog, OrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<C, O>(state: Arc<AppState<C, O>>, metrics_handle: PrometheusHandle) -> Router
where
    C: Catalog + 'static,
    O: OrderStore + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products/{id}", get(routes::products::get::<C, O>))
        .route(
            "/orders",
            post(routes::orders::create::<C, O>).get(routes::orders::list::<C, O>),
        )
        .route("/orders/{id}", get(routes::orders::get::<C, O>))
        .route("/admin/orders", get(routes::admin::list::<C, O>))
        .route(
            "/admin/orders/{id}/status",
            put(routes::admin::update_status::<C, O>),
        )
        .route("/admin/analytics", get(routes::admin::analytics::<C, O>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given stores, with the simulated
/// payment gateway and log-only notifications.
pub fn create_default_state<C, O>(catalog: C, orders: O, config: &Config) -> Arc<AppState<C, O>>
where
    C: Catalog + 'static,
    O: OrderStore + Clone + 'static,
{
    let gateway = SimulatedPaymentGateway::with_latency(config.payment_latency);

    let checkout = CheckoutCoordinator::new(
        catalog,
        orders.clone(),
        gateway,
        LoggingNotificationSender,
        config.checkout(),
    );
    let orders = OrderService::new(orders, LoggingNotificationSender);

    Arc::new(AppState { checkout, orders })
}
