//! Catalog lookup endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{Product, ProductId};
use serde::Serialize;
use store::{Catalog, OrderStore};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price_cents: i64,
    pub inventory: u32,
    pub in_stock: bool,
    pub image: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            image: product.image_or_placeholder().to_string(),
            in_stock: product.inventory > 0,
            id: product.id.to_string(),
            name: product.name,
            sku: product.sku,
            price_cents: product.price.cents(),
            inventory: product.inventory,
        }
    }
}

/// GET /products/{id}: current price and stock of a product.
#[tracing::instrument(skip(state))]
pub async fn get<C: Catalog + 'static, O: OrderStore + 'static>(
    State(state): State<Arc<AppState<C, O>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .checkout
        .catalog()
        .get_product(&ProductId::new(id.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;

    Ok(Json(ProductResponse::from(product)))
}
