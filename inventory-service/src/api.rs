use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use shared::ProductPayload;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::models::{NewProduct, Product};
use crate::store::ProductStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

pub async fn health_check() -> &'static str {
    "Inventory Management API is running..."
}

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.store.list().await.map_err(|e| {
        error!(operation = "list", "Error fetching products: {:#}", e);
        ApiError::Internal
    })?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id)?;

    match state.store.get(id).await {
        Ok(Some(product)) => Ok(Json(product)),
        Ok(None) => {
            warn!(operation = "get", id = id, "Product {} not found", id);
            Err(ApiError::NotFound)
        }
        Err(e) => {
            error!(operation = "get", id = id, "Error fetching product {}: {:#}", id, e);
            Err(ApiError::Internal)
        }
    }
}

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = validated("create", payload)?;

    match state.store.create(product).await {
        Ok(product) => {
            info!("Created product {}", product.id);
            Ok((StatusCode::CREATED, Json(product)))
        }
        Err(e) => {
            error!(operation = "create", "Error adding product: {:#}", e);
            Err(ApiError::Internal)
        }
    }
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let product = validated("update", payload)?;
    let id = parse_id(&id)?;

    match state.store.update(id, product).await {
        Ok(Some(product)) => {
            info!("Updated product {}", id);
            Ok(Json(product))
        }
        Ok(None) => {
            warn!(operation = "update", id = id, "Product {} not found", id);
            Err(ApiError::NotFound)
        }
        Err(e) => {
            error!(operation = "update", id = id, "Error updating product {}: {:#}", id, e);
            Err(ApiError::Internal)
        }
    }
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    match state.store.delete(id).await {
        Ok(true) => {
            info!("Deleted product {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => {
            warn!(operation = "delete", id = id, "Product {} not found", id);
            Err(ApiError::NotFound)
        }
        Err(e) => {
            error!(operation = "delete", id = id, "Error deleting product {}: {:#}", id, e);
            Err(ApiError::Internal)
        }
    }
}

fn validated(
    operation: &'static str,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<NewProduct, ApiError> {
    let result = payload
        .map_err(ApiError::from)
        .and_then(|Json(payload)| payload.validate().map_err(ApiError::from));

    match result {
        Ok(fields) => Ok(NewProduct::from(fields)),
        Err(e) => {
            warn!(operation = operation, "Rejected product payload: {}", e);
            Err(e)
        }
    }
}

/// Ids are `int4`; anything else cannot match a row.
fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>().map_err(|_| {
        warn!("Rejecting non-numeric product id {:?}", raw);
        ApiError::NotFound
    })
}
