//! `/api/products` - public catalog reads and admin product writes.

use crate::{
    api::AppState,
    core::{
        catalog::{self, NewProduct, ProductUpdate},
        user::Caller,
    },
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

/// Product routes, mounted under `/api/products`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = catalog::list_available_products(&state.db).await?;
    Ok(Json(products))
}

async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let product = catalog::get_product_by_id(&state.db, product_id)
        .await?
        .ok_or(Error::ProductNotFound { product_id })?;
    Ok(Json(product))
}

async fn create_product(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<NewProduct>,
) -> Result<impl IntoResponse> {
    let product = catalog::create_product(&state.db, &caller, payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(product_id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> Result<impl IntoResponse> {
    let product = catalog::update_product(&state.db, &caller, product_id, payload).await?;
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(product_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let product = catalog::delete_product(&state.db, &caller, product_id).await?;
    Ok(Json(product))
}
