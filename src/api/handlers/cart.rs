//! `/api/cart` - the caller's own cart.

use crate::{
    api::AppState,
    core::{cart, user::Caller},
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;

/// Body of `POST /api/cart/items`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    /// Product to add
    pub product_id: i64,
    /// Quantity to add, merged into any existing line
    pub quantity: i32,
}

/// Body of `PATCH /api/cart/items/:id`
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    /// Replacement quantity
    pub quantity: i32,
}

/// Cart routes, mounted under `/api/cart`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/:id", patch(update_item).delete(remove_item))
}

async fn get_cart(State(state): State<AppState>, caller: Caller) -> Result<impl IntoResponse> {
    let view = cart::get_cart(&state.db, &caller).await?;
    Ok(Json(view))
}

async fn clear_cart(State(state): State<AppState>, caller: Caller) -> Result<impl IntoResponse> {
    cart::clear_cart(&state.db, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_item(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<AddToCartRequest>,
) -> Result<impl IntoResponse> {
    cart::add_to_cart(&state.db, &caller, payload.product_id, payload.quantity).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(cart_item_id): Path<i64>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse> {
    cart::update_cart_item(&state.db, &caller, cart_item_id, payload.quantity).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(cart_item_id): Path<i64>,
) -> Result<impl IntoResponse> {
    cart::remove_from_cart(&state.db, &caller, cart_item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
