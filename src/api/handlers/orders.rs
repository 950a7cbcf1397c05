//! Checkout, the caller's order history and the admin order desk.

use crate::{
    api::AppState,
    core::{
        order::{self, CheckoutRequest},
        user::Caller,
    },
    entities::OrderStatus,
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;

/// Body of `PATCH /api/admin/orders/:id/status`
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// New order status
    pub status: OrderStatus,
}

/// Shopper order routes, mounted under `/api/orders`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(my_orders).post(checkout))
}

/// Admin order routes, mounted under `/api/admin/orders`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(all_orders))
        .route("/:id/status", patch(update_status))
}

async fn checkout(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    let placed = order::create_order(&state.db, &caller, payload).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

async fn my_orders(State(state): State<AppState>, caller: Caller) -> Result<impl IntoResponse> {
    let orders = order::get_my_orders(&state.db, &caller).await?;
    Ok(Json(orders))
}

async fn all_orders(State(state): State<AppState>, caller: Caller) -> Result<impl IntoResponse> {
    let orders = order::get_all_orders(&state.db, &caller).await?;
    Ok(Json(orders))
}

async fn update_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<i64>,
    Json(payload): Json<StatusRequest>,
) -> Result<impl IntoResponse> {
    order::update_order_status(&state.db, &caller, order_id, payload.status).await?;
    Ok(StatusCode::NO_CONTENT)
}
