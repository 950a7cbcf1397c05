//! `/api/users` - account signup.

use crate::{api::AppState, core::user, errors::Result};
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde::Deserialize;
use std::sync::Arc;

/// Body of `POST /api/users`
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Email for the new account
    pub email: String,
}

/// Signup routes, mounted under `/api/users`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(signup))
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    let account = user::register_user(
        &state.db,
        &payload.email,
        &state.admin_emails,
        Arc::clone(&state.notifier),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(account)))
}
