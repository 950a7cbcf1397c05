//! Resolves the request's [`Caller`] from the identity header.
//!
//! The auth provider in front of the storefront authenticates the user and forwards the
//! local user id in `x-user-id`. A missing, malformed or unknown id is unauthenticated.

use super::AppState;
use crate::{
    core::user::{self, Caller},
    errors::Error,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .ok_or(Error::Unauthenticated)?;

        user::resolve_caller(&state.db, user_id)
            .await?
            .ok_or(Error::Unauthenticated)
    }
}
