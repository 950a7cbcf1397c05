//! HTTP rendering of storefront errors.

use crate::errors::{Error, ErrorKind};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable failure kind identifier
    pub error: &'static str,
    /// Human-readable message
    pub message: String,
}

/// Status code for a failure kind.
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unavailable
        | ErrorKind::InvalidQuantity
        | ErrorKind::BelowMinimum
        | ErrorKind::EmptyCart
        | ErrorKind::BelowMinimumOrderValue
        | ErrorKind::Invalid => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let message = if kind == ErrorKind::Internal {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: kind.as_str(),
            message,
        };
        (status_for(kind), Json(body)).into_response()
    }
}
