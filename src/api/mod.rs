//! HTTP interface - axum router, shared state and request identity.
//!
//! Handlers are thin: they pull the caller and the payload out of the request, call
//! into [`crate::core`] and serialize the result. All business rules live in core.

/// Caller identity extraction
pub mod auth;
/// Mapping of [`crate::errors::Error`] onto HTTP responses
pub mod error;
/// Route handlers grouped by resource
pub mod handlers;

use crate::notify::Notifier;
use axum::{Router, routing::get};
use sea_orm::DatabaseConnection;
use std::{collections::HashSet, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    /// Sink for fire-and-forget notifications
    pub notifier: Arc<dyn Notifier>,
    /// Emails provisioned with the administrative capability
    pub admin_emails: Arc<HashSet<String>>,
}

impl AppState {
    /// Creates the shared state.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        notifier: Arc<dyn Notifier>,
        admin_emails: HashSet<String>,
    ) -> Self {
        Self {
            db: Arc::new(db),
            notifier,
            admin_emails: Arc::new(admin_emails),
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/products", handlers::products::routes())
        .nest("/api/cart", handlers::cart::routes())
        .nest("/api/orders", handlers::orders::routes())
        .nest("/api/admin/orders", handlers::orders::admin_routes())
        .nest("/api/users", handlers::users::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
