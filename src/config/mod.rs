/// Catalog seed loading from catalog.toml
pub mod catalog;

/// Database configuration and connection management
pub mod database;

/// HTTP server settings from environment variables
pub mod server;

/// Administrator provisioning from environment variables
pub mod users;
