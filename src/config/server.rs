//! HTTP server settings read from the environment.

use super::catalog::DEFAULT_CATALOG_PATH;
use std::path::PathBuf;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Settings for the HTTP entry point
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_address: String,
    /// Path of the catalog seed file
    pub catalog_path: PathBuf,
}

impl ServerConfig {
    /// Builds the settings from `STOREFRONT_BIND_ADDRESS` and `STOREFRONT_CATALOG`,
    /// falling back to defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bind_address: std::env::var("STOREFRONT_BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
            catalog_path: std::env::var("STOREFRONT_CATALOG")
                .map_or_else(|_| PathBuf::from(DEFAULT_CATALOG_PATH), PathBuf::from),
        }
    }
}
