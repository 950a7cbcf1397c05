//! Catalog seed loading from a TOML file.
//!
//! The products defined in the catalog file are inserted on startup when no product
//! with the same name exists yet, so editing the file never clobbers prices changed
//! through the admin operations.

use crate::{
    core::catalog::{self, NewProduct},
    entities::{Product, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default location of the catalog seed file.
pub const DEFAULT_CATALOG_PATH: &str = "catalog.toml";

/// Structure of the whole catalog file
#[derive(Debug, Deserialize)]
pub struct CatalogConfig {
    /// Products to seed
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// A single seeded product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductSeed {
    /// Display name, also the dedup key when seeding
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price
    pub price: Decimal,
    /// Unit label (e.g., "kg")
    pub unit: String,
    /// Category label
    pub category: String,
    /// Optional image reference
    #[serde(default)]
    pub image_url: Option<String>,
    /// Informational stock count
    #[serde(default)]
    pub stock: i32,
    /// Minimum quantity per cart line
    #[serde(default = "default_min_order_quantity")]
    pub min_order_quantity: i32,
}

const fn default_min_order_quantity() -> i32 {
    1
}

impl From<ProductSeed> for NewProduct {
    fn from(seed: ProductSeed) -> Self {
        Self {
            name: seed.name,
            description: seed.description,
            price: seed.price,
            unit: seed.unit,
            category: seed.category,
            image_url: seed.image_url,
            stock: seed.stock,
            min_order_quantity: seed.min_order_quantity,
        }
    }
}

/// Loads the catalog from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog file: {e}"),
    })
}

/// Inserts every seed whose name is not in the products table yet.
///
/// Returns the number of products inserted.
///
/// # Errors
/// Returns an error if a seed fails validation or a database call fails.
pub async fn seed_catalog(db: &DatabaseConnection, config: CatalogConfig) -> Result<usize> {
    info!(
        "Seeding catalog. Found {} product entries in configuration.",
        config.products.len()
    );
    let mut inserted = 0;
    for seed in config.products {
        let exists = Product::find()
            .filter(product::Column::Name.eq(seed.name.trim()))
            .one(db)
            .await?
            .is_some();
        if exists {
            debug!("Product '{}' already present, skipping seed", seed.name);
            continue;
        }
        catalog::insert_product(db, seed.into()).await?;
        inserted += 1;
    }
    info!("Catalog seeding inserted {} products", inserted);
    Ok(inserted)
}
