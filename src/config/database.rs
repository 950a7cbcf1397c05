//! Database configuration module for the storefront.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Single-column uniqueness (one cart per
//! user, unique emails and order numbers) comes from `#[sea_orm(unique)]` on the entities;
//! the composite `(cart_id, product_id)` index on cart items is created here explicitly
//! because the cart upserts depend on it as their conflict target.

use crate::entities::{Cart, CartItem, Order, OrderItem, Product, User, cart_item};
use crate::errors::Result;
use sea_orm::sea_query::{Index, TableCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.sqlite?mode=rwc";

/// Name of the unique index backing the cart line merge.
pub const CART_ITEM_UNIQUE_INDEX: &str = "idx_cart_items_cart_product";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
///
/// # Errors
/// Returns an error if the database directory cannot be created or the connection fails.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    let parent = sqlite_file_path(&database_url)
        .and_then(|path| path.parent().map(Path::to_path_buf))
        .filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(&parent)?;
    }
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Extracts the file path from a file-backed `SQLite` URL.
///
/// Returns `None` for in-memory databases and non-`SQLite` URLs.
#[must_use]
pub fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

fn table_for<E>(schema: &Schema, entity: E) -> TableCreateStatement
where
    E: EntityTrait,
{
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    table
}

/// Creates all tables and indexes if they do not exist yet.
///
/// Tables are created parents-first so foreign keys resolve: users and products,
/// then carts and their items, then orders and their items.
///
/// # Errors
/// Returns an error if any table or index statement fails.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        table_for(&schema, User),
        table_for(&schema, Product),
        table_for(&schema, Cart),
        table_for(&schema, CartItem),
        table_for(&schema, Order),
        table_for(&schema, OrderItem),
    ];
    for table in &tables {
        db.execute(builder.build(table)).await?;
    }

    let cart_item_index = Index::create()
        .name(CART_ITEM_UNIQUE_INDEX)
        .table(CartItem)
        .col(cart_item::Column::CartId)
        .col(cart_item::Column::ProductId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&cart_item_index)).await?;

    Ok(())
}
