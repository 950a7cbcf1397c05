//! Catalog business logic - Reading the storefront catalog and administering products.
//!
//! Shoppers only ever see available products. Administrators can create products,
//! edit any field (including the availability flag) and remove products from sale.
//! Removal is a soft delete: the row stays so order history can keep pointing at it.

use crate::{
    core::user::Caller,
    entities::{Product, product},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Fields for a new product
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price, non-negative
    pub price: Decimal,
    /// Unit label
    pub unit: String,
    /// Category label
    pub category: String,
    /// Optional image reference
    #[serde(default)]
    pub image_url: Option<String>,
    /// Informational stock count, non-negative
    #[serde(default)]
    pub stock: i32,
    /// Minimum quantity per cart line, at least 1
    #[serde(default = "default_min_order_quantity")]
    pub min_order_quantity: i32,
}

const fn default_min_order_quantity() -> i32 {
    1
}

/// Partial product update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New price
    pub price: Option<Decimal>,
    /// New unit label
    pub unit: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New image reference
    pub image_url: Option<String>,
    /// New stock count
    pub stock: Option<i32>,
    /// New availability flag
    pub is_available: Option<bool>,
    /// New minimum order quantity
    pub min_order_quantity: Option<i32>,
}

fn invalid(message: &str) -> Error {
    Error::InvalidProduct {
        message: message.to_string(),
    }
}

fn require_label(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(&format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn check_price(price: Decimal) -> Result<()> {
    if price < Decimal::ZERO {
        return Err(invalid("price cannot be negative"));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<()> {
    if stock < 0 {
        return Err(invalid("stock cannot be negative"));
    }
    Ok(())
}

fn check_min_order_quantity(min_order_quantity: i32) -> Result<()> {
    if min_order_quantity < 1 {
        return Err(invalid("minimum order quantity must be at least 1"));
    }
    Ok(())
}

/// Lists every available product, ordered by category then name.
///
/// Unavailable products never appear here.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_available_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::IsAvailable.eq(true))
        .order_by_asc(product::Column::Category)
        .order_by_asc(product::Column::Name)
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID, available or not.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Validates and inserts a product without an authorization check.
///
/// Used by catalog seeding; request-driven creation goes through [`create_product`].
///
/// # Errors
/// Returns an error if:
/// - Name, unit or category is empty or whitespace-only
/// - The price or stock is negative
/// - The minimum order quantity is below 1
/// - The database insert fails
pub async fn insert_product(db: &DatabaseConnection, new: NewProduct) -> Result<product::Model> {
    let name = require_label(&new.name, "name")?;
    let unit = require_label(&new.unit, "unit")?;
    let category = require_label(&new.category, "category")?;
    check_price(new.price)?;
    check_stock(new.stock)?;
    check_min_order_quantity(new.min_order_quantity)?;

    let now = Utc::now();
    let product = product::ActiveModel {
        name: Set(name),
        description: Set(new.description),
        price: Set(new.price),
        unit: Set(unit),
        category: Set(category),
        image_url: Set(new.image_url),
        stock: Set(new.stock),
        min_order_quantity: Set(new.min_order_quantity),
        is_available: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Creates a product on behalf of an administrator.
///
/// # Errors
/// Returns an error if:
/// - The caller is not an administrator
/// - Any field fails validation
/// - The database insert fails
pub async fn create_product(
    db: &DatabaseConnection,
    caller: &Caller,
    new: NewProduct,
) -> Result<product::Model> {
    caller.require_admin()?;
    let product = insert_product(db, new).await?;
    info!(product_id = product.id, "Product '{}' created", product.name);
    Ok(product)
}

/// Applies a partial update to a product on behalf of an administrator.
///
/// Only the fields present in `update` change; each is validated like on creation.
///
/// # Errors
/// Returns an error if:
/// - The caller is not an administrator
/// - The product does not exist
/// - Any supplied field fails validation
/// - The database update fails
pub async fn update_product(
    db: &DatabaseConnection,
    caller: &Caller,
    product_id: i64,
    update: ProductUpdate,
) -> Result<product::Model> {
    caller.require_admin()?;

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { product_id })?
        .into();

    if let Some(name) = update.name {
        product.name = Set(require_label(&name, "name")?);
    }
    if let Some(description) = update.description {
        product.description = Set(Some(description));
    }
    if let Some(price) = update.price {
        check_price(price)?;
        product.price = Set(price);
    }
    if let Some(unit) = update.unit {
        product.unit = Set(require_label(&unit, "unit")?);
    }
    if let Some(category) = update.category {
        product.category = Set(require_label(&category, "category")?);
    }
    if let Some(image_url) = update.image_url {
        product.image_url = Set(Some(image_url));
    }
    if let Some(stock) = update.stock {
        check_stock(stock)?;
        product.stock = Set(stock);
    }
    if let Some(is_available) = update.is_available {
        product.is_available = Set(is_available);
    }
    if let Some(min_order_quantity) = update.min_order_quantity {
        check_min_order_quantity(min_order_quantity)?;
        product.min_order_quantity = Set(min_order_quantity);
    }
    product.updated_at = Set(Utc::now());

    let product = product.update(db).await?;
    info!(product_id, "Product updated");
    Ok(product)
}

/// Takes a product off sale by clearing its availability flag.
///
/// Existing cart lines keep pointing at it; adding it again fails as unavailable.
///
/// # Errors
/// Returns an error if:
/// - The caller is not an administrator
/// - The product does not exist
/// - The database update fails
pub async fn delete_product(
    db: &DatabaseConnection,
    caller: &Caller,
    product_id: i64,
) -> Result<product::Model> {
    caller.require_admin()?;

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { product_id })?
        .into();

    product.is_available = Set(false);
    product.updated_at = Set(Utc::now());

    let product = product.update(db).await?;
    info!(product_id, "Product removed from sale");
    Ok(product)
}
