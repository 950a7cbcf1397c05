//! Product entity - A purchasable catalog item.
//!
//! Products carry a live price and unit. Cart items point at the live row, order items
//! copy price and unit at checkout. Products are never hard-deleted: removing one from
//! the catalog clears `is_available` so order history keeps its reference.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Tomatoes")
    pub name: String,
    /// Optional long description
    pub description: Option<String>,
    /// Current unit price, never negative
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// Unit label the price refers to (e.g., "kg")
    pub unit: String,
    /// Category label used for grouping in the catalog
    pub category: String,
    /// Optional image reference
    pub image_url: Option<String>,
    /// Informational stock count, not decremented by checkout
    pub stock: i32,
    /// Smallest quantity allowed on a single cart line, at least 1
    pub min_order_quantity: i32,
    /// Whether the product can currently be added to carts
    pub is_available: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Live cart lines pointing at this product
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
    /// Frozen order lines referencing this product
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
