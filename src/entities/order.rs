//! Order entity - The durable record of a completed checkout.
//!
//! Everything except `status` is written once. `total_price` is the cart total at
//! checkout time and is never recomputed.

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// Fulfilment lifecycle of an order.
///
/// Intended flow is `Pending → Confirmed → Preparing → Shipped → Delivered`, with
/// `Cancelled` reachable from any non-terminal state. Transitions are not enforced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed, awaiting confirmation
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Accepted by the store
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    /// Being picked and packed
    #[sea_orm(string_value = "PREPARING")]
    Preparing,
    /// Handed to delivery
    #[sea_orm(string_value = "SHIPPED")]
    Shipped,
    /// Received by the customer
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    /// Cancelled before delivery
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    /// Whether this state ends the lifecycle. Informational only.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-referenceable order number, unique
    #[sea_orm(unique)]
    pub order_number: String,
    /// Purchasing user
    pub user_id: i64,
    /// Cart total at checkout
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_price: Decimal,
    /// Street address
    pub delivery_address: String,
    /// City
    pub delivery_city: String,
    /// Postal code
    pub delivery_postal_code: String,
    /// Contact phone
    pub delivery_phone: String,
    /// Free-form delivery notes
    pub delivery_notes: Option<String>,
    /// Payment method label, no gateway behind it
    pub payment_method: String,
    /// Fulfilment status, the only mutable field
    pub status: OrderStatus,
    /// When the order was placed
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One order has many frozen lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
