//! Cart business logic - Mutations on a user's cart and the priced cart view.
//!
//! Each user has at most one cart, created lazily by the first add. Both the cart
//! creation and the line merge are single `INSERT ... ON CONFLICT` statements backed by
//! unique indexes, so two concurrent adds from the same user can neither create a second
//! cart nor a second line for the same product.
//!
//! Items owned by another user are reported as not found, never as forbidden.

use crate::{
    core::user::Caller,
    entities::{Cart, CartItem, Product, cart, cart_item, product},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// One cart line joined with the live product it points at
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// The stored line
    #[serde(flatten)]
    pub item: cart_item::Model,
    /// Current product state
    pub product: product::Model,
    /// `product.price × quantity` at current prices
    pub line_total: Decimal,
}

/// The caller's cart priced at current product prices
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    /// Cart id, `None` when the caller has never added anything
    pub cart_id: Option<i64>,
    /// Lines in insertion order
    pub items: Vec<CartLine>,
    /// Sum of all line totals
    pub total_price: Decimal,
}

/// Price of `quantity` units at `unit_price`.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Sum of `price × quantity` over the given lines, using the live product prices.
#[must_use]
pub fn cart_total(lines: &[(cart_item::Model, product::Model)]) -> Decimal {
    lines
        .iter()
        .map(|(item, product)| line_total(product.price, item.quantity))
        .sum()
}

/// Finds the user's cart, if one exists.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_cart<C>(db: &C, user_id: i64) -> Result<Option<cart::Model>>
where
    C: ConnectionTrait,
{
    Cart::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the user's cart, creating it if needed.
///
/// The insert is a no-op when the cart already exists, so concurrent callers all end up
/// reading the same row.
///
/// # Errors
/// Returns an error if the upsert or the follow-up read fails.
pub async fn find_or_create_cart<C>(db: &C, user_id: i64) -> Result<cart::Model>
where
    C: ConnectionTrait,
{
    let new_cart = cart::ActiveModel {
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Cart::insert(new_cart)
        .on_conflict(
            OnConflict::column(cart::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    find_cart(db, user_id).await?.ok_or_else(|| Error::Conflict {
        message: format!("cart for user {user_id} vanished during creation"),
    })
}

/// Loads every line of a cart together with its product, in insertion order.
///
/// # Errors
/// Returns an error if the query fails or a line points at a missing product.
pub async fn load_cart_lines<C>(
    db: &C,
    cart_id: i64,
) -> Result<Vec<(cart_item::Model, product::Model)>>
where
    C: ConnectionTrait,
{
    CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .order_by_asc(cart_item::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await?
        .into_iter()
        .map(|(item, product)| match product {
            Some(product) => Ok((item, product)),
            None => Err(Error::ProductNotFound {
                product_id: item.product_id,
            }),
        })
        .collect()
}

/// Adds `quantity` units of a product to the caller's cart.
///
/// If the cart already holds this product the quantities are summed; otherwise a new
/// line is created. The cart itself is created on first use. Nothing is written when
/// validation fails.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist
/// - The product is unavailable
/// - `quantity` is below the product's minimum order quantity
/// - The merged line quantity would exceed `i32::MAX`
/// - The database write fails
pub async fn add_to_cart(
    db: &DatabaseConnection,
    caller: &Caller,
    product_id: i64,
    quantity: i32,
) -> Result<()> {
    let product = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { product_id })?;

    if !product.is_available {
        return Err(Error::ProductUnavailable {
            product_id,
            name: product.name,
        });
    }

    if quantity < product.min_order_quantity {
        warn!(
            user_id = caller.user_id,
            product_id, quantity, "Add to cart below minimum order quantity"
        );
        return Err(Error::BelowMinimum {
            minimum: product.min_order_quantity,
            requested: quantity,
            unit: product.unit,
        });
    }

    let txn = db.begin().await?;
    let cart = find_or_create_cart(&txn, caller.user_id).await?;

    let line = cart_item::ActiveModel {
        cart_id: Set(cart.id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let written = CartItem::insert(line)
        .on_conflict(
            OnConflict::columns([cart_item::Column::CartId, cart_item::Column::ProductId])
                .value(
                    cart_item::Column::Quantity,
                    Expr::col((CartItem, cart_item::Column::Quantity)).add(quantity),
                )
                .action_and_where(
                    Expr::col((CartItem, cart_item::Column::Quantity)).lte(i32::MAX - quantity),
                )
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

    // Zero rows means the merged quantity would not fit the column
    if written == 0 {
        let existing = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?
            .map_or(0, |item| i64::from(item.quantity));
        warn!(
            user_id = caller.user_id,
            product_id, quantity, existing, "Cart line quantity would overflow"
        );
        return Err(Error::InvalidQuantity {
            quantity: existing + i64::from(quantity),
        });
    }

    txn.commit().await?;

    info!(
        user_id = caller.user_id,
        cart_id = cart.id,
        product_id,
        quantity,
        "Added to cart"
    );
    Ok(())
}

/// Loads a cart item if, and only if, it lives in the caller's cart.
async fn find_owned_item(
    db: &DatabaseConnection,
    caller: &Caller,
    cart_item_id: i64,
) -> Result<cart_item::Model> {
    let found = CartItem::find_by_id(cart_item_id)
        .find_also_related(Cart)
        .one(db)
        .await?;

    match found {
        Some((item, Some(cart))) if cart.user_id == caller.user_id => Ok(item),
        _ => Err(Error::CartItemNotFound { cart_item_id }),
    }
}

/// Overwrites the quantity of one of the caller's cart lines.
///
/// # Errors
/// Returns an error if:
/// - The item does not exist or is in another user's cart
/// - `quantity` is below 1
/// - `quantity` is below the product's minimum order quantity
/// - The database update fails
pub async fn update_cart_item(
    db: &DatabaseConnection,
    caller: &Caller,
    cart_item_id: i64,
    quantity: i32,
) -> Result<()> {
    let item = find_owned_item(db, caller, cart_item_id).await?;

    if quantity < 1 {
        return Err(Error::InvalidQuantity {
            quantity: i64::from(quantity),
        });
    }

    let product = Product::find_by_id(item.product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound {
            product_id: item.product_id,
        })?;

    if quantity < product.min_order_quantity {
        return Err(Error::BelowMinimum {
            minimum: product.min_order_quantity,
            requested: quantity,
            unit: product.unit,
        });
    }

    let mut item: cart_item::ActiveModel = item.into();
    item.quantity = Set(quantity);
    item.update(db).await?;

    debug!(user_id = caller.user_id, cart_item_id, quantity, "Cart item updated");
    Ok(())
}

/// Deletes one of the caller's cart lines.
///
/// # Errors
/// Returns [`Error::CartItemNotFound`] if the item is absent, already removed or in
/// another user's cart.
pub async fn remove_from_cart(
    db: &DatabaseConnection,
    caller: &Caller,
    cart_item_id: i64,
) -> Result<()> {
    let item = find_owned_item(db, caller, cart_item_id).await?;
    item.delete(db).await?;

    debug!(user_id = caller.user_id, cart_item_id, "Cart item removed");
    Ok(())
}

/// Deletes every line in the caller's cart. A caller without a cart is left as is.
///
/// # Errors
/// Returns an error if the database delete fails.
pub async fn clear_cart(db: &DatabaseConnection, caller: &Caller) -> Result<()> {
    let Some(cart) = find_cart(db, caller.user_id).await? else {
        return Ok(());
    };

    let deleted = CartItem::delete_many()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .exec(db)
        .await?;

    debug!(
        user_id = caller.user_id,
        removed = deleted.rows_affected,
        "Cart cleared"
    );
    Ok(())
}

/// Returns the caller's cart with each line priced at current product prices.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_cart(db: &DatabaseConnection, caller: &Caller) -> Result<CartView> {
    let Some(cart) = find_cart(db, caller.user_id).await? else {
        return Ok(CartView {
            cart_id: None,
            items: Vec::new(),
            total_price: Decimal::ZERO,
        });
    };

    let lines = load_cart_lines(db, cart.id).await?;
    let total_price = cart_total(&lines);
    let items = lines
        .into_iter()
        .map(|(item, product)| CartLine {
            line_total: line_total(product.price, item.quantity),
            item,
            product,
        })
        .collect();

    Ok(CartView {
        cart_id: Some(cart.id),
        items,
        total_price,
    })
}
