//! Order business logic - Checkout, order listings and status management.
//!
//! Checkout turns the caller's cart into an order inside one database transaction:
//! the order row, one order item per cart line (with price and unit copied from the
//! product at that moment) and the removal of every cart line either all commit or
//! none do. The cart total is computed from live product prices, never from anything
//! cached on the cart.
//!
//! Order numbers are `FRU` + epoch milliseconds + a three-digit random suffix, backed by
//! a unique index. A collision rolls the attempt back and retries with a fresh number.

use crate::{
    core::{cart, user::Caller},
    entities::{
        CartItem, Order, OrderItem, OrderStatus, Product, User, cart_item, order, order_item,
        product,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{LoaderTrait, QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Smallest cart total that may be checked out.
pub const MIN_ORDER_VALUE: Decimal = dec!(500);

const ORDER_NUMBER_PREFIX: &str = "FRU";

/// Attempts made before an order-number collision is reported as a conflict.
const MAX_ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Delivery and payment details supplied at checkout
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Street address
    pub delivery_address: String,
    /// City
    pub delivery_city: String,
    /// Postal code
    pub delivery_postal_code: String,
    /// Contact phone
    pub delivery_phone: String,
    /// Free-form notes for the courier
    #[serde(default)]
    pub delivery_notes: Option<String>,
    /// Payment method label
    pub payment_method: String,
}

/// One frozen order line with the product it was bought as
///
/// `item.price` and `item.unit` are the values at checkout; `product` is the current
/// catalog state, for display only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    /// The stored line
    #[serde(flatten)]
    pub item: order_item::Model,
    /// Current product state
    pub product: product::Model,
}

/// An order together with its lines
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    /// The order row
    #[serde(flatten)]
    pub order: order::Model,
    /// Frozen order lines
    pub items: Vec<OrderLine>,
    /// Purchaser's email, only filled in for administrative listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
}

/// Produces a new candidate order number.
#[must_use]
pub fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("{ORDER_NUMBER_PREFIX}{millis}{suffix:03}")
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Checks out the caller's cart.
///
/// # Errors
/// Returns an error if:
/// - The caller has no cart or the cart has no items
/// - The cart total at current prices is below [`MIN_ORDER_VALUE`]
/// - No unique order number could be allocated
/// - The cart changed underneath the checkout
/// - The database transaction fails
pub async fn create_order(
    db: &DatabaseConnection,
    caller: &Caller,
    checkout: CheckoutRequest,
) -> Result<OrderWithItems> {
    create_order_with(db, caller, checkout, generate_order_number).await
}

/// [`create_order`] with a caller-supplied order number generator.
///
/// # Errors
/// Same as [`create_order`].
#[instrument(skip(db, checkout, next_order_number), fields(user_id = caller.user_id))]
pub async fn create_order_with<F>(
    db: &DatabaseConnection,
    caller: &Caller,
    checkout: CheckoutRequest,
    mut next_order_number: F,
) -> Result<OrderWithItems>
where
    F: FnMut() -> String,
{
    for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
        let order_number = next_order_number();
        match place_order(db, caller.user_id, &checkout, order_number.clone()).await {
            Err(Error::Database(err)) if is_unique_violation(&err) => {
                warn!(
                    attempt,
                    order_number = %order_number,
                    "Order number collision, retrying"
                );
            }
            outcome => return outcome,
        }
    }

    Err(Error::Conflict {
        message: format!(
            "could not allocate a unique order number after {MAX_ORDER_NUMBER_ATTEMPTS} attempts"
        ),
    })
}

/// One checkout attempt. Any early return drops the transaction, rolling it back.
async fn place_order(
    db: &DatabaseConnection,
    user_id: i64,
    checkout: &CheckoutRequest,
    order_number: String,
) -> Result<OrderWithItems> {
    let txn = db.begin().await?;

    let Some(user_cart) = cart::find_cart(&txn, user_id).await? else {
        return Err(Error::EmptyCart);
    };
    let lines = cart::load_cart_lines(&txn, user_cart.id).await?;
    if lines.is_empty() {
        return Err(Error::EmptyCart);
    }

    let total_price = cart::cart_total(&lines);
    if total_price < MIN_ORDER_VALUE {
        warn!(user_id, %total_price, "Checkout below minimum order value");
        return Err(Error::BelowMinimumOrderValue {
            total: total_price,
            minimum: MIN_ORDER_VALUE,
        });
    }

    let order = order::ActiveModel {
        order_number: Set(order_number),
        user_id: Set(user_id),
        total_price: Set(total_price),
        delivery_address: Set(checkout.delivery_address.clone()),
        delivery_city: Set(checkout.delivery_city.clone()),
        delivery_postal_code: Set(checkout.delivery_postal_code.clone()),
        delivery_phone: Set(checkout.delivery_phone.clone()),
        delivery_notes: Set(checkout.delivery_notes.clone()),
        payment_method: Set(checkout.payment_method.clone()),
        status: Set(OrderStatus::Pending),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (line, product) in &lines {
        let item = order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(product.id),
            quantity: Set(line.quantity),
            price: Set(product.price),
            unit: Set(product.unit.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(OrderLine {
            item,
            product: product.clone(),
        });
    }

    let deleted = CartItem::delete_many()
        .filter(cart_item::Column::CartId.eq(user_cart.id))
        .exec(&txn)
        .await?;
    if usize::try_from(deleted.rows_affected).ok() != Some(lines.len()) {
        return Err(if deleted.rows_affected == 0 {
            Error::EmptyCart
        } else {
            Error::Conflict {
                message: "cart changed during checkout".to_string(),
            }
        });
    }

    txn.commit().await?;

    info!(
        user_id,
        order_id = order.id,
        order_number = %order.order_number,
        %total_price,
        items = items.len(),
        "Order placed"
    );
    Ok(OrderWithItems {
        order,
        items,
        customer_email: None,
    })
}

async fn attach_items(
    db: &DatabaseConnection,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderWithItems>> {
    let grouped = orders.load_many(OrderItem, db).await?;
    let mut with_items = Vec::with_capacity(orders.len());
    for (order, mut items) in orders.into_iter().zip(grouped) {
        items.sort_by_key(|item| item.id);
        let products = items.load_one(Product, db).await?;
        let lines = items
            .into_iter()
            .zip(products)
            .map(|(item, product)| match product {
                Some(product) => Ok(OrderLine { item, product }),
                None => Err(Error::ProductNotFound {
                    product_id: item.product_id,
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        with_items.push(OrderWithItems {
            order,
            items: lines,
            customer_email: None,
        });
    }
    Ok(with_items)
}

/// Lists the caller's orders, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_my_orders(
    db: &DatabaseConnection,
    caller: &Caller,
) -> Result<Vec<OrderWithItems>> {
    let orders = Order::find()
        .filter(order::Column::UserId.eq(caller.user_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;
    attach_items(db, orders).await
}

/// Lists every order in the store, newest first, with the purchaser's email.
///
/// # Errors
/// Returns [`Error::Forbidden`] unless the caller is an administrator.
pub async fn get_all_orders(
    db: &DatabaseConnection,
    caller: &Caller,
) -> Result<Vec<OrderWithItems>> {
    caller.require_admin()?;

    let orders = Order::find()
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;
    let users = orders.load_one(User, db).await?;
    let with_items = attach_items(db, orders).await?;

    Ok(with_items
        .into_iter()
        .zip(users)
        .map(|(mut order, user)| {
            order.customer_email = user.map(|u| u.email);
            order
        })
        .collect())
}

/// Overwrites an order's status.
///
/// Any status may replace any other; the lifecycle in [`OrderStatus`] is not enforced.
///
/// # Errors
/// Returns an error if:
/// - The caller is not an administrator
/// - The order does not exist
/// - The database update fails
pub async fn update_order_status(
    db: &DatabaseConnection,
    caller: &Caller,
    order_id: i64,
    status: OrderStatus,
) -> Result<()> {
    caller.require_admin()?;

    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { order_id })?;
    let previous = order.status;

    let mut order: order::ActiveModel = order.into();
    order.status = Set(status);
    order.update(db).await?;

    info!(order_id, ?previous, ?status, "Order status updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{
        cart::{add_to_cart, get_cart},
        catalog::{self, ProductUpdate},
    };
    use crate::entities::Cart;
    use crate::test_utils::*;

    fn checkout() -> CheckoutRequest {
        CheckoutRequest {
            delivery_address: "Market Street 1".to_string(),
            delivery_city: "Istanbul".to_string(),
            delivery_postal_code: "34000".to_string(),
            delivery_phone: "+90 555 000 0000".to_string(),
            delivery_notes: Some("Ring twice".to_string()),
            payment_method: "cash_on_delivery".to_string(),
        }
    }

    #[test]
    fn test_generate_order_number_shape() {
        let number = generate_order_number();
        assert!(number.starts_with("FRU"));
        assert!(number[3..].chars().all(|c| c.is_ascii_digit()));
        // 13-digit millisecond timestamp plus three suffix digits
        assert_eq!(number.len(), 3 + 13 + 3);
    }

    #[tokio::test]
    async fn test_checkout_merged_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let a = create_test_product(&db, "A", dec!(100), 2).await?;

        add_to_cart(&db, &alice, a.id, 3).await?;
        assert_eq!(get_cart(&db, &alice).await?.total_price, dec!(300));
        add_to_cart(&db, &alice, a.id, 3).await?;
        assert_eq!(get_cart(&db, &alice).await?.total_price, dec!(600));

        let placed = create_order(&db, &alice, checkout()).await?;
        assert_eq!(placed.order.total_price, dec!(600.00));
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.user_id, alice.user_id);
        assert!(placed.order.order_number.starts_with("FRU"));
        assert_eq!(placed.items.len(), 1);
        assert_eq!(placed.items[0].item.quantity, 6);
        assert_eq!(placed.items[0].item.price, dec!(100));
        assert_eq!(placed.items[0].item.unit, "kg");
        assert_eq!(placed.items[0].product.name, "A");

        assert!(get_cart(&db, &alice).await?.items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_below_minimum_value_keeps_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let b = create_test_product(&db, "B", dec!(50), 1).await?;
        add_to_cart(&db, &alice, b.id, 5).await?;

        let result = create_order(&db, &alice, checkout()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::BelowMinimumOrderValue { total, minimum }
                if total == dec!(250) && minimum == dec!(500)
        ));

        let view = get_cart(&db, &alice).await?;
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].item.quantity, 5);
        assert!(Order::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;

        // No cart at all
        let result = create_order(&db, &alice, checkout()).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyCart));

        // Cart exists but holds nothing
        cart::find_or_create_cart(&db, alice.user_id).await?;
        let result = create_order(&db, &alice, checkout()).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyCart));
        Ok(())
    }

    #[tokio::test]
    async fn test_second_checkout_fails_with_empty_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let a = create_test_product(&db, "A", dec!(250), 1).await?;
        add_to_cart(&db, &alice, a.id, 2).await?;

        create_order(&db, &alice, checkout()).await?;
        let result = create_order(&db, &alice, checkout()).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyCart));
        assert_eq!(Order::find().all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_order_items_are_price_snapshots() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_admin(&db).await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let apples = create_test_product(&db, "Apples", dec!(40), 1).await?;
        let pears = create_test_product(&db, "Pears", dec!(60), 1).await?;
        add_to_cart(&db, &alice, apples.id, 5).await?;
        add_to_cart(&db, &alice, pears.id, 5).await?;

        // Price change between add and checkout is honoured
        catalog::update_product(
            &db,
            &admin,
            apples.id,
            ProductUpdate {
                price: Some(dec!(50)),
                ..Default::default()
            },
        )
        .await?;

        let placed = create_order(&db, &alice, checkout()).await?;
        assert_eq!(placed.order.total_price, dec!(550));
        assert_eq!(placed.items.len(), 2);

        // Later catalog edits do not reach the order
        catalog::update_product(
            &db,
            &admin,
            apples.id,
            ProductUpdate {
                price: Some(dec!(99)),
                unit: Some("box".to_string()),
                ..Default::default()
            },
        )
        .await?;

        let orders = get_my_orders(&db, &alice).await?;
        let apple_line = orders[0]
            .items
            .iter()
            .find(|line| line.item.product_id == apples.id)
            .unwrap();
        assert_eq!(apple_line.item.price, dec!(50));
        assert_eq!(apple_line.item.unit, "kg");
        assert_eq!(apple_line.product.price, dec!(99));
        assert_eq!(apple_line.product.unit, "box");
        assert_eq!(orders[0].order.total_price, dec!(550));
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_keeps_delivery_details() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let a = create_test_product(&db, "A", dec!(500), 1).await?;
        add_to_cart(&db, &alice, a.id, 1).await?;

        let placed = create_order(&db, &alice, checkout()).await?;
        assert_eq!(placed.order.delivery_city, "Istanbul");
        assert_eq!(placed.order.delivery_notes.as_deref(), Some("Ring twice"));
        assert_eq!(placed.order.payment_method, "cash_on_delivery");
        // Exactly the threshold is enough
        assert_eq!(placed.order.total_price, MIN_ORDER_VALUE);
        Ok(())
    }

    #[tokio::test]
    async fn test_order_number_collision_retries() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let bob = create_shopper(&db, "bob@shop.test").await?;
        let a = create_test_product(&db, "A", dec!(600), 1).await?;
        add_to_cart(&db, &alice, a.id, 1).await?;
        add_to_cart(&db, &bob, a.id, 1).await?;

        create_order_with(&db, &alice, checkout(), || "FRU1".to_string()).await?;

        let mut candidates = vec!["FRU2".to_string(), "FRU1".to_string()];
        let placed =
            create_order_with(&db, &bob, checkout(), || candidates.pop().unwrap()).await?;
        assert_eq!(placed.order.order_number, "FRU2");
        assert!(get_cart(&db, &bob).await?.items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_order_number_exhaustion_is_conflict() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let bob = create_shopper(&db, "bob@shop.test").await?;
        let a = create_test_product(&db, "A", dec!(600), 1).await?;
        add_to_cart(&db, &alice, a.id, 1).await?;
        add_to_cart(&db, &bob, a.id, 1).await?;

        create_order_with(&db, &alice, checkout(), || "FRU1".to_string()).await?;

        let mut attempts = 0;
        let result = create_order_with(&db, &bob, checkout(), || {
            attempts += 1;
            "FRU1".to_string()
        })
        .await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));
        assert_eq!(attempts, MAX_ORDER_NUMBER_ATTEMPTS);

        // Every failed attempt rolled back completely
        assert_eq!(get_cart(&db, &bob).await?.items.len(), 1);
        assert_eq!(Order::find().all(&db).await?.len(), 1);
        assert_eq!(OrderItem::find().all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_my_orders_only_returns_own_orders() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let bob = create_shopper(&db, "bob@shop.test").await?;
        let a = create_test_product(&db, "A", dec!(600), 1).await?;

        add_to_cart(&db, &alice, a.id, 1).await?;
        let first = create_order(&db, &alice, checkout()).await?;
        add_to_cart(&db, &alice, a.id, 2).await?;
        let second = create_order(&db, &alice, checkout()).await?;
        add_to_cart(&db, &bob, a.id, 1).await?;
        create_order(&db, &bob, checkout()).await?;

        let mine = get_my_orders(&db, &alice).await?;
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].order.id, second.order.id);
        assert_eq!(mine[1].order.id, first.order.id);
        assert_eq!(mine[0].items[0].item.quantity, 2);
        assert!(mine.iter().all(|o| o.customer_email.is_none()));
        Ok(())
    }

    #[tokio::test]
    async fn test_order_history_carries_product_details() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let figs = create_test_product(&db, "Figs", dec!(120), 1).await?;
        let plums = create_test_product(&db, "Plums", dec!(80), 2).await?;
        add_to_cart(&db, &alice, figs.id, 3).await?;
        add_to_cart(&db, &alice, plums.id, 2).await?;
        create_order(&db, &alice, checkout()).await?;

        let mine = get_my_orders(&db, &alice).await?;
        let names: Vec<&str> = mine[0]
            .items
            .iter()
            .map(|line| line.product.name.as_str())
            .collect();
        assert_eq!(names, ["Figs", "Plums"]);
        assert_eq!(mine[0].items[0].product.category, "vegetables");

        let json = serde_json::to_value(&mine[0]).unwrap();
        assert_eq!(json["items"][0]["product"]["name"], "Figs");
        assert_eq!(json["items"][0]["quantity"], 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_orders_requires_admin() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_admin(&db).await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let bob = create_shopper(&db, "bob@shop.test").await?;
        let a = create_test_product(&db, "A", dec!(600), 1).await?;
        add_to_cart(&db, &alice, a.id, 1).await?;
        create_order(&db, &alice, checkout()).await?;
        add_to_cart(&db, &bob, a.id, 1).await?;
        create_order(&db, &bob, checkout()).await?;

        let result = get_all_orders(&db, &alice).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden));

        let all = get_all_orders(&db, &admin).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].customer_email.as_deref(), Some("bob@shop.test"));
        assert_eq!(all[1].customer_email.as_deref(), Some("alice@shop.test"));
        assert!(all.iter().all(|o| o.items.len() == 1));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_order_status() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_admin(&db).await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let a = create_test_product(&db, "A", dec!(600), 1).await?;
        add_to_cart(&db, &alice, a.id, 1).await?;
        let placed = create_order(&db, &alice, checkout()).await?;

        // Non-admins cannot touch the status
        let result =
            update_order_status(&db, &alice, placed.order.id, OrderStatus::Delivered).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden));
        let stored = Order::find_by_id(placed.order.id).one(&db).await?.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);

        // Any transition is accepted, including out of a terminal state
        for status in [
            OrderStatus::Shipped,
            OrderStatus::Cancelled,
            OrderStatus::Delivered,
            OrderStatus::Confirmed,
        ] {
            update_order_status(&db, &admin, placed.order.id, status).await?;
            let stored = Order::find_by_id(placed.order.id).one(&db).await?.unwrap();
            assert_eq!(stored.status, status);
            assert_eq!(stored.total_price, placed.order.total_price);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_update_order_status_missing_order() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_admin(&db).await?;

        let result = update_order_status(&db, &admin, 42, OrderStatus::Confirmed).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::OrderNotFound { order_id: 42 }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_cart_survives_checkout() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_shopper(&db, "alice@shop.test").await?;
        let a = create_test_product(&db, "A", dec!(600), 1).await?;
        add_to_cart(&db, &alice, a.id, 1).await?;
        create_order(&db, &alice, checkout()).await?;

        // The cart row stays; only its lines go
        assert_eq!(Cart::find().all(&db).await?.len(), 1);
        assert!(CartItem::find().all(&db).await?.is_empty());
        Ok(())
    }
}
