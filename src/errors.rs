//! Unified error type for the storefront.
//!
//! Every operation returns [`Result`]. Business-rule failures are struct variants carrying
//! the values that triggered them, so callers can render a precise message without parsing
//! text. [`Error::kind`] collapses the variants into the closed set of failure kinds that
//! transports map to their own status codes.

use rust_decimal::Decimal;
use thiserror::Error;

/// All failures the storefront can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying storage failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure (socket binding, file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No identity is attached to the request
    #[error("Authentication required")]
    Unauthenticated,

    /// Identity present but lacks the administrative capability
    #[error("Administrator privileges required")]
    Forbidden,

    /// Product id does not resolve to a product
    #[error("Product not found: {product_id}")]
    ProductNotFound {
        /// Requested product id
        product_id: i64,
    },

    /// Cart item is absent or belongs to another user's cart
    #[error("Cart item not found: {cart_item_id}")]
    CartItemNotFound {
        /// Requested cart item id
        cart_item_id: i64,
    },

    /// Order id does not resolve to an order
    #[error("Order not found: {order_id}")]
    OrderNotFound {
        /// Requested order id
        order_id: i64,
    },

    /// Product exists but is flagged unavailable
    #[error("Product '{name}' is currently unavailable")]
    ProductUnavailable {
        /// Product id
        product_id: i64,
        /// Product name for display
        name: String,
    },

    /// Quantity below one, or a merged line quantity beyond `i32::MAX`
    #[error("Quantity must be between 1 and {max}, got {quantity}", max = i32::MAX)]
    InvalidQuantity {
        /// Rejected quantity, after merging with the existing line if any
        quantity: i64,
    },

    /// Quantity below the product's minimum order quantity
    #[error("Minimum order quantity is {minimum} {unit}, got {requested}")]
    BelowMinimum {
        /// Product's minimum order quantity
        minimum: i32,
        /// Rejected quantity
        requested: i32,
        /// Product unit label
        unit: String,
    },

    /// Checkout attempted with no cart or no items
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart total below the storefront-wide minimum order value
    #[error("Minimum order value is {minimum}, cart total is {total}")]
    BelowMinimumOrderValue {
        /// Cart total at current prices
        total: Decimal,
        /// Required minimum
        minimum: Decimal,
    },

    /// Concurrent modification or unique-constraint conflict
    #[error("Conflict: {message}")]
    Conflict {
        /// What conflicted
        message: String,
    },

    /// Product fields failed validation
    #[error("Invalid product: {message}")]
    InvalidProduct {
        /// Which rule failed
        message: String,
    },

    /// Email failed validation
    #[error("Invalid email address: '{email}'")]
    InvalidEmail {
        /// Rejected input
        email: String,
    },
}

/// Closed set of failure kinds, independent of any transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No identity
    Unauthenticated,
    /// Insufficient privilege
    Forbidden,
    /// Entity absent or not owned by the caller
    NotFound,
    /// Product not purchasable
    Unavailable,
    /// Quantity below one or beyond the line limit
    InvalidQuantity,
    /// Quantity below the product minimum
    BelowMinimum,
    /// Nothing to check out
    EmptyCart,
    /// Cart total below the order minimum
    BelowMinimumOrderValue,
    /// Uniqueness or concurrency conflict
    Conflict,
    /// Malformed input outside the cart/order rules
    Invalid,
    /// Infrastructure failure
    Internal,
}

impl ErrorKind {
    /// Stable identifier used in serialized error bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::InvalidQuantity => "invalid_quantity",
            Self::BelowMinimum => "below_minimum",
            Self::EmptyCart => "empty_cart",
            Self::BelowMinimumOrderValue => "below_minimum_order_value",
            Self::Conflict => "conflict",
            Self::Invalid => "invalid",
            Self::Internal => "internal",
        }
    }
}

impl Error {
    /// Classifies this error into its failure kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::ProductNotFound { .. }
            | Self::CartItemNotFound { .. }
            | Self::OrderNotFound { .. } => ErrorKind::NotFound,
            Self::ProductUnavailable { .. } => ErrorKind::Unavailable,
            Self::InvalidQuantity { .. } => ErrorKind::InvalidQuantity,
            Self::BelowMinimum { .. } => ErrorKind::BelowMinimum,
            Self::EmptyCart => ErrorKind::EmptyCart,
            Self::BelowMinimumOrderValue { .. } => ErrorKind::BelowMinimumOrderValue,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InvalidProduct { .. } | Self::InvalidEmail { .. } => ErrorKind::Invalid,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
