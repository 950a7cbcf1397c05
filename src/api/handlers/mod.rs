//! Route handlers, one module per resource.

/// Shopping cart routes
pub mod cart;
/// Checkout, order history and order administration
pub mod orders;
/// Catalog browsing and product administration
pub mod products;
/// Account signup
pub mod users;
