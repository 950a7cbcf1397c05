//! Core business logic - framework-agnostic catalog, cart, order and account operations.

/// Cart mutations and the cart view
pub mod cart;
/// Catalog reads and product administration
pub mod catalog;
/// Checkout, order listings and status management
pub mod order;
/// Accounts and per-request caller identity
pub mod user;
