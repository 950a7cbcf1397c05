//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        catalog::{self, NewProduct},
        user::{self, Caller},
    },
    entities,
    errors::{Error, Result},
    notify::{Notification, Notifier},
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::collections::HashSet;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds product fields with sensible defaults.
///
/// # Defaults
/// * `unit`: "kg"
/// * `category`: "vegetables"
/// * `stock`: 100
pub fn new_product(name: &str, price: Decimal, min_order_quantity: i32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: None,
        price,
        unit: "kg".to_string(),
        category: "vegetables".to_string(),
        image_url: None,
        stock: 100,
        min_order_quantity,
    }
}

/// Inserts an available test product.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
    min_order_quantity: i32,
) -> Result<entities::product::Model> {
    catalog::insert_product(db, new_product(name, price, min_order_quantity)).await
}

/// Creates a regular account and returns its caller identity.
pub async fn create_shopper(db: &DatabaseConnection, email: &str) -> Result<Caller> {
    let user = user::create_user(db, email, &HashSet::new()).await?;
    Ok(Caller::from(&user))
}

/// Creates an administrator account and returns its caller identity.
pub async fn create_admin(db: &DatabaseConnection) -> Result<Caller> {
    let admins: HashSet<String> = ["admin@shop.test".to_string()].into();
    let user = user::create_user(db, "admin@shop.test", &admins).await?;
    Ok(Caller::from(&user))
}

/// Notifier that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Snapshot of everything delivered so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<()> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Notifier whose deliveries always fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _notification: Notification) -> Result<()> {
        Err(Error::Io(std::io::Error::other("mail relay unreachable")))
    }
}
