//! Fire-and-forget notification sink.
//!
//! Notifications are dispatched on their own task after the triggering operation has
//! committed. A failed delivery is logged and dropped; it never reaches the caller of
//! the operation that produced it.

use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A message addressed to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

impl Notification {
    /// Welcome message sent after account creation.
    #[must_use]
    pub fn welcome(email: &str) -> Self {
        Self {
            to: email.to_string(),
            subject: "Welcome to Fruveg Market".to_string(),
            body: format!(
                "Hello! Your Fruveg Market account for {email} has been created. \
                 Fresh fruit and vegetables are one click away."
            ),
        }
    }
}

/// Delivery backend for notifications (email provider, queue, log).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    async fn send(&self, notification: Notification) -> Result<()>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<()> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            "Notification: {}",
            notification.body
        );
        Ok(())
    }
}

/// Sends `notification` on a spawned task and logs the outcome.
///
/// The returned handle resolves once delivery has been attempted; callers are free to
/// drop it.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) -> JoinHandle<()> {
    tokio::spawn(async move {
        let to = notification.to.clone();
        match notifier.send(notification).await {
            Ok(()) => info!("Notification sent to {}", to),
            Err(e) => error!("Failed to send notification to {}: {}", to, e),
        }
    })
}
