//! Account and caller identity logic.
//!
//! The storefront never authenticates anyone itself. A [`Caller`] is the identity the
//! auth provider vouched for, resolved against the local users table once per request.
//! Every cart and order operation takes one.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
    notify::{self, Notification, Notifier},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, SqlErr};
use std::{collections::HashSet, sync::Arc};
use tracing::{info, instrument, warn};

/// Identity attached to a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// Local user id
    pub user_id: i64,
    /// Whether the user holds the administrative capability
    pub is_admin: bool,
}

impl Caller {
    /// Creates a caller identity.
    #[must_use]
    pub const fn new(user_id: i64, is_admin: bool) -> Self {
        Self { user_id, is_admin }
    }

    /// Fails with [`Error::Forbidden`] unless the caller is an administrator.
    ///
    /// # Errors
    /// Returns [`Error::Forbidden`] for non-administrators.
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }
}

impl From<&user::Model> for Caller {
    fn from(user: &user::Model) -> Self {
        Self::new(user.id, user.is_admin)
    }
}

/// Looks up the caller for a user id vouched for by the auth provider.
///
/// Returns `None` for ids with no local account.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn resolve_caller(db: &DatabaseConnection, user_id: i64) -> Result<Option<Caller>> {
    Ok(User::find_by_id(user_id)
        .one(db)
        .await?
        .map(|user| Caller::from(&user)))
}

fn normalise_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if valid {
        Ok(email)
    } else {
        Err(Error::InvalidEmail { email })
    }
}

/// Creates the local account record for a newly signed-up user.
///
/// The email is trimmed and lowercased. Emails listed in `admin_emails` are granted the
/// administrative capability.
///
/// # Errors
/// Returns an error if:
/// - The email is empty or has no `local@domain` shape
/// - An account with this email already exists
/// - The database insert fails
pub async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    admin_emails: &HashSet<String>,
) -> Result<user::Model> {
    let email = normalise_email(email)?;
    let is_admin = admin_emails.contains(&email);

    let user = user::ActiveModel {
        email: Set(email.clone()),
        is_admin: Set(is_admin),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match user.insert(db).await {
        Ok(model) => Ok(model),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(Error::Conflict {
                message: format!("an account for {email} already exists"),
            })
        }
        Err(err) => Err(err.into()),
    }
}

/// Creates an account and then sends the welcome notification in the background.
///
/// The notification is dispatched only after the insert has succeeded and its outcome
/// never affects the result.
///
/// # Errors
/// Same as [`create_user`]. Notification failures are only logged.
#[instrument(skip(db, admin_emails, notifier))]
pub async fn register_user(
    db: &DatabaseConnection,
    email: &str,
    admin_emails: &HashSet<String>,
    notifier: Arc<dyn Notifier>,
) -> Result<user::Model> {
    let user = create_user(db, email, admin_emails)
        .await
        .inspect_err(|e| warn!("Account creation rejected: {}", e))?;
    info!(user_id = user.id, is_admin = user.is_admin, "Account created");

    notify::dispatch(notifier, Notification::welcome(&user.email));
    Ok(user)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{FailingNotifier, RecordingNotifier, setup_test_db};

    #[tokio::test]
    async fn test_create_user_normalises_email() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_user(&db, "  Alice@Shop.Test ", &HashSet::new()).await?;
        assert_eq!(user.email, "alice@shop.test");
        assert!(!user.is_admin);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_grants_admin_from_list() -> Result<()> {
        let db = setup_test_db().await?;
        let admins: HashSet<String> = ["boss@shop.test".to_string()].into();
        let user = create_user(&db, "Boss@shop.test", &admins).await?;
        assert!(user.is_admin);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicates() -> Result<()> {
        let db = setup_test_db().await?;
        create_user(&db, "alice@shop.test", &HashSet::new()).await?;
        let result = create_user(&db, "ALICE@shop.test", &HashSet::new()).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_rejects_malformed_email() -> Result<()> {
        let db = setup_test_db().await?;
        for bad in ["", "   ", "no-at-sign", "@shop.test", "alice@"] {
            let result = create_user(&db, bad, &HashSet::new()).await;
            assert!(
                matches!(result, Err(Error::InvalidEmail { .. })),
                "{bad:?} should be rejected"
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_caller() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_user(&db, "alice@shop.test", &HashSet::new()).await?;

        let caller = resolve_caller(&db, user.id).await?.unwrap();
        assert_eq!(caller, Caller::new(user.id, false));

        assert!(resolve_caller(&db, user.id + 100).await?.is_none());
        Ok(())
    }

    #[test]
    fn test_require_admin() {
        assert!(Caller::new(1, true).require_admin().is_ok());
        assert!(matches!(
            Caller::new(1, false).require_admin(),
            Err(Error::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_register_user_sends_welcome() -> Result<()> {
        let db = setup_test_db().await?;
        let recorder = Arc::new(RecordingNotifier::default());

        let notifier = Arc::clone(&recorder) as Arc<dyn Notifier>;
        let user = register_user(&db, "new@shop.test", &HashSet::new(), notifier).await?;
        assert_eq!(user.email, "new@shop.test");

        // Give the spawned delivery task a chance to run
        for _ in 0..10 {
            if !recorder.sent().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let sent = recorder.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "new@shop.test");
        Ok(())
    }

    #[tokio::test]
    async fn test_register_user_ignores_notification_failure() -> Result<()> {
        let db = setup_test_db().await?;
        let user = register_user(&db, "new@shop.test", &HashSet::new(), Arc::new(FailingNotifier))
            .await?;
        assert_eq!(user.email, "new@shop.test");
        Ok(())
    }
}
