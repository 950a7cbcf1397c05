//! Administrator provisioning from environment variables.
//!
//! `STOREFRONT_ADMIN_EMAILS` holds a comma-separated list of emails. Accounts created
//! with one of these emails receive the administrative capability.

use std::collections::HashSet;

/// Environment variable listing administrator emails.
pub const ADMIN_EMAILS_VAR: &str = "STOREFRONT_ADMIN_EMAILS";

/// Parses a comma-separated email list into a normalised set.
#[must_use]
pub fn parse_admin_emails(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}

/// Reads the administrator emails from the environment.
///
/// Returns an empty set when the variable is unset.
#[must_use]
pub fn get_admin_emails() -> HashSet<String> {
    std::env::var(ADMIN_EMAILS_VAR)
        .map(|raw| parse_admin_emails(&raw))
        .unwrap_or_default()
}
