//! Database operations for admin.
//!
//! # Schema: `shop`
//!
//! Shared with the storefront. The admin binary owns staff-side writes:
//!
//! - `products`, `categories` - catalog management
//! - `clients`, `users` - approval, blocking, commercial terms, payments
//! - `orders`, `order_history` - status changes
//! - `bonus_transactions` - accrual, cancellation refunds, expiry
//! - `system_settings` - runtime business settings
//! - `outreach_settings`, `outreach_messages` - proactive outreach
//!
//! # Migrations
//!
//! Migrations are stored in `migrations/` at the workspace root and run via:
//! ```bash
//! cargo run -p snacklane-cli -- migrate
//! ```

pub mod analytics;
pub mod bonuses;
pub mod catalog;
pub mod clients;
pub mod dashboard;
pub mod orders;
pub mod outreach;
pub mod settings;
pub mod staff;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::{CatalogRepository, NewProduct, ProductFilter, ProductUpdate};
pub use clients::{ClientFilter, ClientRepository, TermsUpdate};
pub use orders::{OrderFilter, OrderRepository};
pub use outreach::{OutreachRepository, OutreachSettingsUpdate};
pub use settings::SettingsRepository;
pub use staff::StaffRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate category name).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to `Conflict`, anything else to `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Trimmed, non-empty search term as an `ILIKE` pattern.
pub(crate) fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
