//! Database operations for the storefront.
//!
//! # Schema: `shop`
//!
//! Shared with the admin binary. The storefront reads the catalog and
//! settings, and owns the client-facing writes:
//!
//! - `users`, `clients` - registration
//! - `cart_items` - persistent per-user cart
//! - `orders`, `order_items`, `order_history` - order placement
//! - `bonus_transactions` - redemption on order placement
//! - `analytics_events` - funnel events
//! - `outreach_messages` - response/conversion tracking
//!
//! # Migrations
//!
//! Migrations are stored in `migrations/` at the workspace root and run via:
//! ```bash
//! cargo run -p snacklane-cli -- migrate
//! ```

pub mod analytics;
pub mod bonuses;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod outreach;
pub mod settings;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use bonuses::BonusRepository;
pub use cart::CartRepository;
pub use catalog::{CatalogRepository, ProductFilter};
pub use orders::OrderRepository;
pub use users::{NewClient, UserRepository};

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

    /// Constraint violation (e.g., duplicate Telegram id).
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
