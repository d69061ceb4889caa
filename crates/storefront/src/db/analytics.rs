//! Funnel analytics events.

use sqlx::PgPool;
use tracing::warn;

use snacklane_core::TelegramId;

use super::RepositoryError;

/// First identity check of the mini-app by an unregistered user.
pub const EVENT_START: &str = "start";
/// Registration form submitted.
pub const EVENT_REGISTRATION_COMPLETED: &str = "registration_completed";

/// Insert an analytics event.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn log_event(
    pool: &PgPool,
    event_type: &str,
    telegram_id: Option<TelegramId>,
    username: Option<&str>,
    metadata: serde_json::Value,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO shop.analytics_events (event_type, telegram_id, username, metadata) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(event_type)
    .bind(telegram_id)
    .bind(username)
    .bind(metadata)
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert an analytics event, logging instead of failing.
pub async fn record(
    pool: &PgPool,
    event_type: &str,
    telegram_id: TelegramId,
    username: Option<&str>,
    metadata: serde_json::Value,
) {
    if let Err(e) = log_event(pool, event_type, Some(telegram_id), username, metadata).await {
        warn!(event_type, error = %e, "Failed to record analytics event");
    }
}
