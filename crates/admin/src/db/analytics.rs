//! Funnel analytics: staff-side events and per-period counts.

use sqlx::PgPool;
use tracing::warn;

use snacklane_core::TelegramId;

use super::RepositoryError;
use crate::models::{EventCount, FunnelStats};

/// A pending client was approved by staff.
pub const EVENT_CLIENT_APPROVED: &str = "client_approved";

#[derive(Debug, sqlx::FromRow)]
struct EventCountRow {
    event_type: String,
    count: i64,
}

/// Insert an analytics event, logging instead of failing.
pub async fn record(
    pool: &PgPool,
    event_type: &str,
    telegram_id: Option<TelegramId>,
    metadata: serde_json::Value,
) {
    let result = sqlx::query(
        "INSERT INTO shop.analytics_events (event_type, telegram_id, metadata) \
         VALUES ($1, $2, $3)",
    )
    .bind(event_type)
    .bind(telegram_id)
    .bind(metadata)
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!(event_type, error = %e, "Failed to record analytics event");
    }
}

/// Event counts over the last `days` days, most frequent first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn funnel(pool: &PgPool, days: i32) -> Result<FunnelStats, RepositoryError> {
    let rows = sqlx::query_as::<_, EventCountRow>(
        "SELECT event_type, COUNT(*) AS count FROM shop.analytics_events \
         WHERE created_at >= NOW() - make_interval(days => $1) \
         GROUP BY event_type \
         ORDER BY count DESC, event_type",
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    Ok(FunnelStats {
        period_days: days,
        events: rows
            .into_iter()
            .map(|row| EventCount {
                event_type: row.event_type,
                count: row.count,
            })
            .collect(),
    })
}
