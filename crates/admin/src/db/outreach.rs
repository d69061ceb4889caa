//! Outreach settings, message log and candidate snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use snacklane_core::{ClientId, OrderId, OutreachMessageId, TelegramId, lenient_amount};

use super::RepositoryError;
use crate::models::{ClientSnapshot, OutreachMessage, OutreachSettings, OutreachStats};

const SETTINGS_COLUMNS: &str = "enabled, send_hour, send_minute, send_days, \
     trigger_days_no_order, trigger_bonus_amount, trigger_bonus_expiry_days, \
     max_messages_per_day, min_days_between_messages, excluded_dates, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    enabled: bool,
    send_hour: i16,
    send_minute: i16,
    send_days: Vec<i16>,
    trigger_days_no_order: i32,
    trigger_bonus_amount: Decimal,
    trigger_bonus_expiry_days: i32,
    max_messages_per_day: i32,
    min_days_between_messages: i32,
    excluded_dates: Vec<NaiveDate>,
    updated_at: DateTime<Utc>,
}

impl From<SettingsRow> for OutreachSettings {
    fn from(row: SettingsRow) -> Self {
        Self {
            enabled: row.enabled,
            send_hour: row.send_hour,
            send_minute: row.send_minute,
            send_days: row.send_days,
            trigger_days_no_order: row.trigger_days_no_order,
            trigger_bonus_amount: row.trigger_bonus_amount,
            trigger_bonus_expiry_days: row.trigger_bonus_expiry_days,
            max_messages_per_day: row.max_messages_per_day,
            min_days_between_messages: row.min_days_between_messages,
            excluded_dates: row.excluded_dates,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: OutreachMessageId,
    client_id: ClientId,
    company_name: String,
    reason: String,
    message_text: String,
    sent_at: DateTime<Utc>,
    client_responded: bool,
    resulted_in_order: bool,
    order_id: Option<OrderId>,
}

impl From<MessageRow> for OutreachMessage {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            company_name: row.company_name,
            reason: row.reason,
            message_text: row.message_text,
            sent_at: row.sent_at,
            client_responded: row.client_responded,
            resulted_in_order: row.resulted_in_order,
            order_id: row.order_id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    client_id: ClientId,
    telegram_id: TelegramId,
    company_name: String,
    bonus_balance: Decimal,
    expiring_bonus: Decimal,
    last_order_at: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
    last_message_at: Option<DateTime<Utc>>,
}

impl From<SnapshotRow> for ClientSnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            client_id: row.client_id,
            telegram_id: row.telegram_id,
            company_name: row.company_name,
            bonus_balance: row.bonus_balance,
            expiring_bonus: row.expiring_bonus,
            last_order_at: row.last_order_at,
            approved_at: row.approved_at,
            last_message_at: row.last_message_at,
        }
    }
}

/// Partial settings update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutreachSettingsUpdate {
    pub enabled: Option<bool>,
    pub send_hour: Option<i16>,
    pub send_minute: Option<i16>,
    pub send_days: Option<Vec<i16>>,
    pub trigger_days_no_order: Option<i32>,
    #[serde(default, deserialize_with = "lenient_amount::deserialize_option")]
    pub trigger_bonus_amount: Option<Decimal>,
    pub trigger_bonus_expiry_days: Option<i32>,
    pub max_messages_per_day: Option<i32>,
    pub min_days_between_messages: Option<i32>,
    pub excluded_dates: Option<Vec<NaiveDate>>,
}

/// Repository for proactive outreach.
pub struct OutreachRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OutreachRepository<'a> {
    /// Create a new outreach repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The settings row, created with defaults if it was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn settings(&self) -> Result<OutreachSettings, RepositoryError> {
        let row = sqlx::query_as::<_, SettingsRow>(&format!(
            "INSERT INTO shop.outreach_settings (id) VALUES (TRUE) \
             ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id \
             RETURNING {SETTINGS_COLUMNS}"
        ))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial settings update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails (e.g. a value
    /// outside the column checks).
    pub async fn update_settings(
        &self,
        update: &OutreachSettingsUpdate,
    ) -> Result<OutreachSettings, RepositoryError> {
        // Make sure the row exists before updating it.
        self.settings().await?;

        let row = sqlx::query_as::<_, SettingsRow>(&format!(
            "UPDATE shop.outreach_settings SET \
                 enabled = COALESCE($1, enabled), \
                 send_hour = COALESCE($2, send_hour), \
                 send_minute = COALESCE($3, send_minute), \
                 send_days = COALESCE($4, send_days), \
                 trigger_days_no_order = COALESCE($5, trigger_days_no_order), \
                 trigger_bonus_amount = COALESCE($6, trigger_bonus_amount), \
                 trigger_bonus_expiry_days = COALESCE($7, trigger_bonus_expiry_days), \
                 max_messages_per_day = COALESCE($8, max_messages_per_day), \
                 min_days_between_messages = COALESCE($9, min_days_between_messages), \
                 excluded_dates = COALESCE($10, excluded_dates), \
                 updated_at = NOW() \
             WHERE id \
             RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(update.enabled)
        .bind(update.send_hour)
        .bind(update.send_minute)
        .bind(&update.send_days)
        .bind(update.trigger_days_no_order)
        .bind(update.trigger_bonus_amount)
        .bind(update.trigger_bonus_expiry_days)
        .bind(update.max_messages_per_day)
        .bind(update.min_days_between_messages)
        .bind(&update.excluded_dates)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Sent messages, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn messages(
        &self,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<OutreachMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT m.id, m.client_id, c.company_name, m.reason, m.message_text, m.sent_at, \
                    m.client_responded, m.resulted_in_order, m.order_id \
             FROM shop.outreach_messages m \
             JOIN shop.clients c ON c.id = m.client_id \
             ORDER BY m.sent_at DESC, m.id DESC \
             OFFSET $1 LIMIT $2",
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OutreachMessage::from).collect())
    }

    /// Effectiveness over the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self, days: i32) -> Result<OutreachStats, RepositoryError> {
        let (total, responded, resulted) = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT COUNT(*), \
                    COUNT(*) FILTER (WHERE client_responded), \
                    COUNT(*) FILTER (WHERE resulted_in_order) \
             FROM shop.outreach_messages \
             WHERE sent_at >= NOW() - make_interval(days => $1)",
        )
        .bind(days)
        .fetch_one(self.pool)
        .await?;

        Ok(OutreachStats::new(days, total, responded, resulted))
    }

    /// Messages sent since `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sent_since(&self, since: DateTime<Utc>) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.outreach_messages WHERE sent_at >= $1",
        )
        .bind(since)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Active clients with the figures candidate selection needs.
    ///
    /// `expiring_bonus` counts earnings expiring after `now` and within
    /// `expiry_window_days`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn snapshots(
        &self,
        now: DateTime<Utc>,
        expiry_window_days: i32,
    ) -> Result<Vec<ClientSnapshot>, RepositoryError> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            "SELECT c.id AS client_id, u.telegram_id, c.company_name, c.bonus_balance, \
                    COALESCE(( \
                        SELECT SUM(t.amount) FROM shop.bonus_transactions t \
                        WHERE t.client_id = c.id AND t.kind = 'earn' \
                          AND t.expires_at > $1 \
                          AND t.expires_at <= $1 + make_interval(days => $2) \
                    ), 0) AS expiring_bonus, \
                    (SELECT MAX(o.created_at) FROM shop.orders o \
                     WHERE o.client_id = c.id) AS last_order_at, \
                    c.approved_at, \
                    (SELECT MAX(m.sent_at) FROM shop.outreach_messages m \
                     WHERE m.client_id = c.id) AS last_message_at \
             FROM shop.clients c \
             JOIN shop.users u ON u.id = c.user_id \
             WHERE c.status = 'active' AND u.is_active \
             ORDER BY c.id",
        )
        .bind(now)
        .bind(expiry_window_days)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ClientSnapshot::from).collect())
    }

    /// Log a sent message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record_message(
        &self,
        client_id: ClientId,
        reason: &str,
        message_text: &str,
    ) -> Result<OutreachMessageId, RepositoryError> {
        let id = sqlx::query_scalar::<_, OutreachMessageId>(
            "INSERT INTO shop.outreach_messages (client_id, reason, message_text) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(client_id)
        .bind(reason)
        .bind(message_text)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }
}
