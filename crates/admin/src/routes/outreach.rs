//! Proactive outreach routes.

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{page_limit, page_skip};
use crate::db::{OutreachRepository, OutreachSettingsUpdate};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{OutreachMessage, OutreachSettings, OutreachStats, Staff};
use crate::services::scheduler::{self, RunReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub days: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

fn bad(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

fn validate(update: &OutreachSettingsUpdate) -> Result<()> {
    if update.send_hour.is_some_and(|h| !(0..=23).contains(&h)) {
        return Err(bad("send_hour must be between 0 and 23"));
    }
    if update.send_minute.is_some_and(|m| !(0..=59).contains(&m)) {
        return Err(bad("send_minute must be between 0 and 59"));
    }
    if update
        .send_days
        .as_ref()
        .is_some_and(|days| days.iter().any(|d| !(1..=7).contains(d)))
    {
        return Err(bad("send_days must be ISO weekdays (1 = Monday, 7 = Sunday)"));
    }
    let counters = [
        update.trigger_days_no_order,
        update.trigger_bonus_expiry_days,
        update.max_messages_per_day,
        update.min_days_between_messages,
    ];
    if counters.iter().flatten().any(|v| *v < 0) {
        return Err(bad("Day and message counts must not be negative"));
    }
    if update.trigger_bonus_amount.is_some_and(|a| a < Decimal::ZERO) {
        return Err(bad("trigger_bonus_amount must not be negative"));
    }
    Ok(())
}

/// Sent, responded and converted messages over `days` (1 to 90, default 7).
pub async fn stats(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<StatsQuery>,
) -> Result<Json<OutreachStats>> {
    let days = query.days.unwrap_or(7);
    if !(1..=90).contains(&days) {
        return Err(bad("days must be between 1 and 90"));
    }
    Ok(Json(OutreachRepository::new(state.pool()).stats(days).await?))
}

pub async fn messages(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<OutreachMessage>>> {
    let messages = OutreachRepository::new(state.pool())
        .messages(page_skip(query.skip)?, page_limit(query.limit, 50)?)
        .await?;
    Ok(Json(messages))
}

pub async fn get_settings(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<OutreachSettings>> {
    Ok(Json(OutreachRepository::new(state.pool()).settings().await?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(update): Json<OutreachSettingsUpdate>,
) -> Result<Json<OutreachSettings>> {
    validate(&update)?;
    let settings = OutreachRepository::new(state.pool())
        .update_settings(&update)
        .await?;
    tracing::info!(admin_id = %admin.id, enabled = settings.enabled, "Outreach settings updated");
    Ok(Json(settings))
}

/// Run bonus expiry and outreach now, regardless of schedule and the
/// `enabled` flag. Daily limits still apply.
pub async fn run(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<RunReport>> {
    tracing::info!(admin_id = %admin.id, "Manual outreach run");
    Ok(Json(scheduler::run_once(&state, true).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_settings_update() {
        assert!(validate(&OutreachSettingsUpdate::default()).is_ok());

        let ok = OutreachSettingsUpdate {
            send_hour: Some(23),
            send_minute: Some(0),
            send_days: Some(vec![1, 7]),
            ..OutreachSettingsUpdate::default()
        };
        assert!(validate(&ok).is_ok());

        let late = OutreachSettingsUpdate {
            send_hour: Some(24),
            ..OutreachSettingsUpdate::default()
        };
        assert!(validate(&late).is_err());

        let sunday_zero = OutreachSettingsUpdate {
            send_days: Some(vec![0]),
            ..OutreachSettingsUpdate::default()
        };
        assert!(validate(&sunday_zero).is_err());

        let negative = OutreachSettingsUpdate {
            max_messages_per_day: Some(-1),
            ..OutreachSettingsUpdate::default()
        };
        assert!(validate(&negative).is_err());
    }
}
