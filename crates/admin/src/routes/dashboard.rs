//! Dashboard and funnel statistics.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{TimeDelta, Utc};
use serde::Deserialize;

use crate::db::dashboard::{self, Periods};
use crate::db::{SettingsRepository, analytics};
use crate::error::{AppError, Result};
use crate::models::{DashboardStats, FunnelStats, Staff};
use crate::services::scheduler::day_start;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FunnelQuery {
    pub days: Option<i32>,
}

/// Today's and the last seven days' figures. Managers see their own orders.
pub async fn stats(State(state): State<AppState>, staff: Staff) -> Result<Json<DashboardStats>> {
    let settings = SettingsRepository::new(state.pool()).shop_settings().await?;
    let today_start = day_start(Utc::now(), state.config().shop_offset);
    let periods = Periods {
        today_start,
        week_start: today_start - TimeDelta::days(6),
    };

    let stats = dashboard::stats(
        state.pool(),
        periods,
        staff.manager_scope(),
        settings.low_stock_threshold,
    )
    .await?;
    Ok(Json(stats))
}

/// Analytics event counts over `days` (1 to 90, default 7).
pub async fn funnel(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<FunnelQuery>,
) -> Result<Json<FunnelStats>> {
    let days = query.days.unwrap_or(7);
    if !(1..=90).contains(&days) {
        return Err(AppError::BadRequest(
            "days must be between 1 and 90".to_string(),
        ));
    }
    Ok(Json(analytics::funnel(state.pool(), days).await?))
}
