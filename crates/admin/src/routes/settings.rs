//! System settings routes (admin only).

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use snacklane_core::settings::definition;

use crate::db::SettingsRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::SystemSetting;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SettingUpdate {
    pub value: String,
}

pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<SystemSetting>>> {
    Ok(Json(SettingsRepository::new(state.pool()).list().await?))
}

/// Update one setting. The value must parse as the setting's type.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(key): Path<String>,
    Json(update): Json<SettingUpdate>,
) -> Result<Json<SystemSetting>> {
    let def = definition(&key).ok_or_else(|| AppError::NotFound("Setting not found".to_string()))?;
    let value = update.value.trim();
    def.value_type
        .validate(value)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let setting = SettingsRepository::new(state.pool())
        .upsert(def.key, value, def.value_type, Some(def.description))
        .await?;

    tracing::info!(key = %def.key, value = %setting.value, admin_id = %admin.id, "Setting updated");
    Ok(Json(setting))
}
