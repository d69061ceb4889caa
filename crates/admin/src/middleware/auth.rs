//! Staff authentication extractors.
//!
//! The admin panel runs as a Telegram mini-app too, so staff authenticate
//! with the same signed `initData` as clients. The Telegram user must map to
//! an active `manager` or `admin`.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use secrecy::ExposeSecret;
use tracing::debug;

use snacklane_telegram::{init_data_from_header, verify_init_data};

use crate::db::StaffRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::Staff;
use crate::state::AppState;

impl FromRequestParts<AppState> for Staff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Authorization header missing".to_string()))?;

        let config = state.config();
        let init_data = verify_init_data(
            init_data_from_header(header),
            config.telegram.bot_token.expose_secret(),
            config.init_data_max_age,
            Utc::now(),
        )
        .map_err(|e| {
            debug!(error = %e, "initData rejected");
            AppError::Unauthorized("Invalid authorization data".to_string())
        })?;

        let candidate = StaffRepository::new(state.pool())
            .find_by_telegram_id(init_data.user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !candidate.is_active || !candidate.staff.role.is_staff() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        let staff = candidate.staff;
        set_sentry_user(staff.id.as_i32(), staff.username.as_deref());
        Ok(staff)
    }
}

/// Extractor for staff with the `admin` role.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAdmin(admin): RequireAdmin) -> String {
///     format!("Hello, {}!", admin.id)
/// }
/// ```
pub struct RequireAdmin(pub Staff);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let staff = Staff::from_request_parts(parts, state).await?;
        if !staff.is_admin() {
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }
        Ok(Self(staff))
    }
}
