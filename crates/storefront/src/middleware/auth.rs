//! Telegram mini-app authentication extractors.
//!
//! Every API call carries the mini-app launch parameters in
//! `Authorization: tma <initData>` (the bare `initData` string is accepted
//! too). The signature is checked against the bot token on each request;
//! there are no sessions.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use secrecy::ExposeSecret;
use tracing::debug;

use snacklane_core::{ClientStatus, UserRole};
use snacklane_telegram::{WebAppUser, init_data_from_header, verify_init_data};

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::{Client, User};
use crate::state::AppState;

/// Extractor for a verified Telegram identity.
///
/// Does not require the user to be registered.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(TelegramAuth(tg): TelegramAuth) -> String {
///     format!("Hello, {}!", tg.id)
/// }
/// ```
pub struct TelegramAuth(pub WebAppUser);

impl FromRequestParts<AppState> for TelegramAuth {
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

        set_sentry_user(&init_data.user.id, init_data.user.username.as_deref());
        Ok(Self(init_data.user))
    }
}

/// Extractor for a registered, non-blocked user.
///
/// Rejects with 404 when the Telegram user has not registered and 403 when
/// the user is blocked.
pub struct CurrentUser {
    pub telegram: WebAppUser,
    pub user: User,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TelegramAuth(telegram) = TelegramAuth::from_request_parts(parts, state).await?;

        let user = UserRepository::new(state.pool())
            .get_by_telegram_id(telegram.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("User is blocked".to_string()));
        }

        Ok(Self { telegram, user })
    }
}

/// Extractor for a client whose account has been approved.
pub struct ActiveClient {
    pub user: User,
    pub client: Client,
}

impl FromRequestParts<AppState> for ActiveClient {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser { user, .. } = CurrentUser::from_request_parts(parts, state).await?;

        if user.role != UserRole::Client {
            return Err(AppError::Forbidden("Only for clients".to_string()));
        }

        let client = UserRepository::new(state.pool())
            .get_client(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client profile not found".to_string()))?;

        if client.status != ClientStatus::Active {
            return Err(AppError::Forbidden(format!(
                "Client status: {}",
                client.status
            )));
        }

        Ok(Self { user, client })
    }
}
