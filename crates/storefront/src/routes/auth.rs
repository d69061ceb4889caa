//! Registration and identity routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use snacklane_core::{BinIin, ClientStatus, PhoneNumber, UserRole};

use crate::db::{NewClient, UserRepository, analytics, outreach};
use crate::error::{AppError, Result};
use crate::middleware::{ActiveClient, TelegramAuth};
use crate::models::{Client, User};
use crate::services::notifications;
use crate::state::AppState;

const MAX_COMPANY_NAME_LEN: usize = 255;

/// Response of `GET /api/auth/check`.
#[derive(Debug, Serialize)]
pub struct AuthCheck {
    pub registered: bool,
    pub status: Option<ClientStatus>,
    pub role: Option<UserRole>,
}

/// Registration form.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub company_name: String,
    pub address: Option<String>,
    pub bin_iin: Option<String>,
    pub phone: Option<String>,
}

/// A newly registered user and their pending client profile.
#[derive(Debug, Serialize)]
pub struct Registration {
    pub user: User,
    pub client: Client,
}

/// Response of `GET /api/auth/me`.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub user: User,
    pub client: Client,
    pub manager_name: Option<String>,
}

fn optional_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validated pieces of a registration form.
struct ValidForm {
    company_name: String,
    address: Option<String>,
    bin_iin: Option<BinIin>,
    phone: Option<PhoneNumber>,
}

fn validate(form: RegisterRequest) -> Result<ValidForm> {
    let company_name = form.company_name.trim().to_string();
    if company_name.is_empty() {
        return Err(AppError::BadRequest("Company name is required".to_string()));
    }
    if company_name.chars().count() > MAX_COMPANY_NAME_LEN {
        return Err(AppError::BadRequest("Company name is too long".to_string()));
    }

    let bin_iin = optional_field(form.bin_iin)
        .map(|v| BinIin::parse(&v))
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("Invalid BIN/IIN: {e}")))?;
    let phone = optional_field(form.phone)
        .map(|v| PhoneNumber::parse(&v))
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("Invalid phone number: {e}")))?;

    Ok(ValidForm {
        company_name,
        address: optional_field(form.address),
        bin_iin,
        phone,
    })
}

/// Report whether the caller has registered.
///
/// The first check by an unknown user is recorded as a `start` event.
/// For registered clients, the call also counts as a response to recent
/// outreach messages.
pub async fn check(
    State(state): State<AppState>,
    TelegramAuth(telegram): TelegramAuth,
) -> Result<Json<AuthCheck>> {
    let users = UserRepository::new(state.pool());

    let Some(user) = users.get_by_telegram_id(telegram.id).await? else {
        analytics::record(
            state.pool(),
            analytics::EVENT_START,
            telegram.id,
            telegram.username.as_deref(),
            json!({ "first_name": telegram.first_name }),
        )
        .await;
        return Ok(Json(AuthCheck {
            registered: false,
            status: None,
            role: None,
        }));
    };

    users.touch_last_active(user.id).await?;
    let client = users.get_client(user.id).await?;

    if let Some(client) = &client
        && let Err(e) = outreach::mark_responded(state.pool(), client.id).await
    {
        warn!(client_id = %client.id, error = %e, "Failed to track outreach response");
    }

    Ok(Json(AuthCheck {
        registered: true,
        status: client.map(|c| c.status),
        role: Some(user.role),
    }))
}

/// Register the caller as a pending client.
pub async fn register(
    State(state): State<AppState>,
    TelegramAuth(telegram): TelegramAuth,
    Json(form): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Registration>)> {
    let form = validate(form)?;
    let settings = state.shop_settings().await?;

    let new = NewClient {
        telegram_id: telegram.id,
        username: telegram.username.clone(),
        company_name: form.company_name,
        address: form.address,
        bin_iin: form.bin_iin,
        phone: form.phone,
        credit_limit: settings.credit_limit_default,
        payment_delay_days: settings.payment_delay_default,
    };
    let (user, client) = UserRepository::new(state.pool()).register(&new).await?;

    info!(client_id = %client.id, "Client registered");
    analytics::record(
        state.pool(),
        analytics::EVENT_REGISTRATION_COMPLETED,
        telegram.id,
        telegram.username.as_deref(),
        json!({ "client_id": client.id, "company_name": client.company_name }),
    )
    .await;

    let notify_state = state.clone();
    let (notify_user, notify_client) = (user.clone(), client.clone());
    tokio::spawn(async move {
        notifications::notify_registration(&notify_state, &notify_user, &notify_client).await;
    });

    Ok((StatusCode::CREATED, Json(Registration { user, client })))
}

/// Profile of the calling client, with the assigned manager's name.
pub async fn me(
    State(state): State<AppState>,
    ActiveClient { user, client }: ActiveClient,
) -> Result<Json<Profile>> {
    let manager_name = match client.manager_id {
        Some(manager_id) => UserRepository::new(state.pool())
            .get_by_id(manager_id)
            .await?
            .map(|manager| manager.display_name()),
        None => None,
    };

    Ok(Json(Profile {
        user,
        client,
        manager_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(company: &str, bin: Option<&str>, phone: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            company_name: company.to_string(),
            address: Some("  ".to_string()),
            bin_iin: bin.map(String::from),
            phone: phone.map(String::from),
        }
    }

    #[test]
    fn test_validate_normalizes_fields() {
        let valid = validate(form(" ТОО Снэк ", Some("123456789012"), Some("8 (701) 234-56-78")))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(valid.company_name, "ТОО Снэк");
        assert_eq!(valid.address, None);
        assert_eq!(valid.phone.map(PhoneNumber::into_inner).as_deref(), Some("+77012345678"));
        assert!(valid.bin_iin.is_some());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(validate(form("  ", None, None)).is_err());
        assert!(validate(form("ТОО", Some("12345"), None)).is_err());
        assert!(validate(form("ТОО", None, Some("12345"))).is_err());
        assert!(validate(form(&"x".repeat(MAX_COMPANY_NAME_LEN + 1), None, None)).is_err());
    }

    #[test]
    fn test_blank_optional_fields_are_skipped() {
        let valid = validate(form("ТОО", Some(" "), Some(""))).unwrap_or_else(|e| panic!("{e}"));
        assert!(valid.bin_iin.is_none());
        assert!(valid.phone.is_none());
    }
}
