//! Client management routes.
//!
//! Managers only see clients assigned to them, so unassigned registrations
//! are handled by admins.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use snacklane_core::bonus::expires_at;
use snacklane_core::{ClientId, ClientStatus, UserId, lenient_amount};

use super::{page_limit, page_skip};
use crate::db::{
    ClientFilter, ClientRepository, RepositoryError, SettingsRepository, StaffRepository,
    TermsUpdate, analytics,
};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Client, Staff};
use crate::services::notifications;
use crate::state::AppState;

/// Query parameters for the client listing.
#[derive(Debug, Deserialize)]
pub struct ClientsQuery {
    pub status: Option<ClientStatus>,
    pub search: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// A page of clients.
#[derive(Debug, Serialize)]
pub struct ClientsList {
    pub clients: Vec<Client>,
    pub total_count: i64,
}

/// Commercial terms; omitted fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct TermsRequest {
    #[serde(default, deserialize_with = "lenient_amount::deserialize_option")]
    pub discount_percent: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_amount::deserialize_option")]
    pub credit_limit: Option<Decimal>,
    pub payment_delay_days: Option<i32>,
    /// Absent leaves the manager unchanged; `null` unassigns.
    #[serde(default, deserialize_with = "present")]
    pub manager_id: Option<Option<UserId>>,
}

/// Distinguish an explicit `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    #[serde(deserialize_with = "lenient_amount::deserialize")]
    pub amount: Decimal,
}

impl TermsRequest {
    fn validate(&self) -> Result<()> {
        if self
            .discount_percent
            .is_some_and(|d| d < Decimal::ZERO || d > Decimal::ONE_HUNDRED)
        {
            return Err(AppError::BadRequest(
                "discount_percent must be between 0 and 100".to_string(),
            ));
        }
        if self.credit_limit.is_some_and(|c| c < Decimal::ZERO) {
            return Err(AppError::BadRequest(
                "credit_limit must not be negative".to_string(),
            ));
        }
        if self.payment_delay_days.is_some_and(|d| d < 0) {
            return Err(AppError::BadRequest(
                "payment_delay_days must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn client_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Client not found".to_string()),
        other => other.into(),
    }
}

/// Load a client the caller may act on.
async fn accessible_client(state: &AppState, staff: &Staff, id: ClientId) -> Result<Client> {
    ClientRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|client| staff.can_access(client.manager_id))
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))
}

pub async fn list(
    State(state): State<AppState>,
    staff: Staff,
    Query(query): Query<ClientsQuery>,
) -> Result<Json<ClientsList>> {
    let filter = ClientFilter {
        status: query.status,
        search: query.search,
        manager_id: staff.manager_scope(),
        skip: page_skip(query.skip)?,
        limit: page_limit(query.limit, 50)?,
    };
    let (clients, total_count) = ClientRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(ClientsList {
        clients,
        total_count,
    }))
}

pub async fn show(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<ClientId>,
) -> Result<Json<Client>> {
    Ok(Json(accessible_client(&state, &staff, id).await?))
}

/// Approve a pending registration and credit the welcome bonus.
pub async fn approve(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<ClientId>,
) -> Result<Json<Client>> {
    let client = accessible_client(&state, &staff, id).await?;
    if client.status != ClientStatus::Pending {
        return Err(AppError::BadRequest("Client is not pending".to_string()));
    }

    let settings = SettingsRepository::new(state.pool()).shop_settings().await?;
    let client = ClientRepository::new(state.pool())
        .approve(
            id,
            settings.welcome_bonus_amount,
            expires_at(Utc::now(), settings.bonus_expiry_months),
        )
        .await?
        .ok_or_else(|| AppError::BadRequest("Client is not pending".to_string()))?;

    tracing::info!(
        client_id = %client.id,
        staff_id = %staff.id,
        welcome_bonus = %settings.welcome_bonus_amount,
        "Client approved"
    );

    analytics::record(
        state.pool(),
        analytics::EVENT_CLIENT_APPROVED,
        Some(client.telegram_id),
        json!({ "client_id": client.id, "approved_by": staff.id }),
    )
    .await;

    let notify_state = state.clone();
    let notify_client = client.clone();
    tokio::spawn(async move {
        notifications::notify_client_approved(&notify_state, &notify_client).await;
    });

    Ok(Json(client))
}

pub async fn block(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<ClientId>,
) -> Result<Json<Client>> {
    accessible_client(&state, &staff, id).await?;
    let client = ClientRepository::new(state.pool()).block(id).await?;
    tracing::info!(client_id = %id, staff_id = %staff.id, "Client blocked");
    Ok(Json(client))
}

pub async fn unblock(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<ClientId>,
) -> Result<Json<Client>> {
    accessible_client(&state, &staff, id).await?;
    let client = ClientRepository::new(state.pool())
        .unblock(id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Client is not blocked".to_string()))?;
    tracing::info!(client_id = %id, staff_id = %staff.id, "Client unblocked");
    Ok(Json(client))
}

/// Change discount, credit terms or the assigned manager (admin only).
pub async fn update_terms(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ClientId>,
    Json(request): Json<TermsRequest>,
) -> Result<Json<Client>> {
    request.validate()?;

    if let Some(Some(manager_id)) = request.manager_id
        && StaffRepository::new(state.pool())
            .get_manager(manager_id)
            .await?
            .is_none()
    {
        return Err(AppError::BadRequest(
            "manager_id must refer to an active manager".to_string(),
        ));
    }

    let terms = TermsUpdate {
        discount_percent: request.discount_percent,
        credit_limit: request.credit_limit,
        payment_delay_days: request.payment_delay_days,
        manager_id: request.manager_id,
    };
    let client = ClientRepository::new(state.pool())
        .update_terms(id, &terms)
        .await
        .map_err(client_not_found)?;

    tracing::info!(client_id = %id, admin_id = %admin.id, "Client terms updated");
    Ok(Json(client))
}

/// Record a payment against the client's debt (admin only).
pub async fn register_payment(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ClientId>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<Client>> {
    if request.amount <= Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Amount must be greater than zero".to_string(),
        ));
    }

    let client = ClientRepository::new(state.pool())
        .register_payment(id, request.amount)
        .await
        .map_err(client_not_found)?;

    tracing::info!(
        client_id = %id,
        admin_id = %admin.id,
        amount = %request.amount,
        debt = %client.debt,
        "Payment registered"
    );
    Ok(Json(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_validation() {
        let ok = TermsRequest {
            discount_percent: Some(Decimal::from(100)),
            credit_limit: Some(Decimal::ZERO),
            payment_delay_days: Some(0),
            manager_id: None,
        };
        assert!(ok.validate().is_ok());

        let too_much = TermsRequest {
            discount_percent: Some(Decimal::from(101)),
            ..TermsRequest::default()
        };
        assert!(too_much.validate().is_err());

        let negative_delay = TermsRequest {
            payment_delay_days: Some(-1),
            ..TermsRequest::default()
        };
        assert!(negative_delay.validate().is_err());
    }

    #[test]
    fn test_terms_accept_numbers() {
        let request: TermsRequest =
            serde_json::from_str(r#"{"discount_percent": 5, "credit_limit": "250000"}"#)
                .unwrap_or_default();
        assert_eq!(request.discount_percent, Some(Decimal::from(5)));
        assert_eq!(request.credit_limit, Some(Decimal::from(250_000)));
        assert_eq!(request.manager_id, None);
    }

    #[test]
    fn test_terms_manager_assign_and_unassign() {
        let assign: TermsRequest = serde_json::from_str(r#"{"manager_id": 7}"#).unwrap();
        assert_eq!(assign.manager_id, Some(Some(UserId::new(7))));

        let unassign: TermsRequest = serde_json::from_str(r#"{"manager_id": null}"#).unwrap();
        assert_eq!(unassign.manager_id, Some(None));

        let untouched: TermsRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.manager_id, None);
    }
}
