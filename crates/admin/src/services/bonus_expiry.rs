//! Bonus expiry job.
//!
//! Runs before each outreach slot and on demand with the manual run. Each
//! client is handled in its own transaction so one failure does not block
//! the rest.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

use snacklane_core::ClientId;
use snacklane_core::bonus::amount_to_expire;

use crate::db::{RepositoryError, bonuses};
use crate::state::AppState;

/// Outcome of one expiry run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ExpiryReport {
    pub clients_checked: usize,
    pub clients_expired: usize,
    pub total_expired: Decimal,
}

async fn expire_client(
    state: &AppState,
    client_id: ClientId,
    now: DateTime<Utc>,
) -> Result<Decimal, RepositoryError> {
    let mut tx = state.pool().begin().await?;

    let balance = bonuses::lock_balance(&mut tx, client_id).await?;
    let totals = bonuses::ledger_totals(&mut tx, client_id, now).await?;
    let amount = amount_to_expire(&totals, balance);

    if amount > Decimal::ZERO {
        bonuses::expire(&mut tx, client_id, amount).await?;
    }
    tx.commit().await?;
    Ok(amount)
}

/// Write off expired bonuses for every client that has any.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the client list cannot be read.
/// Per-client failures are logged and skipped.
#[instrument(skip(state))]
pub async fn run(state: &AppState, now: DateTime<Utc>) -> Result<ExpiryReport, RepositoryError> {
    let client_ids = bonuses::clients_with_expired_earnings(state.pool(), now).await?;
    let mut report = ExpiryReport {
        clients_checked: client_ids.len(),
        ..ExpiryReport::default()
    };

    for client_id in client_ids {
        match expire_client(state, client_id, now).await {
            Ok(amount) if amount > Decimal::ZERO => {
                report.clients_expired += 1;
                report.total_expired += amount;
            }
            Ok(_) => {}
            Err(e) => warn!(client_id = %client_id, error = %e, "Bonus expiry failed"),
        }
    }

    info!(
        checked = report.clients_checked,
        expired = report.clients_expired,
        total = %report.total_expired,
        "Bonus expiry finished"
    );
    Ok(report)
}
