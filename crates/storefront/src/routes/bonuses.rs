//! Bonus balance and ledger.

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{page_limit, page_skip};
use crate::db::BonusRepository;
use crate::error::Result;
use crate::middleware::ActiveClient;
use crate::models::BonusTransaction;
use crate::state::AppState;

/// Horizon for the "expiring soon" figure.
const EXPIRING_SOON_DAYS: i32 = 30;

/// Query parameters for the ledger.
#[derive(Debug, Deserialize)]
pub struct BonusQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Bonus balance with recent ledger entries.
#[derive(Debug, Serialize)]
pub struct BonusSummary {
    pub balance: Decimal,
    /// Earned bonuses expiring within 30 days, capped at the balance.
    pub expiring_soon: Decimal,
    pub max_use_percent: Decimal,
    pub transactions: Vec<BonusTransaction>,
}

/// The caller's bonus balance and ledger.
pub async fn show(
    State(state): State<AppState>,
    ActiveClient { client, .. }: ActiveClient,
    Query(query): Query<BonusQuery>,
) -> Result<Json<BonusSummary>> {
    let settings = state.shop_settings().await?;
    let bonuses = BonusRepository::new(state.pool());

    let transactions = bonuses
        .list(
            client.id,
            page_skip(query.skip)?,
            page_limit(query.limit, 50, 100)?,
        )
        .await?;
    let expiring = bonuses
        .earned_expiring_within(client.id, EXPIRING_SOON_DAYS)
        .await?;

    Ok(Json(BonusSummary {
        balance: client.bonus_balance,
        expiring_soon: expiring.min(client.bonus_balance),
        max_use_percent: settings.bonus_max_use_percent,
        transactions,
    }))
}
