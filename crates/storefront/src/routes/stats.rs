//! Client purchase statistics.

use axum::{Json, extract::State};

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::ActiveClient;
use crate::models::ClientStats;
use crate::state::AppState;

/// Totals and top products over the caller's non-cancelled orders.
pub async fn show(
    State(state): State<AppState>,
    ActiveClient { client, .. }: ActiveClient,
) -> Result<Json<ClientStats>> {
    let stats = OrderRepository::new(state.pool()).stats(client.id).await?;
    Ok(Json(stats))
}
