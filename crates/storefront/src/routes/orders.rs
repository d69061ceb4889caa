//! Order routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use snacklane_core::{OrderId, OrderStatus};

use super::{page_limit, page_skip};
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::ActiveClient;
use crate::models::Order;
use crate::services::ordering::{self, OrderRequest};
use crate::state::AppState;

/// Query parameters for the order history.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// A page of orders.
#[derive(Debug, Serialize)]
pub struct OrdersList {
    pub orders: Vec<Order>,
    pub total_count: i64,
}

/// The caller's orders, newest first.
pub async fn list(
    State(state): State<AppState>,
    ActiveClient { client, .. }: ActiveClient,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<OrdersList>> {
    let (orders, total_count) = OrderRepository::new(state.pool())
        .list(
            client.id,
            query.status,
            page_skip(query.skip)?,
            page_limit(query.limit, 20, 100)?,
        )
        .await?;
    Ok(Json(OrdersList {
        orders,
        total_count,
    }))
}

/// Place an order from the request items or from the cart.
pub async fn create(
    State(state): State<AppState>,
    ActiveClient { user, client }: ActiveClient,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = ordering::place_order(&state, &user, client.id, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// One of the caller's orders.
pub async fn show(
    State(state): State<AppState>,
    ActiveClient { client, .. }: ActiveClient,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(client.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    Ok(Json(order))
}

/// Order the items of a previous order again.
pub async fn repeat(
    State(state): State<AppState>,
    ActiveClient { user, client }: ActiveClient,
    Path(id): Path<OrderId>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = ordering::repeat_order(&state, &user, client.id, id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
