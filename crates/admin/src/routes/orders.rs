//! Order management routes.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use snacklane_core::{ClientId, OrderId, OrderStatus};

use super::{page_limit, page_skip};
use crate::db::{OrderFilter, OrderRepository};
use crate::error::{AppError, Result};
use crate::models::{Order, Staff};
use crate::services::order_status;
use crate::state::AppState;

/// Query parameters for the order listing.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
    pub client_id: Option<ClientId>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// A page of orders.
#[derive(Debug, Serialize)]
pub struct OrdersList {
    pub orders: Vec<Order>,
    pub total_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub comment: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    staff: Staff,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<OrdersList>> {
    if let (Some(from), Some(to)) = (query.date_from, query.date_to)
        && from > to
    {
        return Err(AppError::BadRequest(
            "date_from must not be after date_to".to_string(),
        ));
    }

    let filter = OrderFilter {
        status: query.status,
        client_id: query.client_id,
        date_from: query.date_from,
        date_to: query.date_to,
        manager_id: staff.manager_scope(),
        skip: page_skip(query.skip)?,
        limit: page_limit(query.limit, 50)?,
    };
    let (orders, total_count) = OrderRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(OrdersList {
        orders,
        total_count,
    }))
}

/// An order with items and status history.
pub async fn show(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|order| staff.can_access(order.manager_id))
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    Ok(Json(order))
}

/// Move an order through its lifecycle.
pub async fn update_status(
    State(state): State<AppState>,
    staff: Staff,
    Path(id): Path<OrderId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let order =
        order_status::change_status(&state, &staff, id, update.status, update.comment).await?;
    Ok(Json(order))
}
