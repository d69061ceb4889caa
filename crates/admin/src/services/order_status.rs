//! Order status changes.
//!
//! One transaction per change: the order and client rows are locked, the
//! transition is checked, and delivery accrual or cancellation reversal is
//! applied before commit. The client is notified afterwards.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use snacklane_core::bonus::{delivery_bonus, expires_at};
use snacklane_core::{OrderId, OrderStatus};

use crate::db::orders as order_db;
use crate::db::{OrderRepository, RepositoryError, SettingsRepository, bonuses, clients};
use crate::error::AppError;
use crate::models::{Order, Staff};
use crate::services::notifications;
use crate::state::AppState;

/// History comment used when staff give none.
#[must_use]
pub fn default_comment(from: OrderStatus, to: OrderStatus) -> String {
    format!("Status changed: {from} → {to}")
}

/// Move an order to `next`.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the order does not exist or belongs to
/// another manager, `AppError::Transition` if the move is not allowed, and
/// `AppError::Database` on storage failures.
#[instrument(skip(state, staff, comment), fields(staff_id = %staff.id))]
pub async fn change_status(
    state: &AppState,
    staff: &Staff,
    order_id: OrderId,
    next: OrderStatus,
    comment: Option<String>,
) -> Result<Order, AppError> {
    let settings = SettingsRepository::new(state.pool()).shop_settings().await?;
    let not_found = || AppError::NotFound("Order not found".to_string());

    let mut tx = state.pool().begin().await.map_err(RepositoryError::from)?;

    let order = match order_db::lock_order(&mut tx, order_id).await {
        Ok(order) => order,
        Err(RepositoryError::NotFound) => return Err(not_found()),
        Err(e) => return Err(e.into()),
    };
    if !staff.can_access(order.manager_id) {
        return Err(not_found());
    }
    // Client before products, the same order placement takes its locks in.
    bonuses::lock_balance(&mut tx, order.client_id).await?;

    let previous = order.status;
    previous.transition_to(next)?;

    order_db::set_status(&mut tx, order.id, next).await?;
    let comment = comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default_comment(previous, next));
    order_db::add_history(&mut tx, order.id, next, staff.id, &comment).await?;

    let mut earned = Decimal::ZERO;
    match next {
        OrderStatus::Delivered => {
            earned = delivery_bonus(order.net_amount(), settings.bonus_percent_default);
            if earned > Decimal::ZERO {
                let now = Utc::now();
                bonuses::credit(
                    &mut tx,
                    order.client_id,
                    earned,
                    Some(order.id),
                    &format!("Bonus for order {}", order.order_number),
                    Some(expires_at(now, settings.bonus_expiry_months)),
                )
                .await?;
            }
        }
        OrderStatus::Cancelled => {
            order_db::restore_stock(&mut tx, &order.items).await?;
            if order.bonus_used > Decimal::ZERO {
                bonuses::refund(
                    &mut tx,
                    order.client_id,
                    order.bonus_used,
                    order.id,
                    &format!("Refund for cancelled order {}", order.order_number),
                )
                .await?;
            }
            order_db::reduce_debt(&mut tx, order.client_id, order.final_total).await?;
        }
        _ => {}
    }

    let client = clients::fetch_client(&mut tx, order.client_id).await?;
    tx.commit().await.map_err(RepositoryError::from)?;

    info!(
        order_number = %order.order_number,
        from = %previous,
        to = %next,
        bonus_earned = %earned,
        "Order status changed"
    );

    let updated = OrderRepository::new(state.pool())
        .get(order.id)
        .await?
        .ok_or_else(not_found)?;

    let notify_state = state.clone();
    let notify_order = updated.clone();
    tokio::spawn(async move {
        notifications::notify_status_changed(
            &notify_state,
            client.telegram_id,
            &notify_order,
            next,
            earned,
        )
        .await;
    });

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_comment() {
        assert_eq!(
            default_comment(OrderStatus::New, OrderStatus::Confirmed),
            "Status changed: new → confirmed"
        );
    }
}
