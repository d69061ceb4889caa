//! Dashboard aggregates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use snacklane_core::UserId;

use super::RepositoryError;
use crate::models::DashboardStats;

/// Start of the periods the dashboard reports on.
#[derive(Debug, Clone, Copy)]
pub struct Periods {
    pub today_start: DateTime<Utc>,
    pub week_start: DateTime<Utc>,
}

async fn order_totals(
    pool: &PgPool,
    since: DateTime<Utc>,
    manager_id: Option<UserId>,
) -> Result<(i64, Decimal), RepositoryError> {
    let totals = sqlx::query_as::<_, (i64, Decimal)>(
        "SELECT COUNT(*), COALESCE(SUM(final_total), 0) FROM shop.orders \
         WHERE created_at >= $1 AND status <> 'cancelled' \
           AND ($2::INTEGER IS NULL OR manager_id = $2)",
    )
    .bind(since)
    .bind(manager_id)
    .fetch_one(pool)
    .await?;
    Ok(totals)
}

/// Headline figures, restricted to a manager's orders when `manager_id` is set.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn stats(
    pool: &PgPool,
    periods: Periods,
    manager_id: Option<UserId>,
    low_stock_threshold: i32,
) -> Result<DashboardStats, RepositoryError> {
    let (today_orders, today_revenue) = order_totals(pool, periods.today_start, manager_id).await?;
    let (week_orders, week_revenue) = order_totals(pool, periods.week_start, manager_id).await?;

    let pending_clients = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM shop.clients \
         WHERE status = 'pending' AND ($1::INTEGER IS NULL OR manager_id = $1)",
    )
    .bind(manager_id)
    .fetch_one(pool)
    .await?;

    let low_stock_products = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM shop.products WHERE is_active AND stock < $1",
    )
    .bind(low_stock_threshold)
    .fetch_one(pool)
    .await?;

    Ok(DashboardStats {
        today_orders,
        today_revenue,
        week_orders,
        week_revenue,
        pending_clients,
        low_stock_products,
    })
}
