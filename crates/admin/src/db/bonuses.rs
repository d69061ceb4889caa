//! Bonus ledger writes made by staff actions and the expiry job.
//!
//! Every ledger entry moves `clients.bonus_balance` by its signed amount in
//! the same transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use snacklane_core::bonus::LedgerTotals;
use snacklane_core::{BonusKind, ClientId, OrderId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    earned_past_expiry: Decimal,
    spent: Decimal,
    refunded: Decimal,
    expired: Decimal,
}

impl From<TotalsRow> for LedgerTotals {
    fn from(row: TotalsRow) -> Self {
        Self {
            earned_past_expiry: row.earned_past_expiry,
            spent: row.spent,
            refunded: row.refunded,
            expired: row.expired,
        }
    }
}

async fn insert(
    conn: &mut PgConnection,
    client_id: ClientId,
    kind: BonusKind,
    amount: Decimal,
    order_id: Option<OrderId>,
    description: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO shop.bonus_transactions \
             (client_id, amount, kind, order_id, description, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(client_id)
    .bind(amount)
    .bind(kind)
    .bind(order_id)
    .bind(description)
    .bind(expires_at)
    .execute(&mut *conn)
    .await?;

    sqlx::query("UPDATE shop.clients SET bonus_balance = bonus_balance + $2 WHERE id = $1")
        .bind(client_id)
        .bind(amount)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Credit earned bonus (delivery accrual or welcome bonus).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn credit(
    conn: &mut PgConnection,
    client_id: ClientId,
    amount: Decimal,
    order_id: Option<OrderId>,
    description: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(), RepositoryError> {
    insert(
        conn,
        client_id,
        BonusKind::Earn,
        amount,
        order_id,
        description,
        expires_at,
    )
    .await
}

/// Return bonus spent on a cancelled order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn refund(
    conn: &mut PgConnection,
    client_id: ClientId,
    amount: Decimal,
    order_id: OrderId,
    description: &str,
) -> Result<(), RepositoryError> {
    insert(
        conn,
        client_id,
        BonusKind::Refund,
        amount,
        Some(order_id),
        description,
        None,
    )
    .await
}

/// Write off expired bonus. `amount` is positive.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn expire(
    conn: &mut PgConnection,
    client_id: ClientId,
    amount: Decimal,
) -> Result<(), RepositoryError> {
    insert(
        conn,
        client_id,
        BonusKind::Expire,
        -amount,
        None,
        "Bonus expired",
        None,
    )
    .await
}

/// Lock the client row and return its bonus balance.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the client does not exist.
pub async fn lock_balance(
    conn: &mut PgConnection,
    client_id: ClientId,
) -> Result<Decimal, RepositoryError> {
    sqlx::query_scalar::<_, Decimal>(
        "SELECT bonus_balance FROM shop.clients WHERE id = $1 FOR UPDATE",
    )
    .bind(client_id)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Ledger totals used by the expiry rule, as absolute values.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn ledger_totals(
    conn: &mut PgConnection,
    client_id: ClientId,
    now: DateTime<Utc>,
) -> Result<LedgerTotals, RepositoryError> {
    let row = sqlx::query_as::<_, TotalsRow>(
        "SELECT \
             COALESCE(SUM(amount) FILTER (WHERE kind = 'earn' AND expires_at <= $2), 0) \
                 AS earned_past_expiry, \
             COALESCE(-SUM(amount) FILTER (WHERE kind = 'spend'), 0) AS spent, \
             COALESCE(SUM(amount) FILTER (WHERE kind = 'refund'), 0) AS refunded, \
             COALESCE(-SUM(amount) FILTER (WHERE kind = 'expire'), 0) AS expired \
         FROM shop.bonus_transactions \
         WHERE client_id = $1",
    )
    .bind(client_id)
    .bind(now)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}

/// Clients holding earned bonus that has passed its expiry date.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clients_with_expired_earnings(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<Vec<ClientId>, RepositoryError> {
    let ids = sqlx::query_scalar::<_, ClientId>(
        "SELECT DISTINCT c.id FROM shop.clients c \
         JOIN shop.bonus_transactions t ON t.client_id = c.id \
         WHERE c.bonus_balance > 0 AND t.kind = 'earn' AND t.expires_at <= $1 \
         ORDER BY c.id",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
