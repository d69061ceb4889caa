//! Bonus ledger reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use snacklane_core::{BonusKind, BonusTransactionId, ClientId, OrderId};

use super::RepositoryError;
use crate::models::BonusTransaction;

#[derive(Debug, sqlx::FromRow)]
struct BonusRow {
    id: BonusTransactionId,
    amount: Decimal,
    kind: BonusKind,
    order_id: Option<OrderId>,
    description: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<BonusRow> for BonusTransaction {
    fn from(row: BonusRow) -> Self {
        Self {
            id: row.id,
            amount: row.amount,
            kind: row.kind,
            order_id: row.order_id,
            description: row.description,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

/// Repository for `shop.bonus_transactions`.
pub struct BonusRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BonusRepository<'a> {
    /// Create a new bonus repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Ledger entries for a client, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        client_id: ClientId,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<BonusTransaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, BonusRow>(
            "SELECT id, amount, kind, order_id, description, expires_at, created_at \
             FROM shop.bonus_transactions \
             WHERE client_id = $1 \
             ORDER BY created_at DESC, id DESC \
             OFFSET $2 LIMIT $3",
        )
        .bind(client_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(BonusTransaction::from).collect())
    }

    /// Earned bonuses that expire within `days`, not counting spends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn earned_expiring_within(
        &self,
        client_id: ClientId,
        days: i32,
    ) -> Result<Decimal, RepositoryError> {
        let amount = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM shop.bonus_transactions \
             WHERE client_id = $1 AND kind = 'earn' \
               AND expires_at > NOW() \
               AND expires_at <= NOW() + make_interval(days => $2)",
        )
        .bind(client_id)
        .bind(days)
        .fetch_one(self.pool)
        .await?;
        Ok(amount)
    }
}
