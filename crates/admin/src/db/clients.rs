//! Client management: approval, blocking, terms and payments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use snacklane_core::{ClientId, ClientStatus, TelegramId, UserId};

use super::{RepositoryError, search_pattern};
use crate::models::Client;

/// Client columns joined with the owning user, aliased `c` and `u`.
pub(crate) const CLIENT_COLUMNS: &str = "c.id, c.user_id, u.telegram_id, u.username, \
     c.company_name, c.address, c.bin_iin, c.contact_phone, c.manager_id, c.status, \
     c.discount_percent, c.bonus_balance, c.credit_limit, c.debt, c.payment_delay_days, \
     c.first_order_discount_used, c.created_at, c.approved_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ClientRow {
    id: ClientId,
    user_id: UserId,
    telegram_id: TelegramId,
    username: Option<String>,
    company_name: String,
    address: Option<String>,
    bin_iin: Option<String>,
    contact_phone: Option<String>,
    manager_id: Option<UserId>,
    status: ClientStatus,
    discount_percent: Decimal,
    bonus_balance: Decimal,
    credit_limit: Decimal,
    debt: Decimal,
    payment_delay_days: i32,
    first_order_discount_used: bool,
    created_at: DateTime<Utc>,
    approved_at: Option<DateTime<Utc>>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            telegram_id: row.telegram_id,
            username: row.username,
            company_name: row.company_name,
            address: row.address,
            bin_iin: row.bin_iin,
            contact_phone: row.contact_phone,
            manager_id: row.manager_id,
            status: row.status,
            discount_percent: row.discount_percent,
            bonus_balance: row.bonus_balance,
            credit_limit: row.credit_limit,
            debt: row.debt,
            payment_delay_days: row.payment_delay_days,
            first_order_discount_used: row.first_order_discount_used,
            created_at: row.created_at,
            approved_at: row.approved_at,
        }
    }
}

/// Filters for the client listing.
#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub status: Option<ClientStatus>,
    /// Matched against company name and BIN/IIN.
    pub search: Option<String>,
    /// Restrict to clients assigned to this manager.
    pub manager_id: Option<UserId>,
    pub skip: i64,
    pub limit: i64,
}

/// Commercial terms update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TermsUpdate {
    pub discount_percent: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
    pub payment_delay_days: Option<i32>,
    /// `Some(None)` unassigns the manager.
    pub manager_id: Option<Option<UserId>>,
}

/// Repository for `shop.clients` as managed by staff.
pub struct ClientRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ClientRepository<'a> {
    /// Create a new client repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A page of clients, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, filter: &ClientFilter) -> Result<(Vec<Client>, i64), RepositoryError> {
        const WHERE: &str = "WHERE ($1::shop.client_status IS NULL OR c.status = $1) \
               AND ($2::TEXT IS NULL OR c.company_name ILIKE $2 OR c.bin_iin ILIKE $2) \
               AND ($3::INTEGER IS NULL OR c.manager_id = $3)";

        let pattern = search_pattern(filter.search.as_deref());

        let total_count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM shop.clients c {WHERE}"
        ))
        .bind(filter.status)
        .bind(&pattern)
        .bind(filter.manager_id)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM shop.clients c \
             JOIN shop.users u ON u.id = c.user_id \
             {WHERE} \
             ORDER BY c.created_at DESC, c.id DESC \
             OFFSET $4 LIMIT $5"
        ))
        .bind(filter.status)
        .bind(&pattern)
        .bind(filter.manager_id)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(self.pool)
        .await?;

        Ok((rows.into_iter().map(Client::from).collect(), total_count))
    }

    /// Get a client by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM shop.clients c \
             JOIN shop.users u ON u.id = c.user_id \
             WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    /// Activate a pending client and credit the welcome bonus.
    ///
    /// Returns `None` when the client is not pending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn approve(
        &self,
        id: ClientId,
        welcome_bonus: Decimal,
        bonus_expires_at: DateTime<Utc>,
    ) -> Result<Option<Client>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let approved = sqlx::query_scalar::<_, ClientId>(
            "UPDATE shop.clients SET status = 'active', approved_at = NOW() \
             WHERE id = $1 AND status = 'pending' \
             RETURNING id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if approved.is_none() {
            return Ok(None);
        }

        if welcome_bonus > Decimal::ZERO {
            super::bonuses::credit(
                &mut tx,
                id,
                welcome_bonus,
                None,
                "Welcome bonus",
                Some(bonus_expires_at),
            )
            .await?;
        }

        let client = fetch_client(&mut tx, id).await?;
        tx.commit().await?;
        Ok(Some(client))
    }

    /// Block a client and deactivate its user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the client does not exist.
    pub async fn block(&self, id: ClientId) -> Result<Client, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, UserId>(
            "UPDATE shop.clients SET status = 'blocked' WHERE id = $1 RETURNING user_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        set_user_active(&mut tx, user_id, false).await?;

        let client = fetch_client(&mut tx, id).await?;
        tx.commit().await?;
        Ok(client)
    }

    /// Lift a block and reactivate the user.
    ///
    /// A client that was never approved goes back to `pending`, so approval
    /// still grants the welcome bonus. Returns `None` when the client is not
    /// blocked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn unblock(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, (UserId, ClientStatus, Option<DateTime<Utc>>)>(
            "SELECT user_id, status, approved_at FROM shop.clients WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((user_id, ClientStatus::Blocked, approved_at)) = current else {
            return Ok(None);
        };

        sqlx::query("UPDATE shop.clients SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(ClientStatus::after_unblock(approved_at.is_some()))
            .execute(&mut *tx)
            .await?;
        set_user_active(&mut tx, user_id, true).await?;

        let client = fetch_client(&mut tx, id).await?;
        tx.commit().await?;
        Ok(Some(client))
    }

    /// Change discount, credit terms or the assigned manager.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the client does not exist.
    pub async fn update_terms(
        &self,
        id: ClientId,
        terms: &TermsUpdate,
    ) -> Result<Client, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE shop.clients SET \
                 discount_percent = COALESCE($2, discount_percent), \
                 credit_limit = COALESCE($3, credit_limit), \
                 payment_delay_days = COALESCE($4, payment_delay_days), \
                 manager_id = CASE WHEN $5 THEN $6 ELSE manager_id END \
             WHERE id = $1",
        )
        .bind(id)
        .bind(terms.discount_percent)
        .bind(terms.credit_limit)
        .bind(terms.payment_delay_days)
        .bind(terms.manager_id.is_some())
        .bind(terms.manager_id.flatten())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let client = fetch_client(&mut tx, id).await?;
        tx.commit().await?;
        Ok(client)
    }

    /// Record a payment against the client's debt, never going below zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the client does not exist.
    pub async fn register_payment(
        &self,
        id: ClientId,
        amount: Decimal,
    ) -> Result<Client, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        super::orders::reduce_debt(&mut tx, id, amount).await?;
        let client = fetch_client(&mut tx, id).await?;
        tx.commit().await?;
        Ok(client)
    }
}

/// Read a client inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the client does not exist.
pub(crate) async fn fetch_client(
    conn: &mut PgConnection,
    id: ClientId,
) -> Result<Client, RepositoryError> {
    let row = sqlx::query_as::<_, ClientRow>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM shop.clients c \
         JOIN shop.users u ON u.id = c.user_id \
         WHERE c.id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

async fn set_user_active(
    conn: &mut PgConnection,
    user_id: UserId,
    is_active: bool,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.users SET is_active = $2 WHERE id = $1")
        .bind(user_id)
        .bind(is_active)
        .execute(conn)
        .await?;
    Ok(())
}
