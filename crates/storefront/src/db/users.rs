//! User and client repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use snacklane_core::{
    BinIin, ClientId, ClientStatus, PhoneNumber, TelegramId, UserId, UserRole,
};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Client, User};

pub(crate) const USER_COLUMNS: &str =
    "id, telegram_id, username, phone, role, is_active, created_at, last_active";

pub(crate) const CLIENT_COLUMNS: &str = "id, user_id, company_name, address, bin_iin, contact_phone, \
     manager_id, status, discount_percent, bonus_balance, credit_limit, debt, \
     payment_delay_days, first_order_discount_used, created_at, approved_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: UserId,
    telegram_id: TelegramId,
    username: Option<String>,
    phone: Option<String>,
    role: UserRole,
    is_active: bool,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            telegram_id: row.telegram_id,
            username: row.username,
            phone: row.phone,
            role: row.role,
            is_active: row.is_active,
            created_at: row.created_at,
            last_active: row.last_active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ClientRow {
    id: ClientId,
    user_id: UserId,
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

/// Validated registration data.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub telegram_id: TelegramId,
    pub username: Option<String>,
    pub company_name: String,
    pub address: Option<String>,
    pub bin_iin: Option<BinIin>,
    pub phone: Option<PhoneNumber>,
    pub credit_limit: Decimal,
    pub payment_delay_days: i32,
}

/// Repository for users and their client profiles.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by Telegram id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_telegram_id(
        &self,
        telegram_id: TelegramId,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE telegram_id = $1"
        ))
        .bind(telegram_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Get the client profile of a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_client(&self, user_id: UserId) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM shop.clients WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    /// Record that the user opened the mini-app.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn touch_last_active(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE shop.users SET last_active = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Create a user and a pending client profile in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the Telegram id is already registered.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn register(&self, new: &NewClient) -> Result<(User, Client), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO shop.users (telegram_id, username, phone, role) \
             VALUES ($1, $2, $3, 'client') \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new.telegram_id)
        .bind(new.username.as_deref())
        .bind(new.phone.as_ref().map(PhoneNumber::as_str))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "User already registered"))?;

        let client = sqlx::query_as::<_, ClientRow>(&format!(
            "INSERT INTO shop.clients \
                 (user_id, company_name, address, bin_iin, contact_phone, status, \
                  credit_limit, payment_delay_days) \
             VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7) \
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&new.company_name)
        .bind(new.address.as_deref())
        .bind(new.bin_iin.as_ref().map(BinIin::as_str))
        .bind(new.phone.as_ref().map(PhoneNumber::as_str))
        .bind(new.credit_limit)
        .bind(new.payment_delay_days)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((user.into(), client.into()))
    }

    /// Telegram ids of active admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_telegram_ids(&self) -> Result<Vec<TelegramId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, TelegramId>(
            "SELECT telegram_id FROM shop.users WHERE role = 'admin' AND is_active ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }
}
