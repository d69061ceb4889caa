//! Staff lookups.

use sqlx::PgPool;

use snacklane_core::{TelegramId, UserId, UserRole};

use super::RepositoryError;
use crate::models::Staff;

#[derive(Debug, sqlx::FromRow)]
struct StaffRow {
    id: UserId,
    telegram_id: TelegramId,
    username: Option<String>,
    role: UserRole,
}

impl From<StaffRow> for Staff {
    fn from(row: StaffRow) -> Self {
        Self {
            id: row.id,
            telegram_id: row.telegram_id,
            username: row.username,
            role: row.role,
        }
    }
}

/// A user looked up for authentication.
#[derive(Debug)]
pub struct StaffCandidate {
    pub staff: Staff,
    pub is_active: bool,
}

/// Repository for staff users.
pub struct StaffRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StaffRepository<'a> {
    /// Create a new staff repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Any user by Telegram id, with its role and active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_telegram_id(
        &self,
        telegram_id: TelegramId,
    ) -> Result<Option<StaffCandidate>, RepositoryError> {
        let row = sqlx::query_as::<_, (UserId, TelegramId, Option<String>, UserRole, bool)>(
            "SELECT id, telegram_id, username, role, is_active FROM shop.users \
             WHERE telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(
            |(id, telegram_id, username, role, is_active)| StaffCandidate {
                staff: Staff {
                    id,
                    telegram_id,
                    username,
                    role,
                },
                is_active,
            },
        ))
    }

    /// An active manager by user id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_manager(&self, id: UserId) -> Result<Option<Staff>, RepositoryError> {
        let row = sqlx::query_as::<_, StaffRow>(
            "SELECT id, telegram_id, username, role FROM shop.users \
             WHERE id = $1 AND role = 'manager' AND is_active",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Staff::from))
    }

    /// Telegram ids of active admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_telegram_ids(&self) -> Result<Vec<TelegramId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, TelegramId>(
            "SELECT telegram_id FROM shop.users WHERE role = 'admin' AND is_active",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }
}
