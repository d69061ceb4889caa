//! `shop.system_settings` reads and edits.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use snacklane_core::settings::{SettingType, ShopSettings};

use super::RepositoryError;
use crate::models::SystemSetting;

const SETTING_COLUMNS: &str = "key, value, value_type, description, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct SettingRow {
    key: String,
    value: String,
    value_type: String,
    description: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SettingRow> for SystemSetting {
    type Error = RepositoryError;

    fn try_from(row: SettingRow) -> Result<Self, Self::Error> {
        let value_type: SettingType = row.value_type.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("setting {}: {e}", row.key))
        })?;
        Ok(Self {
            key: row.key,
            value: row.value,
            value_type,
            description: row.description,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for runtime settings.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All stored settings, by key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` for a row with an unknown
    /// value type.
    pub async fn list(&self) -> Result<Vec<SystemSetting>, RepositoryError> {
        let rows = sqlx::query_as::<_, SettingRow>(&format!(
            "SELECT {SETTING_COLUMNS} FROM shop.system_settings ORDER BY key"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(SystemSetting::try_from).collect()
    }

    /// Store a value, creating the row if the key was never seeded.
    ///
    /// The caller validates `value` against `value_type`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(
        &self,
        key: &str,
        value: &str,
        value_type: SettingType,
        description: Option<&str>,
    ) -> Result<SystemSetting, RepositoryError> {
        let row = sqlx::query_as::<_, SettingRow>(&format!(
            "INSERT INTO shop.system_settings (key, value, value_type, description) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW() \
             RETURNING {SETTING_COLUMNS}"
        ))
        .bind(key)
        .bind(value)
        .bind(value_type.to_string())
        .bind(description)
        .fetch_one(self.pool)
        .await?;

        SystemSetting::try_from(row)
    }

    /// Typed settings with defaults for anything missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn shop_settings(&self) -> Result<ShopSettings, RepositoryError> {
        let rows =
            sqlx::query_as::<_, (String, String)>("SELECT key, value FROM shop.system_settings")
                .fetch_all(self.pool)
                .await?;

        Ok(ShopSettings::from_pairs(
            rows.iter().map(|(key, value)| (key.as_str(), value.as_str())),
        ))
    }
}
