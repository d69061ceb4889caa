//! Reads of `shop.system_settings`.

use sqlx::PgPool;

use snacklane_core::settings::ShopSettings;

use super::RepositoryError;

/// Load all settings rows and parse them, falling back to defaults.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn load_shop_settings(pool: &PgPool) -> Result<ShopSettings, RepositoryError> {
    let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM shop.system_settings")
        .fetch_all(pool)
        .await?;

    Ok(ShopSettings::from_pairs(
        rows.iter().map(|(key, value)| (key.as_str(), value.as_str())),
    ))
}
