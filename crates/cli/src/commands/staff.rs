//! Staff user management.
//!
//! Staff are ordinary Telegram users with the `manager` or `admin` role.
//! Adding a user that does not exist yet creates the `shop.users` row so the
//! person can open the admin mini-app before ever touching the storefront.

use snacklane_core::UserRole;
use sqlx::FromRow;

use super::{CliError, connect};

#[derive(Debug, FromRow)]
struct StaffRow {
    id: i32,
    telegram_id: i64,
    username: Option<String>,
    role: UserRole,
    is_active: bool,
}

/// Parse a role argument, accepting staff roles only.
///
/// # Errors
///
/// Returns `InvalidRole` for `client` and unknown values.
pub fn parse_staff_role(role: &str) -> Result<UserRole, CliError> {
    match role.trim().to_lowercase().parse::<UserRole>() {
        Ok(parsed) if parsed.is_staff() => Ok(parsed),
        _ => Err(CliError::InvalidRole(role.to_owned())),
    }
}

/// Create a staff user or promote an existing one.
///
/// # Errors
///
/// Returns an error for a non-staff role or a database failure.
pub async fn add(telegram_id: i64, role: &str, username: Option<&str>) -> Result<i32, CliError> {
    let role = parse_staff_role(role)?;
    let username = username.map(|u| u.trim_start_matches('@'));

    let pool = connect().await?;

    let user_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO shop.users (telegram_id, username, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (telegram_id) DO UPDATE
            SET role = EXCLUDED.role,
                username = COALESCE(EXCLUDED.username, shop.users.username),
                is_active = TRUE
        RETURNING id
        ",
    )
    .bind(telegram_id)
    .bind(username)
    .bind(role)
    .fetch_one(&pool)
    .await?;

    tracing::info!(user_id, telegram_id, %role, "Staff user saved");
    Ok(user_id)
}

/// Demote a staff user back to `client`.
///
/// # Errors
///
/// Returns `UserNotFound` if no user has this Telegram id.
pub async fn revoke(telegram_id: i64) -> Result<(), CliError> {
    let pool = connect().await?;

    let updated = sqlx::query("UPDATE shop.users SET role = $2 WHERE telegram_id = $1")
        .bind(telegram_id)
        .bind(UserRole::Client)
        .execute(&pool)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(CliError::UserNotFound(telegram_id));
    }

    tracing::info!(telegram_id, "Staff access revoked");
    Ok(())
}

/// Log every manager and admin.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list() -> Result<(), CliError> {
    let pool = connect().await?;

    let staff = sqlx::query_as::<_, StaffRow>(
        r"
        SELECT id, telegram_id, username, role, is_active
        FROM shop.users
        WHERE role IN ('manager', 'admin')
        ORDER BY role DESC, id
        ",
    )
    .fetch_all(&pool)
    .await?;

    tracing::info!("Staff users: {}", staff.len());
    for user in staff {
        tracing::info!(
            "  #{} {} @{} {}{}",
            user.id,
            user.telegram_id,
            user.username.as_deref().unwrap_or("-"),
            user.role,
            if user.is_active { "" } else { " (inactive)" }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_staff_role() {
        assert_eq!(parse_staff_role("admin").unwrap(), UserRole::Admin);
        assert_eq!(parse_staff_role(" Manager ").unwrap(), UserRole::Manager);
    }

    #[test]
    fn test_parse_staff_role_rejects_client() {
        assert!(matches!(
            parse_staff_role("client"),
            Err(CliError::InvalidRole(r)) if r == "client"
        ));
        assert!(parse_staff_role("owner").is_err());
    }
}
