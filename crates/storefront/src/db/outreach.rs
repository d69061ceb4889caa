//! Response and conversion tracking for outreach messages.

use sqlx::{PgConnection, PgPool};

use snacklane_core::{ClientId, OrderId};

use super::RepositoryError;

/// Mark recent outreach messages as answered when the client opens the app.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn mark_responded(pool: &PgPool, client_id: ClientId) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        "UPDATE shop.outreach_messages SET client_responded = TRUE \
         WHERE client_id = $1 AND NOT client_responded \
           AND sent_at >= NOW() - INTERVAL '7 days'",
    )
    .bind(client_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Attribute an order to the latest outreach message of the past week.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn mark_converted(
    conn: &mut PgConnection,
    client_id: ClientId,
    order_id: OrderId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.outreach_messages \
         SET resulted_in_order = TRUE, client_responded = TRUE, order_id = $2 \
         WHERE id = ( \
             SELECT id FROM shop.outreach_messages \
             WHERE client_id = $1 AND NOT resulted_in_order \
               AND sent_at >= NOW() - INTERVAL '7 days' \
             ORDER BY sent_at DESC LIMIT 1 \
         )",
    )
    .bind(client_id)
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(())
}
