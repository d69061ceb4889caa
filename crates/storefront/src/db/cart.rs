//! Persistent per-user cart.

use sqlx::{PgConnection, PgPool};

use snacklane_core::{ProductId, UserId};

use super::RepositoryError;
use super::catalog::{PRODUCT_COLUMNS, ProductRow};
use crate::models::Product;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    #[sqlx(flatten)]
    product: ProductRow,
    quantity: i32,
}

/// Repository for `shop.cart_items`.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Cart contents joined with active products, oldest first.
    ///
    /// Items whose product was deactivated are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<(Product, i32)>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {PRODUCT_COLUMNS}, ci.quantity \
             FROM shop.cart_items ci \
             JOIN shop.products p ON p.id = ci.product_id \
             WHERE ci.user_id = $1 AND p.is_active \
             ORDER BY ci.created_at, p.id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (Product::from(row.product), row.quantity))
            .collect())
    }

    /// `(product, quantity)` pairs for ordering, in product id order.
    ///
    /// Skips deactivated products, matching what [`Self::lines`] shows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<(ProductId, i32)>, RepositoryError> {
        let rows = sqlx::query_as::<_, (ProductId, i32)>(
            "SELECT ci.product_id, ci.quantity FROM shop.cart_items ci \
             JOIN shop.products p ON p.id = ci.product_id \
             WHERE ci.user_id = $1 AND p.is_active \
             ORDER BY ci.product_id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Add `quantity` of a product, increasing an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO shop.cart_items (user_id, product_id, quantity) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, product_id) \
             DO UPDATE SET quantity = shop.cart_items.quantity + EXCLUDED.quantity, \
                           updated_at = NOW()",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Replace the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in the cart.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.cart_items SET quantity = $3, updated_at = NOW() \
             WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a product from the cart. Removing an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        clear(&mut *self.pool.acquire().await?, user_id).await
    }
}

/// Empty a user's cart on an existing connection or transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}
