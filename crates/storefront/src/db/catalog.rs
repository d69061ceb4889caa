//! Catalog repository: categories, products and recommendations.

use rust_decimal::Decimal;
use sqlx::PgPool;

use snacklane_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::{Category, Product};

pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.name, p.category_id, p.description, p.price, \
     p.weight, p.package_size, p.stock, p.photo_file_id, p.sort_order";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    sort_order: i32,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: ProductId,
    name: String,
    category_id: CategoryId,
    description: Option<String>,
    price: Decimal,
    weight: Option<String>,
    package_size: Option<i32>,
    stock: i32,
    photo_file_id: Option<String>,
    sort_order: i32,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category_id: row.category_id,
            description: row.description,
            price: row.price,
            weight: row.weight,
            package_size: row.package_size,
            stock: row.stock,
            photo_file_id: row.photo_file_id,
            sort_order: row.sort_order,
        }
    }
}

/// Product listing filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

/// Escape `LIKE` wildcards and wrap the term for a substring match.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, sort_order FROM shop.categories \
             WHERE is_active ORDER BY sort_order, name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Active products matching the filter, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products p \
             WHERE p.is_active \
               AND ($1::INTEGER IS NULL OR p.category_id = $1) \
               AND ($2::TEXT IS NULL OR p.name ILIKE $2) \
             ORDER BY p.sort_order, p.name \
             OFFSET $3 LIMIT $4"
        ))
        .bind(filter.category_id)
        .bind(search)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// An active product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products p WHERE p.id = $1 AND p.is_active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Products to suggest next to `product`.
    ///
    /// Explicit recommendations come first by weight; the rest is filled
    /// with other products from the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn recommendations(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let explicit = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product_recommendations r \
             JOIN shop.products p ON p.id = r.recommended_id \
             WHERE r.product_id = $1 AND p.is_active \
             ORDER BY r.weight DESC, p.sort_order, p.name \
             LIMIT $2"
        ))
        .bind(product.id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let mut products: Vec<Product> = explicit.into_iter().map(Product::from).collect();
        let missing = limit - i64::try_from(products.len()).unwrap_or(limit);
        if missing <= 0 {
            return Ok(products);
        }

        let mut exclude: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        exclude.push(product.id);

        let fill = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products p \
             WHERE p.is_active AND p.category_id = $1 AND p.id <> ALL($2) \
             ORDER BY p.sort_order, p.name \
             LIMIT $3"
        ))
        .bind(product.category_id)
        .bind(exclude.iter().map(|id| id.as_i32()).collect::<Vec<i32>>())
        .bind(missing)
        .fetch_all(self.pool)
        .await?;

        products.extend(fill.into_iter().map(Product::from));
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("квас"), "%квас%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
