//! Catalog management: products and categories, including inactive ones.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use snacklane_core::{CategoryId, ProductId, lenient_amount};

use super::{RepositoryError, conflict_on_unique, search_pattern};
use crate::models::{Category, Product};

const PRODUCT_COLUMNS: &str = "id, name, category_id, description, price, weight, package_size, \
     stock, photo_file_id, is_active, sort_order, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, sort_order, is_active";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    category_id: CategoryId,
    description: Option<String>,
    price: Decimal,
    weight: Option<String>,
    package_size: Option<i32>,
    stock: i32,
    photo_file_id: Option<String>,
    is_active: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
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
            is_active: row.is_active,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    sort_order: i32,
    is_active: bool,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            sort_order: row.sort_order,
            is_active: row.is_active,
        }
    }
}

/// Filters for the staff product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub skip: i64,
    pub limit: i64,
}

/// A product to create.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_amount::deserialize")]
    pub price: Decimal,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub package_size: Option<i32>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub photo_file_id: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// Partial product update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount::deserialize_option")]
    pub price: Option<Decimal>,
    pub weight: Option<String>,
    pub package_size: Option<i32>,
    pub stock: Option<i32>,
    pub photo_file_id: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Repository for catalog management.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products matching the filter, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products \
             WHERE ($1::INTEGER IS NULL OR category_id = $1) \
               AND ($2::TEXT IS NULL OR name ILIKE $2) \
               AND ($3::BOOLEAN IS NULL OR is_active = $3) \
             ORDER BY sort_order, name \
             OFFSET $4 LIMIT $5"
        ))
        .bind(filter.category_id)
        .bind(search_pattern(filter.search.as_deref()))
        .bind(filter.is_active)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO shop.products \
                 (name, category_id, description, price, weight, package_size, stock, \
                  photo_file_id, sort_order) \
             SELECT $1, c.id, $3, $4, $5, $6, $7, $8, $9 \
             FROM shop.categories c WHERE c.id = $2 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.category_id)
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.weight)
        .bind(new.package_size)
        .bind(new.stock)
        .bind(&new.photo_file_id)
        .bind(new.sort_order)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Database` if the query fails (e.g. unknown category).
    pub async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE shop.products SET \
                 name = COALESCE($2, name), \
                 category_id = COALESCE($3, category_id), \
                 description = COALESCE($4, description), \
                 price = COALESCE($5, price), \
                 weight = COALESCE($6, weight), \
                 package_size = COALESCE($7, package_size), \
                 stock = COALESCE($8, stock), \
                 photo_file_id = COALESCE($9, photo_file_id), \
                 is_active = COALESCE($10, is_active), \
                 sort_order = COALESCE($11, sort_order), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.name)
        .bind(update.category_id)
        .bind(&update.description)
        .bind(update.price)
        .bind(&update.weight)
        .bind(update.package_size)
        .bind(update.stock)
        .bind(&update.photo_file_id)
        .bind(update.is_active)
        .bind(update.sort_order)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    /// Hide a product from the storefront. Order history keeps referencing it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn deactivate_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.products SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Whether a category exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM shop.categories WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// All categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories ORDER BY sort_order, name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create_category(
        &self,
        name: &str,
        sort_order: i32,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO shop.categories (name, sort_order) VALUES ($1, $2) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(name)
        .bind(sort_order)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Category already exists"))?;

        Ok(Category::from(row))
    }

    /// Rename, reorder or (de)activate a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist,
    /// `RepositoryError::Conflict` if the new name is taken.
    pub async fn update_category(
        &self,
        id: CategoryId,
        name: Option<&str>,
        sort_order: Option<i32>,
        is_active: Option<bool>,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "UPDATE shop.categories SET \
                 name = COALESCE($2, name), \
                 sort_order = COALESCE($3, sort_order), \
                 is_active = COALESCE($4, is_active) \
             WHERE id = $1 \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(sort_order)
        .bind(is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Category already exists"))?;

        row.map(Category::from).ok_or(RepositoryError::NotFound)
    }
}
