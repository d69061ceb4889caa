//! Seed reference data.
//!
//! `settings` inserts every known system setting with its default value and
//! leaves existing rows alone. `catalog` reads a YAML file:
//!
//! ```yaml
//! categories:
//!   - name: Чипсы
//!     sort_order: 1
//!     products:
//!       - name: Lay's Сметана и лук 150 г
//!         price: 890
//!         weight: 150 г
//!         package_size: 12
//!         stock: 240
//! ```
//!
//! Categories are matched by name. Products already present in their
//! category under the same name are skipped, so the file can be re-applied.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use snacklane_core::lenient_amount;
use snacklane_core::settings::DEFAULT_SETTINGS;

use super::{CliError, connect};

/// Catalog seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    #[serde(deserialize_with = "lenient_amount::deserialize")]
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
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

/// Outcome of a catalog seed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub inserted: usize,
    pub skipped: usize,
}

/// Parse a catalog seed document.
///
/// # Errors
///
/// Returns an error if the YAML does not match the expected shape.
pub fn parse_catalog(content: &str) -> Result<CatalogSeed, CliError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Check a parsed catalog, returning every problem found.
#[must_use]
pub fn validate_catalog(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for category in &seed.categories {
        let name = category.name.trim();
        if name.is_empty() {
            errors.push("category with empty name".to_owned());
        } else if !seen.insert(name.to_lowercase()) {
            errors.push(format!("duplicate category: {name}"));
        }

        for product in &category.products {
            let label = product.name.trim();
            if label.is_empty() {
                errors.push(format!("product with empty name in {name}"));
            }
            if product.price < Decimal::ZERO {
                errors.push(format!("{label}: price must not be negative"));
            }
            if product.stock < 0 {
                errors.push(format!("{label}: stock must not be negative"));
            }
            if product.package_size.is_some_and(|size| size <= 0) {
                errors.push(format!("{label}: package_size must be positive"));
            }
        }
    }

    errors
}

/// Insert default system settings, keeping values that already exist.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn settings() -> Result<u64, CliError> {
    let pool = connect().await?;

    let mut inserted = 0;
    for definition in DEFAULT_SETTINGS {
        let result = sqlx::query(
            r"
            INSERT INTO shop.system_settings (key, value, value_type, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO NOTHING
            ",
        )
        .bind(definition.key)
        .bind(definition.default)
        .bind(definition.value_type.to_string())
        .bind(definition.description)
        .execute(&pool)
        .await?;
        inserted += result.rows_affected();
    }

    info!(inserted, known = DEFAULT_SETTINGS.len(), "Settings seeded");
    Ok(inserted)
}

/// Load categories and products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or a database
/// operation fails. Nothing is written when validation fails.
pub async fn catalog(file_path: &str) -> Result<SeedSummary, CliError> {
    let content = tokio::fs::read_to_string(Path::new(file_path))
        .await
        .map_err(|source| CliError::Io {
            path: file_path.to_owned(),
            source,
        })?;

    let seed = parse_catalog(&content)?;
    let errors = validate_catalog(&seed);
    if !errors.is_empty() {
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(CliError::InvalidSeed(format!(
            "{} validation errors found",
            errors.len()
        )));
    }

    info!(path = %file_path, categories = seed.categories.len(), "Parsed catalog");

    let pool = connect().await?;
    let summary = apply_catalog(&pool, &seed).await?;

    info!("Seeding complete!");
    info!("  Categories: {}", summary.categories);
    info!("  Products inserted: {}", summary.inserted);
    info!("  Products skipped (already exist): {}", summary.skipped);
    Ok(summary)
}

async fn apply_catalog(pool: &PgPool, seed: &CatalogSeed) -> Result<SeedSummary, CliError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for category in &seed.categories {
        let category_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.categories (name, sort_order)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET sort_order = EXCLUDED.sort_order
            RETURNING id
            ",
        )
        .bind(category.name.trim())
        .bind(category.sort_order)
        .fetch_one(&mut *tx)
        .await?;
        summary.categories += 1;

        for product in &category.products {
            let inserted = sqlx::query(
                r"
                INSERT INTO shop.products
                    (name, category_id, description, price, weight, package_size,
                     stock, photo_file_id, sort_order)
                SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
                WHERE NOT EXISTS (
                    SELECT 1 FROM shop.products WHERE category_id = $2 AND name = $1
                )
                ",
            )
            .bind(product.name.trim())
            .bind(category_id)
            .bind(&product.description)
            .bind(product.price)
            .bind(&product.weight)
            .bind(product.package_size)
            .bind(product.stock)
            .bind(&product.photo_file_id)
            .bind(product.sort_order)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted == 0 {
                summary.skipped += 1;
            } else {
                summary.inserted += 1;
            }
        }
    }

    tx.commit().await?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
categories:
  - name: Чипсы
    sort_order: 1
    products:
      - name: Lay's Сметана и лук 150 г
        price: 890
        weight: 150 г
        package_size: 12
        stock: 240
      - name: Pringles Original
        price: '1450.50'
  - name: Напитки
    products: []
";

    #[test]
    fn test_parse_catalog() {
        let seed = parse_catalog(SAMPLE).unwrap();
        assert_eq!(seed.categories.len(), 2);

        let chips = seed.categories.first().unwrap();
        assert_eq!(chips.sort_order, 1);
        assert_eq!(chips.products.len(), 2);

        let pringles = chips.products.get(1).unwrap();
        assert_eq!(pringles.price, Decimal::new(145_050, 2));
        assert_eq!(pringles.stock, 0);
        assert!(pringles.package_size.is_none());

        assert!(validate_catalog(&seed).is_empty());
    }

    #[test]
    fn test_parse_catalog_rejects_missing_price() {
        let yaml = "categories:\n  - name: A\n    products:\n      - name: B\n";
        assert!(matches!(parse_catalog(yaml), Err(CliError::Yaml(_))));
    }

    #[test]
    fn test_validate_catalog_collects_errors() {
        let yaml = r"
categories:
  - name: Чипсы
    products:
      - name: ''
        price: 10
      - name: Broken
        price: -1
        stock: -5
        package_size: 0
  - name: чипсы
";
        let seed = parse_catalog(yaml).unwrap();
        let errors = validate_catalog(&seed);

        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| e.contains("duplicate category")));
        assert!(errors.iter().any(|e| e.contains("price must not be negative")));
    }

    #[test]
    fn test_default_settings_have_unique_keys() {
        let keys: HashSet<_> = DEFAULT_SETTINGS.iter().map(|d| d.key).collect();
        assert_eq!(keys.len(), DEFAULT_SETTINGS.len());
    }
}
