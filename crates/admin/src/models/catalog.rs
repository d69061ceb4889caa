//! Catalog records, including inactive ones.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use snacklane_core::{CategoryId, ProductId};

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub sort_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub description: Option<String>,
    pub price: Decimal,
    pub weight: Option<String>,
    pub package_size: Option<i32>,
    pub stock: i32,
    pub photo_file_id: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
