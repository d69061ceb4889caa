//! Catalog routes with personal prices.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use snacklane_core::{CategoryId, ProductId};

use super::{page_limit, page_skip};
use crate::db::{CatalogRepository, ProductFilter};
use crate::error::{AppError, Result};
use crate::middleware::ActiveClient;
use crate::models::{Category, ProductWithPrice};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Query parameters for recommendations.
#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub limit: Option<i64>,
}

/// Active categories.
pub async fn categories(
    State(state): State<AppState>,
    _client: ActiveClient,
) -> Result<Json<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    Ok(Json(categories))
}

/// Active products, filtered and paged.
pub async fn products(
    State(state): State<AppState>,
    ActiveClient { client, .. }: ActiveClient,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<ProductWithPrice>>> {
    let filter = ProductFilter {
        category_id: query.category_id,
        search: query.search,
        skip: page_skip(query.skip)?,
        limit: page_limit(query.limit, 50, 100)?,
    };

    let products = CatalogRepository::new(state.pool())
        .list_products(&filter)
        .await?
        .into_iter()
        .map(|p| ProductWithPrice::new(p, client.discount_percent))
        .collect();
    Ok(Json(products))
}

/// A single active product.
pub async fn product(
    State(state): State<AppState>,
    ActiveClient { client, .. }: ActiveClient,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductWithPrice>> {
    let product = CatalogRepository::new(state.pool())
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(ProductWithPrice::new(product, client.discount_percent)))
}

/// Products to suggest alongside a product.
pub async fn recommendations(
    State(state): State<AppState>,
    ActiveClient { client, .. }: ActiveClient,
    Path(id): Path<ProductId>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<Vec<ProductWithPrice>>> {
    let limit = page_limit(query.limit, 4, 10)?;
    let catalog = CatalogRepository::new(state.pool());

    let product = catalog
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let recommended = catalog
        .recommendations(&product, limit)
        .await?
        .into_iter()
        .map(|p| ProductWithPrice::new(p, client.discount_percent))
        .collect();
    Ok(Json(recommended))
}
