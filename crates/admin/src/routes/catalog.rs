//! Product and category management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use snacklane_core::{CategoryId, ProductId};

use super::{page_limit, page_skip};
use crate::db::{CatalogRepository, NewProduct, ProductFilter, ProductUpdate, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::{Category, Product, Staff};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

fn required_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    Ok(name)
}

fn check_amounts(price: Option<Decimal>, stock: Option<i32>) -> Result<()> {
    if price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(AppError::BadRequest("Price must not be negative".to_string()));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("Stock must not be negative".to_string()));
    }
    Ok(())
}

fn category_not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}

fn product_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
        other => other.into(),
    }
}

/// All products, including inactive ones unless filtered.
pub async fn list_products(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = ProductFilter {
        category_id: query.category_id,
        search: query.search,
        is_active: query.is_active,
        skip: page_skip(query.skip)?,
        limit: page_limit(query.limit, 50)?,
    };
    let products = CatalogRepository::new(state.pool())
        .list_products(&filter)
        .await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = CatalogRepository::new(state.pool())
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    _staff: Staff,
    Json(mut new): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    new.name = required_name(&new.name)?.to_string();
    check_amounts(Some(new.price), Some(new.stock))?;

    let product = CatalogRepository::new(state.pool())
        .create_product(&new)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => category_not_found(),
            other => other.into(),
        })?;

    tracing::info!(product_id = %product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<ProductId>,
    Json(mut update): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    if let Some(name) = &update.name {
        update.name = Some(required_name(name)?.to_string());
    }
    check_amounts(update.price, update.stock)?;

    let repo = CatalogRepository::new(state.pool());
    if let Some(category_id) = update.category_id
        && !repo.category_exists(category_id).await?
    {
        return Err(category_not_found());
    }

    let product = repo
        .update_product(id, &update)
        .await
        .map_err(product_not_found)?;
    Ok(Json(product))
}

/// Deactivate a product. Past orders keep referencing it.
pub async fn delete_product(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    CatalogRepository::new(state.pool())
        .deactivate_product(id)
        .await
        .map_err(product_not_found)?;

    tracing::info!(product_id = %id, "Product deactivated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(
    State(state): State<AppState>,
    _staff: Staff,
) -> Result<Json<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool())
        .list_categories()
        .await?;
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    _staff: Staff,
    Json(new): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    let name = required_name(&new.name)?;
    let category = CatalogRepository::new(state.pool())
        .create_category(name, new.sort_order)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<CategoryId>,
    Json(update): Json<CategoryUpdate>,
) -> Result<Json<Category>> {
    let name = update.name.as_deref().map(required_name).transpose()?;
    let category = CatalogRepository::new(state.pool())
        .update_category(id, name, update.sort_order, update.is_active)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => category_not_found(),
            other => other.into(),
        })?;
    Ok(Json(category))
}
