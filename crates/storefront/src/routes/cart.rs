//! Cart routes. Every mutation responds with the updated cart.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use snacklane_core::ProductId;

use crate::db::{CartRepository, CatalogRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::ActiveClient;
use crate::models::{CartView, Client, User};
use crate::state::AppState;

/// Body of `POST /api/cart`.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Body of `PUT /api/cart/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i32,
}

fn positive(quantity: i32) -> Result<i32> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "Quantity must be greater than zero".to_string(),
        ));
    }
    Ok(quantity)
}

async fn view(state: &AppState, user: &User, client: &Client) -> Result<Json<CartView>> {
    let settings = state.shop_settings().await?;
    let lines = CartRepository::new(state.pool()).lines(user.id).await?;
    Ok(Json(CartView::build(
        lines,
        client.discount_percent,
        &settings.tiers,
    )))
}

/// Current cart.
pub async fn show(
    State(state): State<AppState>,
    ActiveClient { user, client }: ActiveClient,
) -> Result<Json<CartView>> {
    view(&state, &user, &client).await
}

/// Add a product, increasing the quantity if it is already in the cart.
pub async fn add(
    State(state): State<AppState>,
    ActiveClient { user, client }: ActiveClient,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartView>> {
    let quantity = positive(body.quantity)?;

    CatalogRepository::new(state.pool())
        .get_product(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    CartRepository::new(state.pool())
        .add(user.id, body.product_id, quantity)
        .await?;
    view(&state, &user, &client).await
}

/// Replace the quantity of a cart line.
pub async fn update(
    State(state): State<AppState>,
    ActiveClient { user, client }: ActiveClient,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartView>> {
    let quantity = positive(body.quantity)?;

    CartRepository::new(state.pool())
        .set_quantity(user.id, product_id, quantity)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Item not found in cart".to_string()),
            other => AppError::Database(other),
        })?;
    view(&state, &user, &client).await
}

/// Remove a product from the cart.
pub async fn remove(
    State(state): State<AppState>,
    ActiveClient { user, client }: ActiveClient,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    CartRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    view(&state, &user, &client).await
}

/// Empty the cart.
pub async fn clear(
    State(state): State<AppState>,
    ActiveClient { user, client }: ActiveClient,
) -> Result<Json<CartView>> {
    CartRepository::new(state.pool()).clear(user.id).await?;
    view(&state, &user, &client).await
}
