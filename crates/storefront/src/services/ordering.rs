//! Order placement.
//!
//! One transaction per order: the client row and the product rows (in id
//! order) are locked, the order is quoted against the locked values, and
//! stock, bonus balance, debt and the first-order flag are updated before
//! commit. Notifications go out after commit.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use snacklane_core::pricing::{PricedLine, QuoteError, merge_lines, quote_order};
use snacklane_core::{ClientId, ClientStatus, OrderId, ProductId, lenient_amount};

use crate::db::orders::{self as order_db, NewOrder};
use crate::db::{CartRepository, OrderRepository, RepositoryError, cart, outreach};
use crate::error::AppError;
use crate::models::{Order, User};
use crate::services::notifications;
use crate::state::AppState;

/// One requested product line.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Order placement request.
///
/// Without `items` (or with an empty list) the user's cart is ordered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
    pub delivery_address: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    /// `morning`, `afternoon` or `evening`.
    pub delivery_time_slot: Option<String>,
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount::deserialize")]
    pub bonus_to_use: Decimal,
}

/// Order number in the form `ORD-YYYYMMDDHHMMSS-NNNN`.
#[must_use]
pub fn order_number(now: DateTime<Utc>, suffix: u16) -> String {
    format!("ORD-{}-{:04}", now.format("%Y%m%d%H%M%S"), suffix % 10_000)
}

fn random_order_number(now: DateTime<Utc>) -> String {
    order_number(now, rand::rng().random_range(0..10_000))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Place an order for an active client.
///
/// # Errors
///
/// Returns `AppError::Quote` when the order breaks a pricing rule,
/// `AppError::NotFound` for unknown or inactive products,
/// `AppError::Forbidden` when the client is no longer active, and
/// `AppError::Database` on storage failures.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn place_order(
    state: &AppState,
    user: &User,
    client_id: ClientId,
    request: OrderRequest,
) -> Result<Order, AppError> {
    let settings = state.shop_settings().await?;

    let from_cart = request.items.is_empty();
    let requested = if from_cart {
        CartRepository::new(state.pool()).items(user.id).await?
    } else {
        request
            .items
            .iter()
            .map(|line| (line.product_id, line.quantity))
            .collect()
    };
    let lines = merge_lines(requested)?;
    let ids: Vec<ProductId> = lines.iter().map(|(id, _)| *id).collect();

    let mut tx = state.pool().begin().await.map_err(RepositoryError::from)?;

    let client = order_db::lock_client(&mut tx, client_id).await?;
    if client.status != ClientStatus::Active {
        return Err(AppError::Forbidden(format!(
            "Client status: {}",
            client.status
        )));
    }

    let products: HashMap<ProductId, order_db::LockedProduct> = order_db::lock_products(&mut tx, &ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut priced = Vec::with_capacity(lines.len());
    for (product_id, quantity) in &lines {
        let product = products
            .get(product_id)
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Product {product_id} not found")))?;
        priced.push(PricedLine {
            product_id: *product_id,
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
            quantity: *quantity,
        });
    }

    let quote = quote_order(&priced, &client.terms(), request.bonus_to_use, &settings)?;

    let number = random_order_number(Utc::now());
    let new_order = NewOrder {
        order_number: &number,
        client_id: client.id,
        manager_id: client.manager_id,
        delivery_address: non_empty(request.delivery_address.as_deref())
            .or(client.address.as_deref()),
        delivery_date: request.delivery_date,
        delivery_time_slot: non_empty(request.delivery_time_slot.as_deref()),
        comment: non_empty(request.comment.as_deref()),
    };
    let order = order_db::insert_order(&mut tx, &new_order, &quote, user.id).await?;

    let mut low_stock = Vec::new();
    for line in &quote.lines {
        let remaining = order_db::decrement_stock(&mut tx, line.product_id, line.quantity)
            .await?
            .ok_or_else(|| QuoteError::InsufficientStock {
                product_id: line.product_id,
                name: line.name.clone(),
                available: 0,
                requested: line.quantity,
            })?;
        if remaining < settings.low_stock_threshold {
            low_stock.push((line.name.clone(), remaining));
        }
    }

    if order.bonus_used > Decimal::ZERO {
        order_db::spend_bonus(&mut tx, client.id, &order).await?;
    }
    order_db::charge_client(
        &mut tx,
        client.id,
        order.final_total,
        quote.uses_first_order_discount(),
    )
    .await?;

    if from_cart {
        cart::clear(&mut tx, user.id).await?;
    }
    outreach::mark_converted(&mut tx, client.id, order.id).await?;

    tx.commit().await.map_err(RepositoryError::from)?;

    info!(
        order_number = %order.order_number,
        final_total = %order.final_total,
        items = order.items.len(),
        "Order placed"
    );

    let notify_state = state.clone();
    let notify_order = order.clone();
    tokio::spawn(async move {
        notifications::notify_new_order(&notify_state, &client, &notify_order).await;
        notifications::notify_low_stock(&notify_state, &low_stock).await;
    });

    Ok(order)
}

/// Place a new order with the items of a previous one.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the order does not belong to the client,
/// otherwise the same errors as [`place_order`].
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn repeat_order(
    state: &AppState,
    user: &User,
    client_id: ClientId,
    order_id: OrderId,
) -> Result<Order, AppError> {
    let previous = OrderRepository::new(state.pool())
        .get(client_id, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let request = OrderRequest {
        items: previous
            .items
            .iter()
            .map(|item| OrderLineRequest {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
        delivery_address: previous.delivery_address.clone(),
        delivery_date: None,
        delivery_time_slot: previous.delivery_time_slot.clone(),
        comment: Some(format!("Repeat of order {}", previous.order_number)),
        bonus_to_use: Decimal::ZERO,
    };

    place_order(state, user, client_id, request).await
}
