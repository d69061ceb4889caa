//! Order repository.
//!
//! Reads are scoped to a client. The free functions at the bottom run on a
//! caller-owned transaction and are used by order placement.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use snacklane_core::pricing::OrderQuote;
use snacklane_core::{
    ClientId, OrderId, OrderItemId, OrderStatus, ProductId, UserId, round_money,
};

use super::RepositoryError;
use super::users::{CLIENT_COLUMNS, ClientRow};
use crate::models::{Client, ClientStats, Order, OrderItem, TopProduct};

const ORDER_COLUMNS: &str = "id, order_number, client_id, status, total, discount_amount, \
     bonus_used, final_total, delivery_address, delivery_date, delivery_time_slot, comment, \
     created_at, delivered_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, price, subtotal";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    client_id: ClientId,
    status: OrderStatus,
    total: Decimal,
    discount_amount: Decimal,
    bonus_used: Decimal,
    final_total: Decimal,
    delivery_address: Option<String>,
    delivery_date: Option<NaiveDate>,
    delivery_time_slot: Option<String>,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            client_id: self.client_id,
            status: self.status,
            total: self.total,
            discount_amount: self.discount_amount,
            bonus_used: self.bonus_used,
            final_total: self.final_total,
            delivery_address: self.delivery_address,
            delivery_date: self.delivery_date,
            delivery_time_slot: self.delivery_time_slot,
            comment: self.comment,
            created_at: self.created_at,
            delivered_at: self.delivered_at,
            items,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    product_name: String,
    quantity: i32,
    price: Decimal,
    subtotal: Decimal,
}

impl From<ItemRow> for OrderItem {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            price: row.price,
            subtotal: row.subtotal,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TopProductRow {
    product_id: ProductId,
    name: String,
    quantity: i64,
}

/// Repository for a client's orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A page of the client's orders, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        client_id: ClientId,
        status: Option<OrderStatus>,
        skip: i64,
        limit: i64,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let total_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.orders \
             WHERE client_id = $1 AND ($2::shop.order_status IS NULL OR status = $2)",
        )
        .bind(client_id)
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders \
             WHERE client_id = $1 AND ($2::shop.order_status IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC \
             OFFSET $3 LIMIT $4"
        ))
        .bind(client_id)
        .bind(status)
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let mut items = self.items_for(&ids).await?;

        let orders = rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect();

        Ok((orders, total_count))
    }

    /// One of the client's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(
        &self,
        client_id: ClientId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1 AND client_id = $2"
        ))
        .bind(order_id)
        .bind(client_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let lines = self
            .items_for(&[row.id.as_i32()])
            .await?
            .remove(&row.id)
            .unwrap_or_default();
        Ok(Some(row.into_order(lines)))
    }

    async fn items_for(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM shop.order_items WHERE order_id = ANY($1) ORDER BY id"
        ))
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    /// Purchase statistics over non-cancelled orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn stats(&self, client_id: ClientId) -> Result<ClientStats, RepositoryError> {
        let (total_orders, total_spent) = sqlx::query_as::<_, (i64, Decimal)>(
            "SELECT COUNT(*), COALESCE(SUM(final_total), 0) FROM shop.orders \
             WHERE client_id = $1 AND status <> 'cancelled'",
        )
        .bind(client_id)
        .fetch_one(self.pool)
        .await?;

        let top = sqlx::query_as::<_, TopProductRow>(
            "SELECT oi.product_id, MAX(oi.product_name) AS name, \
                    SUM(oi.quantity)::BIGINT AS quantity \
             FROM shop.order_items oi \
             JOIN shop.orders o ON o.id = oi.order_id \
             WHERE o.client_id = $1 AND o.status <> 'cancelled' \
             GROUP BY oi.product_id \
             ORDER BY quantity DESC, oi.product_id \
             LIMIT 5",
        )
        .bind(client_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ClientStats {
            total_orders,
            total_spent,
            average_order: average(total_spent, total_orders),
            top_products: top
                .into_iter()
                .map(|row| TopProduct {
                    product_id: row.product_id,
                    name: row.name,
                    quantity: row.quantity,
                })
                .collect(),
        })
    }
}

fn average(total: Decimal, count: i64) -> Decimal {
    if count <= 0 {
        return Decimal::ZERO;
    }
    round_money(total / Decimal::from(count))
}

// =============================================================================
// Placement (transactional)
// =============================================================================

/// A product row locked for the duration of an order transaction.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
}

/// Order header values that do not come from the quote.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_number: &'a str,
    pub client_id: ClientId,
    pub manager_id: Option<UserId>,
    pub delivery_address: Option<&'a str>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time_slot: Option<&'a str>,
    pub comment: Option<&'a str>,
}

/// Lock the client row.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the client does not exist.
pub async fn lock_client(
    conn: &mut PgConnection,
    client_id: ClientId,
) -> Result<Client, RepositoryError> {
    let row = sqlx::query_as::<_, ClientRow>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM shop.clients WHERE id = $1 FOR UPDATE"
    ))
    .bind(client_id)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

/// Lock product rows in ascending id order.
///
/// Missing ids are simply absent from the result.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_products(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<LockedProduct>, RepositoryError> {
    let ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
    let rows = sqlx::query_as::<_, LockedProduct>(
        "SELECT id, name, price, stock, is_active FROM shop.products \
         WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(ids)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Insert the order header, its items and the initial history entry.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the order number is taken.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn insert_order(
    conn: &mut PgConnection,
    new: &NewOrder<'_>,
    quote: &OrderQuote,
    created_by: UserId,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO shop.orders \
             (order_number, client_id, manager_id, total, discount_amount, bonus_used, \
              final_total, status, delivery_address, delivery_date, delivery_time_slot, comment) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'new', $8, $9, $10, $11) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(new.order_number)
    .bind(new.client_id)
    .bind(new.manager_id)
    .bind(quote.total)
    .bind(quote.discount_amount)
    .bind(quote.bonus_used)
    .bind(quote.final_total)
    .bind(new.delivery_address)
    .bind(new.delivery_date)
    .bind(new.delivery_time_slot)
    .bind(new.comment)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| super::conflict_on_unique(e, "Order number collision, please retry"))?;

    let mut items = Vec::with_capacity(quote.lines.len());
    for line in &quote.lines {
        let item = sqlx::query_as::<_, ItemRow>(&format!(
            "INSERT INTO shop.order_items \
                 (order_id, product_id, product_name, quantity, price, subtotal) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(row.id)
        .bind(line.product_id)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.price)
        .bind(line.subtotal)
        .fetch_one(&mut *conn)
        .await?;
        items.push(OrderItem::from(item));
    }

    sqlx::query(
        "INSERT INTO shop.order_history (order_id, status, changed_by, comment) \
         VALUES ($1, 'new', $2, 'Order created')",
    )
    .bind(row.id)
    .bind(created_by)
    .execute(&mut *conn)
    .await?;

    Ok(row.into_order(items))
}

/// Decrement stock if enough is left and return the new level.
///
/// Returns `None` when the product has less than `quantity` in stock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
) -> Result<Option<i32>, RepositoryError> {
    let stock = sqlx::query_scalar::<_, i32>(
        "UPDATE shop.products SET stock = stock - $2, updated_at = NOW() \
         WHERE id = $1 AND stock >= $2 \
         RETURNING stock",
    )
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(conn)
    .await?;
    Ok(stock)
}

/// Record a bonus redemption and take it off the balance.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn spend_bonus(
    conn: &mut PgConnection,
    client_id: ClientId,
    order: &Order,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO shop.bonus_transactions (client_id, amount, kind, order_id, description) \
         VALUES ($1, $2, 'spend', $3, $4)",
    )
    .bind(client_id)
    .bind(-order.bonus_used)
    .bind(order.id)
    .bind(format!("Bonus spent on order {}", order.order_number))
    .execute(&mut *conn)
    .await?;

    sqlx::query("UPDATE shop.clients SET bonus_balance = bonus_balance - $2 WHERE id = $1")
        .bind(client_id)
        .bind(order.bonus_used)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Add the order to the client's debt and consume the first-order discount.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn charge_client(
    conn: &mut PgConnection,
    client_id: ClientId,
    amount: Decimal,
    used_first_order_discount: bool,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.clients \
         SET debt = debt + $2, \
             first_order_discount_used = first_order_discount_used OR $3 \
         WHERE id = $1",
    )
    .bind(client_id)
    .bind(amount)
    .bind(used_first_order_discount)
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average() {
        assert_eq!(average(Decimal::from(100), 0), Decimal::ZERO);
        assert_eq!(average(Decimal::from(100), 3), Decimal::new(3333, 2));
    }
}
