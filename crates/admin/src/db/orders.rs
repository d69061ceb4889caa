//! Order repository for staff.
//!
//! Listing and reads are optionally scoped to a manager. The free functions
//! at the bottom run on a caller-owned transaction and are used by status
//! changes and payments.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use snacklane_core::{ClientId, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderHistoryEntry, OrderItem};

const ORDER_COLUMNS: &str = "o.id, o.order_number, o.client_id, c.company_name, o.manager_id, \
     o.status, o.total, o.discount_amount, o.bonus_used, o.final_total, o.delivery_address, \
     o.delivery_date, o.delivery_time_slot, o.comment, o.created_at, o.updated_at, o.delivered_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, price, subtotal";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    client_id: ClientId,
    company_name: String,
    manager_id: Option<UserId>,
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
    updated_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>, history: Vec<OrderHistoryEntry>) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            client_id: self.client_id,
            company_name: self.company_name,
            manager_id: self.manager_id,
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
            updated_at: self.updated_at,
            delivered_at: self.delivered_at,
            items,
            history,
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
struct HistoryRow {
    status: OrderStatus,
    changed_by: Option<UserId>,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<HistoryRow> for OrderHistoryEntry {
    fn from(row: HistoryRow) -> Self {
        Self {
            status: row.status,
            changed_by: row.changed_by,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

/// Filters for the staff order listing.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub client_id: Option<ClientId>,
    /// Inclusive, by creation date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive, by creation date.
    pub date_to: Option<NaiveDate>,
    /// Restrict to orders assigned to this manager.
    pub manager_id: Option<UserId>,
    pub skip: i64,
    pub limit: i64,
}

/// Repository for orders as managed by staff.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A page of orders, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, filter: &OrderFilter) -> Result<(Vec<Order>, i64), RepositoryError> {
        const WHERE: &str = "WHERE ($1::shop.order_status IS NULL OR o.status = $1) \
               AND ($2::INTEGER IS NULL OR o.client_id = $2) \
               AND ($3::DATE IS NULL OR o.created_at >= $3::DATE) \
               AND ($4::DATE IS NULL OR o.created_at < $4::DATE + 1) \
               AND ($5::INTEGER IS NULL OR o.manager_id = $5)";

        let total_count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM shop.orders o {WHERE}"
        ))
        .bind(filter.status)
        .bind(filter.client_id)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(filter.manager_id)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders o \
             JOIN shop.clients c ON c.id = o.client_id \
             {WHERE} \
             ORDER BY o.created_at DESC, o.id DESC \
             OFFSET $6 LIMIT $7"
        ))
        .bind(filter.status)
        .bind(filter.client_id)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(filter.manager_id)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let mut items = items_for(&mut conn, &ids).await?;

        let orders = rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines, Vec::new())
            })
            .collect();

        Ok((orders, total_count))
    }

    /// An order with its items and status history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = fetch_order(&mut conn, id, false).await? else {
            return Ok(None);
        };

        let history = sqlx::query_as::<_, HistoryRow>(
            "SELECT status, changed_by, comment, created_at FROM shop.order_history \
             WHERE order_id = $1 ORDER BY created_at, id",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(Order {
            history: history.into_iter().map(OrderHistoryEntry::from).collect(),
            ..order
        }))
    }
}

async fn items_for(
    conn: &mut PgConnection,
    order_ids: &[i32],
) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM shop.order_items WHERE order_id = ANY($1) ORDER BY id"
    ))
    .bind(order_ids)
    .fetch_all(conn)
    .await?;

    let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row.into());
    }
    Ok(grouped)
}

async fn fetch_order(
    conn: &mut PgConnection,
    id: OrderId,
    for_update: bool,
) -> Result<Option<Order>, RepositoryError> {
    let lock = if for_update { "FOR UPDATE OF o" } else { "" };
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.orders o \
         JOIN shop.clients c ON c.id = o.client_id \
         WHERE o.id = $1 {lock}"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let items = items_for(conn, &[row.id.as_i32()])
        .await?
        .remove(&row.id)
        .unwrap_or_default();
    Ok(Some(row.into_order(items, Vec::new())))
}

// =============================================================================
// Status changes (transactional)
// =============================================================================

/// Lock an order row and read it with its items.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order does not exist.
pub async fn lock_order(conn: &mut PgConnection, id: OrderId) -> Result<Order, RepositoryError> {
    fetch_order(conn, id, true)
        .await?
        .ok_or(RepositoryError::NotFound)
}

/// Store the new status; `delivered` also stamps `delivered_at`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.orders SET status = $2, updated_at = NOW(), \
             delivered_at = CASE WHEN $2 = 'delivered'::shop.order_status \
                                 THEN NOW() ELSE delivered_at END \
         WHERE id = $1",
    )
    .bind(id)
    .bind(status)
    .execute(conn)
    .await?;
    Ok(())
}

/// Append a status history entry.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn add_history(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
    changed_by: UserId,
    comment: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO shop.order_history (order_id, status, changed_by, comment) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(status)
    .bind(changed_by)
    .bind(comment)
    .execute(conn)
    .await?;
    Ok(())
}

/// Put the quantities of a cancelled order back in stock.
///
/// Rows are updated in product id order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an update fails.
pub async fn restore_stock(
    conn: &mut PgConnection,
    items: &[OrderItem],
) -> Result<(), RepositoryError> {
    let mut sorted: Vec<&OrderItem> = items.iter().collect();
    sorted.sort_by_key(|item| item.product_id);
    for item in sorted {
        sqlx::query(
            "UPDATE shop.products SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(item.product_id)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Reduce a client's debt, flooring at zero.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the client does not exist.
pub async fn reduce_debt(
    conn: &mut PgConnection,
    client_id: ClientId,
    amount: Decimal,
) -> Result<(), RepositoryError> {
    let result =
        sqlx::query("UPDATE shop.clients SET debt = GREATEST(debt - $2, 0) WHERE id = $1")
            .bind(client_id)
            .bind(amount)
            .execute(conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
