//! Orders with line items and status history.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use snacklane_core::{ClientId, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// An order as listed for staff.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub client_id: ClientId,
    pub company_name: String,
    pub manager_id: Option<UserId>,
    pub status: OrderStatus,
    pub total: Decimal,
    pub discount_amount: Decimal,
    pub bonus_used: Decimal,
    pub final_total: Decimal,
    pub delivery_address: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time_slot: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
    /// Only filled for single-order reads.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<OrderHistoryEntry>,
}

impl Order {
    /// Amount bonuses accrue on: total after discounts, before bonus redemption.
    #[must_use]
    pub fn net_amount(&self) -> Decimal {
        self.total - self.discount_amount
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

/// One status change.
#[derive(Debug, Clone, Serialize)]
pub struct OrderHistoryEntry {
    pub status: OrderStatus,
    pub changed_by: Option<UserId>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
