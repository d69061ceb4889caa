//! Order, bonus ledger and statistics domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use snacklane_core::{
    BonusKind, BonusTransactionId, ClientId, OrderId, OrderItemId, OrderStatus, ProductId,
};

/// A placed order with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub client_id: ClientId,
    pub status: OrderStatus,
    /// Sum of line subtotals at list price.
    pub total: Decimal,
    /// Client discount plus first-order discount.
    pub discount_amount: Decimal,
    pub bonus_used: Decimal,
    /// `total - discount_amount - bonus_used`
    pub final_total: Decimal,
    pub delivery_address: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time_slot: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
}

/// A line of an order, priced at order time.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

/// An entry of the client's bonus ledger.
#[derive(Debug, Clone, Serialize)]
pub struct BonusTransaction {
    pub id: BonusTransactionId,
    /// Signed: positive for earn/refund, negative for spend/expire.
    pub amount: Decimal,
    pub kind: BonusKind,
    pub order_id: Option<OrderId>,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Purchase statistics shown on the client's profile.
#[derive(Debug, Clone, Serialize)]
pub struct ClientStats {
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub average_order: Decimal,
    pub top_products: Vec<TopProduct>,
}

/// A frequently ordered product.
#[derive(Debug, Clone, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
}
