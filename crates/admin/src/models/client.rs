//! Client profiles as seen by staff.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use snacklane_core::{ClientId, ClientStatus, TelegramId, UserId};

/// A client with the Telegram identity of its user.
#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub id: ClientId,
    pub user_id: UserId,
    pub telegram_id: TelegramId,
    pub username: Option<String>,
    pub company_name: String,
    pub address: Option<String>,
    pub bin_iin: Option<String>,
    pub contact_phone: Option<String>,
    pub manager_id: Option<UserId>,
    pub status: ClientStatus,
    pub discount_percent: Decimal,
    pub bonus_balance: Decimal,
    pub credit_limit: Decimal,
    pub debt: Decimal,
    pub payment_delay_days: i32,
    pub first_order_discount_used: bool,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}
