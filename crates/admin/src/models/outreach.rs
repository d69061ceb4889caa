//! Proactive outreach settings, log and statistics.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use snacklane_core::{ClientId, OrderId, OutreachMessageId, TelegramId};

/// Scheduler settings (single row).
#[derive(Debug, Clone, Serialize)]
pub struct OutreachSettings {
    pub enabled: bool,
    pub send_hour: i16,
    pub send_minute: i16,
    /// ISO weekdays, Monday = 1.
    pub send_days: Vec<i16>,
    pub trigger_days_no_order: i32,
    pub trigger_bonus_amount: Decimal,
    pub trigger_bonus_expiry_days: i32,
    pub max_messages_per_day: i32,
    pub min_days_between_messages: i32,
    pub excluded_dates: Vec<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

/// A message sent by the scheduler.
#[derive(Debug, Clone, Serialize)]
pub struct OutreachMessage {
    pub id: OutreachMessageId,
    pub client_id: ClientId,
    pub company_name: String,
    pub reason: String,
    pub message_text: String,
    pub sent_at: DateTime<Utc>,
    pub client_responded: bool,
    pub resulted_in_order: bool,
    pub order_id: Option<OrderId>,
}

/// What the candidate selection knows about a client.
#[derive(Debug, Clone)]
pub struct ClientSnapshot {
    pub client_id: ClientId,
    pub telegram_id: TelegramId,
    pub company_name: String,
    pub bonus_balance: Decimal,
    /// Earned bonus expiring within the configured window.
    pub expiring_bonus: Decimal,
    pub last_order_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// Effectiveness of outreach over a period.
#[derive(Debug, Clone, Serialize)]
pub struct OutreachStats {
    pub period_days: i32,
    pub total: i64,
    pub responded: i64,
    pub resulted_in_orders: i64,
    /// Percent, one decimal place.
    pub response_rate: Decimal,
    /// Percent, one decimal place.
    pub order_conversion_rate: Decimal,
}

impl OutreachStats {
    #[must_use]
    pub fn new(period_days: i32, total: i64, responded: i64, resulted_in_orders: i64) -> Self {
        let rate = |part: i64| {
            if total == 0 {
                Decimal::ZERO
            } else {
                (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(1)
            }
        };
        Self {
            period_days,
            total,
            responded,
            resulted_in_orders,
            response_rate: rate(responded),
            order_conversion_rate: rate(resulted_in_orders),
        }
    }
}
