//! User and client domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use snacklane_core::pricing::ClientTerms;
use snacklane_core::{ClientId, ClientStatus, TelegramId, UserId, UserRole};

/// A Telegram user known to the shop.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub telegram_id: TelegramId,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    /// Blocked users are rejected by every authenticated endpoint.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl User {
    /// Name shown to staff in notifications.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.username
            .as_deref()
            .map_or_else(|| format!("ID: {}", self.telegram_id), |u| format!("@{u}"))
    }
}

/// Business profile of a client, 1:1 with a [`User`].
#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub id: ClientId,
    pub user_id: UserId,
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

impl Client {
    /// Commercial terms used when quoting an order.
    #[must_use]
    pub const fn terms(&self) -> ClientTerms {
        ClientTerms {
            discount_percent: self.discount_percent,
            bonus_balance: self.bonus_balance,
            credit_limit: self.credit_limit,
            debt: self.debt,
            first_order_discount_available: !self.first_order_discount_used,
        }
    }

    /// Credit still available for new orders.
    #[must_use]
    pub fn available_credit(&self) -> Decimal {
        (self.credit_limit - self.debt).max(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client {
            id: ClientId::new(1),
            user_id: UserId::new(1),
            company_name: "ТОО Ромашка".to_string(),
            address: None,
            bin_iin: None,
            contact_phone: None,
            manager_id: None,
            status: ClientStatus::Active,
            discount_percent: Decimal::from(5),
            bonus_balance: Decimal::from(1_000),
            credit_limit: Decimal::from(100_000),
            debt: Decimal::from(120_000),
            payment_delay_days: 14,
            first_order_discount_used: false,
            created_at: Utc::now(),
            approved_at: None,
        }
    }

    #[test]
    fn test_terms_reflect_first_order_flag() {
        let mut c = client();
        assert!(c.terms().first_order_discount_available);
        c.first_order_discount_used = true;
        assert!(!c.terms().first_order_discount_available);
    }

    #[test]
    fn test_available_credit_never_negative() {
        assert_eq!(client().available_credit(), Decimal::ZERO);
    }

    #[test]
    fn test_display_name() {
        let now = Utc::now();
        let mut user = User {
            id: UserId::new(1),
            telegram_id: TelegramId::new(777),
            username: Some("shop_owner".to_string()),
            phone: None,
            role: UserRole::Client,
            is_active: true,
            created_at: now,
            last_active: now,
        };
        assert_eq!(user.display_name(), "@shop_owner");
        user.username = None;
        assert_eq!(user.display_name(), "ID: 777");
    }
}
