//! Telegram notifications to clients and admins.
//!
//! Sending never fails the staff action that triggered it: delivery errors
//! are logged and dropped.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use snacklane_core::{OrderStatus, TelegramId, format_tenge};
use snacklane_telegram::escape_html;

use crate::db::StaffRepository;
use crate::models::{Client, Order};
use crate::state::AppState;

/// Message for a client whose registration was approved.
#[must_use]
pub fn client_approved_message(client: &Client) -> String {
    format!(
        "✅ <b>Ваша регистрация одобрена!</b>\n\n\
         Теперь вы можете делать заказы.\n\n\
         💰 Бонусный баланс: {}\n\
         💳 Кредитный лимит: {}\n\
         🎁 Скидка: {}%",
        format_tenge(client.bonus_balance),
        format_tenge(client.credit_limit),
        client.discount_percent.normalize(),
    )
}

/// Message for a client whose order changed status.
///
/// `earned_bonus` is the amount credited on delivery.
#[must_use]
pub fn status_changed_message(order: &Order, status: OrderStatus, earned_bonus: Decimal) -> String {
    let body = match status {
        OrderStatus::Confirmed => "✅ Ваш заказ подтвержден!\n\nМы начали сборку заказа.".to_string(),
        OrderStatus::Preparing => "📦 Ваш заказ собирается!\n\nСкоро отправим в доставку.".to_string(),
        OrderStatus::Delivering => "🚚 Ваш заказ в пути!\n\nСкоро доставим.".to_string(),
        OrderStatus::Delivered => {
            let mut text = String::from("✅ Ваш заказ доставлен!");
            if earned_bonus > Decimal::ZERO {
                let _ = write!(text, "\n\n🎁 Начислено бонусов: {}", format_tenge(earned_bonus));
            }
            text.push_str("\n\nСпасибо за заказ! 🙏");
            text
        }
        OrderStatus::Cancelled => {
            "❌ Ваш заказ отменен.\n\nСвяжитесь с менеджером для уточнения.".to_string()
        }
        OrderStatus::New => format!("📊 Статус заказа: {}", status.label()),
    };
    format!(
        "<b>Заказ {}</b>\n\n{body}",
        escape_html(&order.order_number)
    )
}

/// Admins to alert: active admin users plus `ADMIN_TELEGRAM_IDS`.
pub async fn admin_recipients(state: &AppState) -> Vec<TelegramId> {
    let mut recipients = match StaffRepository::new(state.pool()).admin_telegram_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            warn!(error = %e, "Failed to load admin recipients");
            Vec::new()
        }
    };
    recipients.extend(state.config().telegram.admin_ids.iter().copied());
    recipients.sort_unstable();
    recipients.dedup();
    recipients
}

/// Send a message, logging failures.
///
/// Returns whether the Bot API accepted it.
pub async fn send(state: &AppState, chat_id: TelegramId, text: &str) -> bool {
    match state.bot().send_message(chat_id, text).await {
        Ok(()) => true,
        Err(e) => {
            warn!(chat_id = %chat_id, error = %e, "Failed to send notification");
            false
        }
    }
}

/// Tell a client their registration was approved.
#[instrument(skip_all, fields(client_id = %client.id))]
pub async fn notify_client_approved(state: &AppState, client: &Client) {
    send(state, client.telegram_id, &client_approved_message(client)).await;
}

/// Tell a client their order changed status.
#[instrument(skip_all, fields(order_number = %order.order_number, status = %status))]
pub async fn notify_status_changed(
    state: &AppState,
    chat_id: TelegramId,
    order: &Order,
    status: OrderStatus,
    earned_bonus: Decimal,
) {
    send(
        state,
        chat_id,
        &status_changed_message(order, status, earned_bonus),
    )
    .await;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use snacklane_core::{ClientId, ClientStatus, OrderId, UserId};

    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::new(1),
            order_number: "ORD-20250301120000-0042".to_string(),
            client_id: ClientId::new(3),
            company_name: "ТОО Ромашка".to_string(),
            manager_id: None,
            status: OrderStatus::Delivering,
            total: Decimal::from(25_000),
            discount_amount: Decimal::ZERO,
            bonus_used: Decimal::ZERO,
            final_total: Decimal::from(25_000),
            delivery_address: None,
            delivery_date: None,
            delivery_time_slot: None,
            comment: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            delivered_at: None,
            items: Vec::new(),
            history: Vec::new(),
        }
    }

    #[test]
    fn test_delivered_message_mentions_earned_bonus() {
        let text = status_changed_message(&order(), OrderStatus::Delivered, Decimal::from(500));
        assert!(text.starts_with("<b>Заказ ORD-20250301120000-0042</b>"));
        assert!(text.contains("Начислено бонусов: 500₸"));
    }

    #[test]
    fn test_cancelled_message_has_no_bonus_line() {
        let text = status_changed_message(&order(), OrderStatus::Cancelled, Decimal::ZERO);
        assert!(text.contains("отменен"));
        assert!(!text.contains("бонусов"));
    }

    #[test]
    fn test_client_approved_message() {
        let client = Client {
            id: ClientId::new(3),
            user_id: UserId::new(3),
            telegram_id: TelegramId::new(300),
            username: None,
            company_name: "ТОО Ромашка".to_string(),
            address: None,
            bin_iin: None,
            contact_phone: None,
            manager_id: None,
            status: ClientStatus::Active,
            discount_percent: Decimal::new(500, 2),
            bonus_balance: Decimal::from(5_000),
            credit_limit: Decimal::from(500_000),
            debt: Decimal::ZERO,
            payment_delay_days: 14,
            first_order_discount_used: false,
            created_at: Utc::now(),
            approved_at: Some(Utc::now()),
        };
        let text = client_approved_message(&client);
        assert!(text.contains("Бонусный баланс: 5,000₸"));
        assert!(text.contains("Кредитный лимит: 500,000₸"));
        assert!(text.contains("Скидка: 5%"));
    }
}
