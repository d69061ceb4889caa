//! Telegram notifications to staff.
//!
//! Sending never fails the request that triggered it: delivery errors are
//! logged and dropped. Callers usually spawn these so the client does not
//! wait on the Bot API.

use std::fmt::Write as _;

use tracing::{instrument, warn};

use snacklane_core::{TelegramId, UserId, format_tenge};
use snacklane_telegram::escape_html;

use crate::db::UserRepository;
use crate::models::{Client, Order, User};
use crate::state::AppState;

/// Message for staff about a new registration.
#[must_use]
pub fn registration_message(user: &User, client: &Client) -> String {
    let mut text = format!(
        "🆕 <b>Новая заявка на регистрацию</b>\n\nКомпания: {}\nПользователь: {}",
        escape_html(&client.company_name),
        escape_html(&user.display_name()),
    );
    if let Some(bin) = &client.bin_iin {
        let _ = write!(text, "\nБИН/ИИН: {}", escape_html(bin));
    }
    if let Some(phone) = &client.contact_phone {
        let _ = write!(text, "\nТелефон: {}", escape_html(phone));
    }
    if let Some(address) = &client.address {
        let _ = write!(text, "\nАдрес: {}", escape_html(address));
    }
    text.push_str("\n\nОдобрите клиента в панели администратора.");
    text
}

/// Message for staff about a new order.
#[must_use]
pub fn new_order_message(client: &Client, order: &Order) -> String {
    let mut text = format!(
        "🛒 <b>Новый заказ {}</b>\n\nКлиент: {}\n",
        escape_html(&order.order_number),
        escape_html(&client.company_name),
    );
    for item in &order.items {
        let _ = writeln!(
            text,
            "• {} × {} = {}",
            escape_html(&item.product_name),
            item.quantity,
            format_tenge(item.subtotal)
        );
    }
    let _ = write!(text, "\nСумма: {}", format_tenge(order.total));
    if !order.discount_amount.is_zero() {
        let _ = write!(text, "\nСкидка: {}", format_tenge(order.discount_amount));
    }
    if !order.bonus_used.is_zero() {
        let _ = write!(text, "\nБонусы: {}", format_tenge(order.bonus_used));
    }
    let _ = write!(text, "\n<b>К оплате: {}</b>", format_tenge(order.final_total));
    if let Some(address) = &order.delivery_address {
        let _ = write!(text, "\nАдрес: {}", escape_html(address));
    }
    if let Some(date) = order.delivery_date {
        let _ = write!(text, "\nДоставка: {}", date.format("%d.%m.%Y"));
        if let Some(slot) = &order.delivery_time_slot {
            let _ = write!(text, " ({})", escape_html(slot));
        }
    }
    if let Some(comment) = &order.comment {
        let _ = write!(text, "\nКомментарий: {}", escape_html(comment));
    }
    text
}

/// Message for admins about products running out.
#[must_use]
pub fn low_stock_message(items: &[(String, i32)]) -> String {
    let mut text = String::from("⚠️ <b>Заканчиваются товары</b>\n");
    for (name, stock) in items {
        let _ = write!(text, "\n• {}: осталось {stock} шт.", escape_html(name));
    }
    text
}

/// Admins to alert: active admin users plus `ADMIN_TELEGRAM_IDS`.
async fn admin_recipients(state: &AppState) -> Vec<TelegramId> {
    let mut recipients = match UserRepository::new(state.pool()).admin_telegram_ids().await {
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

async fn send_all(state: &AppState, recipients: &[TelegramId], text: &str) {
    for chat_id in recipients {
        if let Err(e) = state.bot().send_message(*chat_id, text).await {
            warn!(chat_id = %chat_id, error = %e, "Failed to send notification");
        }
    }
}

/// Tell admins about a new registration.
#[instrument(skip_all, fields(client_id = %client.id))]
pub async fn notify_registration(state: &AppState, user: &User, client: &Client) {
    let recipients = admin_recipients(state).await;
    send_all(state, &recipients, &registration_message(user, client)).await;
}

/// Tell the client's manager about a new order, or the admins when the
/// client has no active manager.
#[instrument(skip_all, fields(order_number = %order.order_number))]
pub async fn notify_new_order(state: &AppState, client: &Client, order: &Order) {
    let manager = match client.manager_id {
        Some(manager_id) => manager_chat(state, manager_id).await,
        None => None,
    };

    let recipients = match manager {
        Some(chat_id) => vec![chat_id],
        None => admin_recipients(state).await,
    };
    send_all(state, &recipients, &new_order_message(client, order)).await;
}

async fn manager_chat(state: &AppState, manager_id: UserId) -> Option<TelegramId> {
    match UserRepository::new(state.pool()).get_by_id(manager_id).await {
        Ok(Some(manager)) if manager.is_active => Some(manager.telegram_id),
        Ok(_) => None,
        Err(e) => {
            warn!(manager_id = %manager_id, error = %e, "Failed to load manager");
            None
        }
    }
}

/// Warn admins about products that fell below the low-stock threshold.
#[instrument(skip_all, fields(count = items.len()))]
pub async fn notify_low_stock(state: &AppState, items: &[(String, i32)]) {
    if items.is_empty() {
        return;
    }
    let recipients = admin_recipients(state).await;
    send_all(state, &recipients, &low_stock_message(items)).await;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use snacklane_core::{ClientId, ClientStatus, OrderId, OrderItemId, OrderStatus, ProductId};

    use super::*;
    use crate::models::OrderItem;

    fn client() -> Client {
        Client {
            id: ClientId::new(3),
            user_id: UserId::new(3),
            company_name: "ИП <Ромашка> & Co".to_string(),
            address: Some("Алматы, Абая 1".to_string()),
            bin_iin: Some("123456789012".to_string()),
            contact_phone: None,
            manager_id: None,
            status: ClientStatus::Active,
            discount_percent: Decimal::ZERO,
            bonus_balance: Decimal::ZERO,
            credit_limit: Decimal::from(500_000),
            debt: Decimal::ZERO,
            payment_delay_days: 14,
            first_order_discount_used: false,
            created_at: Utc::now(),
            approved_at: None,
        }
    }

    #[test]
    fn test_new_order_message() {
        let order = Order {
            id: OrderId::new(1),
            order_number: "ORD-20250301120000-0042".to_string(),
            client_id: ClientId::new(3),
            status: OrderStatus::New,
            total: Decimal::from(20_000),
            discount_amount: Decimal::from(2_000),
            bonus_used: Decimal::ZERO,
            final_total: Decimal::from(18_000),
            delivery_address: None,
            delivery_date: None,
            delivery_time_slot: None,
            comment: None,
            created_at: Utc::now(),
            delivered_at: None,
            items: vec![OrderItem {
                id: OrderItemId::new(1),
                product_id: ProductId::new(7),
                product_name: "Квас 1л".to_string(),
                quantity: 40,
                price: Decimal::from(500),
                subtotal: Decimal::from(20_000),
            }],
        };

        let text = new_order_message(&client(), &order);
        assert!(text.contains("ORD-20250301120000-0042"));
        assert!(text.contains("ИП &lt;Ромашка&gt; &amp; Co"));
        assert!(text.contains("• Квас 1л × 40 = 20,000₸"));
        assert!(text.contains("Скидка: 2,000₸"));
        assert!(!text.contains("Бонусы"));
        assert!(text.contains("К оплате: 18,000₸"));
    }

    #[test]
    fn test_low_stock_message() {
        let text = low_stock_message(&[("Чипсы".to_string(), 3)]);
        assert!(text.contains("Чипсы: осталось 3 шт."));
    }
}
