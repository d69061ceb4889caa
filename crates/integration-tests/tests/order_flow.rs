//! Domain flow across pricing, bonuses and order status.
//!
//! Walks one client from the welcome bonus through a first order, delivery
//! and bonus expiry, using the same functions the servers call.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use snacklane_core::bonus::{LedgerTotals, amount_to_expire, delivery_bonus, expires_at};
use snacklane_core::pricing::{ClientTerms, PricedLine, QuoteError, merge_lines, quote_order};
use snacklane_core::settings::ShopSettings;
use snacklane_core::{OrderStatus, ProductId, format_tenge};

fn lines() -> Vec<PricedLine> {
    vec![
        PricedLine {
            product_id: ProductId::new(1),
            name: "Чипсы 150 г".to_string(),
            price: Decimal::from(1000),
            stock: 100,
            quantity: 10,
        },
        PricedLine {
            product_id: ProductId::new(2),
            name: "Квас 1 л".to_string(),
            price: Decimal::from(2500),
            stock: 4,
            quantity: 4,
        },
    ]
}

fn new_client_terms(settings: &ShopSettings) -> ClientTerms {
    ClientTerms {
        discount_percent: Decimal::from(5),
        bonus_balance: settings.welcome_bonus_amount,
        credit_limit: settings.credit_limit_default,
        debt: Decimal::ZERO,
        first_order_discount_available: true,
    }
}

#[test]
fn test_first_order_with_welcome_bonus() {
    let settings = ShopSettings::default();
    let terms = new_client_terms(&settings);

    let quote = quote_order(&lines(), &terms, Decimal::from(5000), &settings).unwrap();

    assert_eq!(quote.total, Decimal::from(20_000));
    assert_eq!(quote.client_discount, Decimal::from(1000));
    assert_eq!(quote.first_order_discount_percent, Decimal::from(10));
    assert_eq!(quote.first_order_discount, Decimal::from(1900));
    assert_eq!(quote.net_amount(), Decimal::from(17_100));
    assert_eq!(quote.bonus_used, Decimal::from(5000));
    assert_eq!(quote.final_total, Decimal::from(12_100));
    assert!(quote.uses_first_order_discount());
    assert_eq!(format_tenge(quote.final_total), "12,100₸");

    // Delivered: bonus on the net amount, not on what was paid in cash
    let earned = delivery_bonus(quote.net_amount(), settings.bonus_percent_default);
    assert_eq!(earned, Decimal::from(342));
}

#[test]
fn test_bonus_is_capped_by_max_use_percent() {
    let settings = ShopSettings::default();
    let mut terms = new_client_terms(&settings);
    terms.bonus_balance = Decimal::from(50_000);
    terms.first_order_discount_available = false;

    let quote = quote_order(&lines(), &terms, Decimal::from(50_000), &settings).unwrap();

    // 30% of 19,000
    assert_eq!(quote.bonus_used, Decimal::from(5700));
    assert_eq!(quote.final_total, Decimal::from(13_300));
}

#[test]
fn test_requesting_more_bonus_than_balance_fails() {
    let settings = ShopSettings::default();
    let terms = new_client_terms(&settings);

    let err = quote_order(&lines(), &terms, Decimal::from(6000), &settings).unwrap_err();
    assert!(matches!(err, QuoteError::InsufficientBonus { .. }));
}

#[test]
fn test_second_order_blocked_by_credit_limit() {
    let settings = ShopSettings::default();
    let mut terms = new_client_terms(&settings);
    terms.first_order_discount_available = false;
    terms.debt = settings.credit_limit_default - Decimal::from(10_000);

    let err = quote_order(&lines(), &terms, Decimal::ZERO, &settings).unwrap_err();
    assert!(matches!(err, QuoteError::CreditLimitExceeded { .. }));
}

#[test]
fn test_stock_checked_after_merging_cart_lines() {
    let merged = merge_lines([
        (ProductId::new(2), 3),
        (ProductId::new(1), 1),
        (ProductId::new(2), 2),
    ])
    .unwrap();
    assert_eq!(merged, vec![(ProductId::new(1), 1), (ProductId::new(2), 5)]);

    let mut priced = lines();
    if let Some(kvass) = priced.get_mut(1) {
        kvass.quantity = 5;
    }
    let settings = ShopSettings::default();
    let err = quote_order(&priced, &new_client_terms(&settings), Decimal::ZERO, &settings)
        .unwrap_err();
    assert!(matches!(
        err,
        QuoteError::InsufficientStock {
            available: 4,
            requested: 5,
            ..
        }
    ));
}

#[test]
fn test_order_lifecycle() {
    let status = OrderStatus::New;
    let status = status.transition_to(OrderStatus::Confirmed).unwrap();
    let status = status.transition_to(OrderStatus::Delivering).unwrap();

    assert!(status.transition_to(OrderStatus::Preparing).is_err());

    let delivered = status.transition_to(OrderStatus::Delivered).unwrap();
    assert!(delivered.transition_to(OrderStatus::Cancelled).is_err());

    let cancelled = OrderStatus::Preparing
        .transition_to(OrderStatus::Cancelled)
        .unwrap();
    assert!(cancelled.transition_to(OrderStatus::New).is_err());
}

#[test]
fn test_welcome_bonus_spent_before_expiry_does_not_expire() {
    let settings = ShopSettings::default();
    let approved = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let expiry = expires_at(approved, settings.bonus_expiry_months);
    assert_eq!(expiry, Utc.with_ymd_and_hms(2025, 9, 10, 9, 0, 0).unwrap());

    // Welcome 5,000 spent on the first order, 342 earned on delivery later
    let totals = LedgerTotals {
        earned_past_expiry: Decimal::from(5000),
        spent: Decimal::from(5000),
        refunded: Decimal::ZERO,
        expired: Decimal::ZERO,
    };
    assert_eq!(amount_to_expire(&totals, Decimal::from(342)), Decimal::ZERO);
}

#[test]
fn test_refunded_bonus_expires_with_its_earning() {
    // The order was cancelled, so the 5,000 came back and stayed unused
    let totals = LedgerTotals {
        earned_past_expiry: Decimal::from(5000),
        spent: Decimal::from(5000),
        refunded: Decimal::from(5000),
        expired: Decimal::ZERO,
    };
    assert_eq!(
        amount_to_expire(&totals, Decimal::from(5342)),
        Decimal::from(5000)
    );

    // A second run after the write-off finds nothing left
    let after = LedgerTotals {
        expired: Decimal::from(5000),
        ..totals
    };
    assert_eq!(amount_to_expire(&after, Decimal::from(342)), Decimal::ZERO);
}
