//! Bonus ledger arithmetic.
//!
//! Bonuses are earned on delivered orders (and on approval as a welcome
//! bonus), spent on new orders, refunded when an order is cancelled and
//! expired after a configurable number of months. Expiry assumes spends
//! consume the oldest earnings first.

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::percent_of;

/// Bonus credited for a delivered order.
///
/// `net_amount` is the order total after discounts, before bonus redemption.
#[must_use]
pub fn delivery_bonus(net_amount: Decimal, percent: Decimal) -> Decimal {
    if net_amount <= Decimal::ZERO || percent <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    percent_of(net_amount, percent)
}

/// Expiry timestamp for a bonus earned at `earned_at`.
#[must_use]
pub fn expires_at(earned_at: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    earned_at
        .checked_add_months(Months::new(months))
        .unwrap_or(earned_at)
}

/// Per-client totals of the bonus ledger, as absolute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LedgerTotals {
    /// Earned bonuses whose expiry date has passed.
    pub earned_past_expiry: Decimal,
    /// Total spent on orders.
    pub spent: Decimal,
    /// Total returned by cancelled orders.
    pub refunded: Decimal,
    /// Total already written off by earlier expiry runs.
    pub expired: Decimal,
}

/// Amount to write off now.
///
/// Spends (net of refunds) and previous write-offs are first matched
/// against the oldest earnings; whatever expired earnings remain unmatched
/// are due. The result never exceeds the current balance.
#[must_use]
pub fn amount_to_expire(totals: &LedgerTotals, balance: Decimal) -> Decimal {
    let consumed = (totals.spent - totals.refunded).max(Decimal::ZERO) + totals.expired;
    (totals.earned_past_expiry - consumed)
        .max(Decimal::ZERO)
        .min(balance.max(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_delivery_bonus() {
        assert_eq!(
            delivery_bonus(Decimal::from(25_000), Decimal::new(20, 1)),
            Decimal::from(500)
        );
        assert_eq!(
            delivery_bonus(Decimal::from(25_000), Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_expires_at_adds_calendar_months() {
        let earned = Utc.with_ymd_and_hms(2025, 8, 31, 12, 0, 0).single();
        let earned = earned.unwrap_or_else(|| panic!("valid timestamp"));
        let expiry = expires_at(earned, 6);
        assert_eq!(expiry.to_rfc3339(), "2026-02-28T12:00:00+00:00");
    }

    #[test]
    fn test_nothing_expired_yet() {
        let totals = LedgerTotals::default();
        assert_eq!(amount_to_expire(&totals, Decimal::from(900)), Decimal::ZERO);
    }

    #[test]
    fn test_spends_consume_oldest_first() {
        let totals = LedgerTotals {
            earned_past_expiry: Decimal::from(1000),
            spent: Decimal::from(600),
            refunded: Decimal::from(100),
            expired: Decimal::ZERO,
        };
        assert_eq!(
            amount_to_expire(&totals, Decimal::from(2000)),
            Decimal::from(500)
        );
    }

    #[test]
    fn test_previous_write_offs_are_not_repeated() {
        let totals = LedgerTotals {
            earned_past_expiry: Decimal::from(1000),
            spent: Decimal::ZERO,
            refunded: Decimal::ZERO,
            expired: Decimal::from(1000),
        };
        assert_eq!(
            amount_to_expire(&totals, Decimal::from(300)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_capped_by_balance() {
        let totals = LedgerTotals {
            earned_past_expiry: Decimal::from(1000),
            ..LedgerTotals::default()
        };
        assert_eq!(
            amount_to_expire(&totals, Decimal::from(250)),
            Decimal::from(250)
        );
    }
}
