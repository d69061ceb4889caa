//! Money helpers.
//!
//! All amounts are tenge held in `rust_decimal::Decimal` and stored as
//! `NUMERIC(12,2)`. Rounding happens once per computed amount, to two
//! decimal places, half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round an amount to whole tiyn (two decimal places).
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `percent`% of `amount`, rounded with [`round_money`].
#[must_use]
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_money(amount * percent / Decimal::ONE_HUNDRED)
}

/// Format an amount for chat messages, e.g. `12,345₸`.
///
/// Fractions are rounded away; Telegram notifications show whole tenge.
#[must_use]
pub fn format_tenge(amount: Decimal) -> String {
    let whole = amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let digits = whole.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if whole.is_sign_negative() && !whole.is_zero() {
        format!("-{grouped}₸")
    } else {
        format!("{grouped}₸")
    }
}

/// Deserialize an amount given either as a JSON number or a string.
///
/// Mini-app clients send `"bonus_to_use": 1500` while our own responses use
/// strings. Use with `#[serde(deserialize_with = "lenient_amount::deserialize")]`.
pub mod lenient_amount {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(i64),
        Float(f64),
        Text(String),
    }

    /// # Errors
    ///
    /// Fails when the value is neither a number nor a decimal string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Int(v) => Ok(Decimal::from(v)),
            Repr::Float(v) => Decimal::try_from(v).map_err(D::Error::custom),
            Repr::Text(s) => Decimal::from_str(s.trim()).map_err(D::Error::custom),
        }
    }

    /// Optional variant for partial updates. Pair with `#[serde(default)]`.
    ///
    /// # Errors
    ///
    /// Fails when a present value is neither a number nor a decimal string.
    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize)]
    struct Payload {
        #[serde(deserialize_with = "lenient_amount::deserialize")]
        amount: Decimal,
    }

    #[test]
    fn test_lenient_amount_accepts_numbers_and_strings() {
        let parse = |json: &str| serde_json::from_str::<Payload>(json).map(|p| p.amount);
        assert_eq!(parse(r#"{"amount": 1500}"#).ok(), Some(Decimal::from(1500)));
        assert_eq!(parse(r#"{"amount": 12.5}"#).ok(), Some(Decimal::new(125, 1)));
        assert_eq!(parse(r#"{"amount": "99.90"}"#).ok(), Some(Decimal::new(9990, 2)));
        assert!(parse(r#"{"amount": "abc"}"#).is_err());
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(12_345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_money(Decimal::new(12_344, 3)), Decimal::new(1234, 2));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(
            percent_of(Decimal::from(12_500), Decimal::from(2)),
            Decimal::from(250)
        );
        assert_eq!(
            percent_of(Decimal::new(999, 0), Decimal::new(75, 1)),
            Decimal::new(7493, 2)
        );
    }

    #[test]
    fn test_format_tenge_groups_thousands() {
        assert_eq!(format_tenge(Decimal::from(1_234_567)), "1,234,567₸");
        assert_eq!(format_tenge(Decimal::from(950)), "950₸");
        assert_eq!(format_tenge(Decimal::new(500_050, 2)), "5,001₸");
        assert_eq!(format_tenge(Decimal::ZERO), "0₸");
        assert_eq!(format_tenge(Decimal::from(-1500)), "-1,500₸");
    }
}
