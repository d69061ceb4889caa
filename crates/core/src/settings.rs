//! Typed view over the `system_settings` key/value table.
//!
//! Settings are stored as text with a declared value type so admins can edit
//! them without a deploy. [`ShopSettings::from_pairs`] turns the raw rows into
//! typed values, falling back to the defaults in [`DEFAULT_SETTINGS`] for any
//! key that is missing or unparseable.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tiers::RewardTier;

/// Declared type of a setting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    Int,
    Float,
    String,
    Bool,
}

/// Error returned when a value does not match its declared type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("value {value:?} is not a valid {expected}")]
pub struct SettingValueError {
    /// The rejected value.
    pub value: String,
    /// The declared type.
    pub expected: SettingType,
}

impl SettingType {
    /// Check that `value` parses as this type.
    ///
    /// # Errors
    ///
    /// Returns [`SettingValueError`] if it does not.
    pub fn validate(self, value: &str) -> Result<(), SettingValueError> {
        let trimmed = value.trim();
        let ok = match self {
            Self::Int => trimmed.parse::<i64>().is_ok(),
            Self::Float => Decimal::from_str(trimmed).is_ok(),
            Self::Bool => parse_bool(trimmed).is_some(),
            Self::String => true,
        };
        if ok {
            Ok(())
        } else {
            Err(SettingValueError {
                value: value.to_owned(),
                expected: self,
            })
        }
    }
}

impl std::fmt::Display for SettingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

impl FromStr for SettingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "string" => Ok(Self::String),
            "bool" => Ok(Self::Bool),
            _ => Err(format!("invalid setting type: {s}")),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// A setting seeded by `snl seed settings`.
#[derive(Debug, Clone, Copy)]
pub struct SettingDefinition {
    pub key: &'static str,
    pub value_type: SettingType,
    pub default: &'static str,
    pub description: &'static str,
}

/// Setting keys.
pub mod keys {
    pub const BONUS_PERCENT_DEFAULT: &str = "bonus_percent_default";
    pub const BONUS_EXPIRY_MONTHS: &str = "bonus_expiry_months";
    pub const BONUS_MAX_USE_PERCENT: &str = "bonus_max_use_percent";
    pub const CREDIT_LIMIT_DEFAULT: &str = "credit_limit_default";
    pub const PAYMENT_DELAY_DEFAULT: &str = "payment_delay_default";
    pub const MIN_ORDER_AMOUNT: &str = "min_order_amount";
    pub const LOW_STOCK_THRESHOLD: &str = "low_stock_threshold";
    pub const WELCOME_BONUS_AMOUNT: &str = "welcome_bonus_amount";
    pub const TIER1_THRESHOLD: &str = "tier1_threshold";
    pub const TIER1_TITLE: &str = "tier1_title";
    pub const TIER2_THRESHOLD: &str = "tier2_threshold";
    pub const TIER2_TITLE: &str = "tier2_title";
    pub const TIER3_THRESHOLD: &str = "tier3_threshold";
    pub const TIER3_TITLE: &str = "tier3_title";
    pub const TIER_THRESHOLDS: [&str; 3] = [TIER1_THRESHOLD, TIER2_THRESHOLD, TIER3_THRESHOLD];
    pub const TIER_TITLES: [&str; 3] = [TIER1_TITLE, TIER2_TITLE, TIER3_TITLE];
}

/// Every known setting with its default value.
pub const DEFAULT_SETTINGS: &[SettingDefinition] = &[
    SettingDefinition {
        key: keys::BONUS_PERCENT_DEFAULT,
        value_type: SettingType::Float,
        default: "2.0",
        description: "Процент начисления бонусов от суммы заказа",
    },
    SettingDefinition {
        key: keys::BONUS_EXPIRY_MONTHS,
        value_type: SettingType::Int,
        default: "6",
        description: "Срок действия бонусов в месяцах",
    },
    SettingDefinition {
        key: keys::BONUS_MAX_USE_PERCENT,
        value_type: SettingType::Int,
        default: "30",
        description: "Максимальный процент оплаты заказа бонусами",
    },
    SettingDefinition {
        key: keys::CREDIT_LIMIT_DEFAULT,
        value_type: SettingType::Float,
        default: "500000",
        description: "Кредитный лимит по умолчанию (₸)",
    },
    SettingDefinition {
        key: keys::PAYMENT_DELAY_DEFAULT,
        value_type: SettingType::Int,
        default: "14",
        description: "Отсрочка платежа по умолчанию (дней)",
    },
    SettingDefinition {
        key: keys::MIN_ORDER_AMOUNT,
        value_type: SettingType::Float,
        default: "10000",
        description: "Минимальная сумма заказа (₸)",
    },
    SettingDefinition {
        key: keys::LOW_STOCK_THRESHOLD,
        value_type: SettingType::Int,
        default: "10",
        description: "Порог низкого остатка товара (шт.)",
    },
    SettingDefinition {
        key: keys::WELCOME_BONUS_AMOUNT,
        value_type: SettingType::Float,
        default: "5000",
        description: "Приветственный бонус при одобрении клиента (₸)",
    },
    SettingDefinition {
        key: keys::TIER1_THRESHOLD,
        value_type: SettingType::Int,
        default: "15000",
        description: "Порог 1: сумма (₸)",
    },
    SettingDefinition {
        key: keys::TIER1_TITLE,
        value_type: SettingType::String,
        default: "Бесплатная доставка",
        description: "Порог 1: название",
    },
    SettingDefinition {
        key: keys::TIER2_THRESHOLD,
        value_type: SettingType::Int,
        default: "25000",
        description: "Порог 2: сумма (₸)",
    },
    SettingDefinition {
        key: keys::TIER2_TITLE,
        value_type: SettingType::String,
        default: "Упаковка кваса в подарок",
        description: "Порог 2: название",
    },
    SettingDefinition {
        key: keys::TIER3_THRESHOLD,
        value_type: SettingType::Int,
        default: "50000",
        description: "Порог 3: сумма (₸)",
    },
    SettingDefinition {
        key: keys::TIER3_TITLE,
        value_type: SettingType::String,
        default: "5% скидка на заказ",
        description: "Порог 3: название",
    },
];

/// Look up the definition for a known key.
#[must_use]
pub fn definition(key: &str) -> Option<&'static SettingDefinition> {
    DEFAULT_SETTINGS.iter().find(|d| d.key == key)
}

/// Business settings read at request time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopSettings {
    /// Percent of the net order amount credited as bonus on delivery.
    pub bonus_percent_default: Decimal,
    /// Months until an earned bonus expires.
    pub bonus_expiry_months: u32,
    /// Maximum share of an order payable with bonuses, in percent.
    pub bonus_max_use_percent: Decimal,
    /// Credit limit given to newly registered clients.
    pub credit_limit_default: Decimal,
    /// Payment delay (days) given to newly registered clients.
    pub payment_delay_default: i32,
    /// Orders below this amount (after discounts) are rejected.
    pub min_order_amount: Decimal,
    /// Active products with stock below this are reported as low.
    pub low_stock_threshold: i32,
    /// Bonus credited when a client is approved.
    pub welcome_bonus_amount: Decimal,
    /// Cart reward tiers, ascending by threshold.
    pub tiers: Vec<RewardTier>,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self::from_pairs(std::iter::empty::<(&str, &str)>())
    }
}

impl ShopSettings {
    /// Build settings from `(key, value)` rows.
    ///
    /// Unknown keys are ignored; missing or malformed values use defaults.
    #[must_use]
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut values: std::collections::HashMap<&str, &str> = DEFAULT_SETTINGS
            .iter()
            .map(|d| (d.key, d.default))
            .collect();

        for (key, value) in pairs {
            if let Some(def) = definition(key)
                && def.value_type.validate(value).is_ok()
            {
                values.insert(def.key, value);
            }
        }

        let decimal = |key: &str| -> Decimal {
            values
                .get(key)
                .and_then(|v| Decimal::from_str(v.trim()).ok())
                .unwrap_or_default()
        };
        let int = |key: &str| -> i64 {
            values
                .get(key)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or_default()
        };

        let mut tiers: Vec<RewardTier> = keys::TIER_THRESHOLDS
            .iter()
            .zip(keys::TIER_TITLES.iter())
            .filter_map(|(threshold_key, title_key)| {
                let threshold = decimal(*threshold_key);
                (threshold > Decimal::ZERO).then(|| RewardTier {
                    threshold,
                    title: values.get(*title_key).copied().unwrap_or_default().to_owned(),
                })
            })
            .collect();
        tiers.sort_by(|a, b| a.threshold.cmp(&b.threshold));

        Self {
            bonus_percent_default: decimal(keys::BONUS_PERCENT_DEFAULT),
            bonus_expiry_months: u32::try_from(int(keys::BONUS_EXPIRY_MONTHS)).unwrap_or(0),
            bonus_max_use_percent: decimal(keys::BONUS_MAX_USE_PERCENT)
                .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
            credit_limit_default: decimal(keys::CREDIT_LIMIT_DEFAULT),
            payment_delay_default: i32::try_from(int(keys::PAYMENT_DELAY_DEFAULT)).unwrap_or(0),
            min_order_amount: decimal(keys::MIN_ORDER_AMOUNT),
            low_stock_threshold: i32::try_from(int(keys::LOW_STOCK_THRESHOLD)).unwrap_or(0),
            welcome_bonus_amount: decimal(keys::WELCOME_BONUS_AMOUNT).max(Decimal::ZERO),
            tiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ShopSettings::default();
        assert_eq!(settings.bonus_percent_default, Decimal::new(20, 1));
        assert_eq!(settings.bonus_expiry_months, 6);
        assert_eq!(settings.bonus_max_use_percent, Decimal::from(30));
        assert_eq!(settings.credit_limit_default, Decimal::from(500_000));
        assert_eq!(settings.payment_delay_default, 14);
        assert_eq!(settings.min_order_amount, Decimal::from(10_000));
        assert_eq!(settings.low_stock_threshold, 10);
        assert_eq!(settings.welcome_bonus_amount, Decimal::from(5000));
        assert_eq!(settings.tiers.len(), 3);
        assert_eq!(settings.tiers[0].threshold, Decimal::from(15_000));
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let settings = ShopSettings::from_pairs([
            ("min_order_amount", "25000"),
            ("bonus_expiry_months", "twelve"),
            ("bonus_max_use_percent", "150"),
            ("unknown_key", "1"),
        ]);
        assert_eq!(settings.min_order_amount, Decimal::from(25_000));
        assert_eq!(settings.bonus_expiry_months, 6);
        assert_eq!(settings.bonus_max_use_percent, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_disabled_tier_is_dropped() {
        let settings = ShopSettings::from_pairs([("tier2_threshold", "0")]);
        assert_eq!(settings.tiers.len(), 2);
        assert!(settings.tiers.iter().all(|t| t.threshold > Decimal::ZERO));
    }

    #[test]
    fn test_setting_type_validation() {
        assert!(SettingType::Int.validate("14").is_ok());
        assert!(SettingType::Int.validate("1.5").is_err());
        assert!(SettingType::Float.validate("2.5").is_ok());
        assert!(SettingType::Bool.validate("yes").is_ok());
        assert!(SettingType::Bool.validate("maybe").is_err());
        assert!(SettingType::String.validate("").is_ok());
    }

    #[test]
    fn test_every_default_matches_its_type() {
        for def in DEFAULT_SETTINGS {
            assert!(def.value_type.validate(def.default).is_ok(), "{}", def.key);
        }
    }

    #[test]
    fn test_tier_keys_are_defined() {
        for key in keys::TIER_THRESHOLDS {
            assert_eq!(definition(key).map(|d| d.value_type), Some(SettingType::Int));
        }
        for key in keys::TIER_TITLES {
            assert_eq!(definition(key).map(|d| d.value_type), Some(SettingType::String));
        }
    }
}
