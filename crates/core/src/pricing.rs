//! Order quoting.
//!
//! [`quote_order`] is the single place where an order's money is decided.
//! The storefront calls it inside the order transaction after locking the
//! client and product rows, so the numbers it returns are the numbers that
//! get persisted.
//!
//! Amounts relate as follows:
//!
//! ```text
//! subtotal       = price × quantity             (per line, list price)
//! total          = Σ subtotal
//! discount       = client discount + first-order discount
//! final_total    = total − discount − bonus_used
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::settings::ShopSettings;
use crate::types::{ProductId, percent_of, round_money};

/// First-order discount tiers as `(minimum amount, percent)`, highest first.
pub const FIRST_ORDER_DISCOUNT_TIERS: [(i64, i64); 3] = [(50_000, 20), (25_000, 15), (15_000, 10)];

/// Reasons an order cannot be placed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("Cart is empty")]
    EmptyOrder,

    #[error("Quantity for product {product_id} must be positive")]
    InvalidQuantity { product_id: ProductId },

    #[error("Insufficient stock for {name}")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: i32,
        requested: i32,
    },

    #[error("Minimum order amount is {minimum}")]
    BelowMinimum { minimum: Decimal, amount: Decimal },

    #[error("Bonus amount cannot be negative")]
    InvalidBonusAmount,

    #[error("Insufficient bonus balance")]
    InsufficientBonus {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Credit limit exceeded")]
    CreditLimitExceeded {
        limit: Decimal,
        debt: Decimal,
        order_total: Decimal,
    },
}

/// A product line as read from the catalog, with the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub name: String,
    /// List price at order time.
    pub price: Decimal,
    /// Units currently in stock.
    pub stock: i32,
    pub quantity: i32,
}

/// The client's commercial terms at order time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTerms {
    pub discount_percent: Decimal,
    pub bonus_balance: Decimal,
    pub credit_limit: Decimal,
    pub debt: Decimal,
    /// `true` until the client's first discounted order.
    pub first_order_discount_available: bool,
}

/// A priced order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotedLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub personal_price: Decimal,
    pub subtotal: Decimal,
}

/// The computed money of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderQuote {
    pub lines: Vec<QuotedLine>,
    pub total: Decimal,
    pub client_discount: Decimal,
    pub first_order_discount_percent: Decimal,
    pub first_order_discount: Decimal,
    pub discount_amount: Decimal,
    pub bonus_used: Decimal,
    pub final_total: Decimal,
}

impl OrderQuote {
    /// Amount after discounts and before bonus redemption.
    #[must_use]
    pub fn net_amount(&self) -> Decimal {
        self.total - self.discount_amount
    }

    /// Whether this order consumes the client's first-order discount.
    #[must_use]
    pub fn uses_first_order_discount(&self) -> bool {
        self.first_order_discount > Decimal::ZERO
    }
}

/// List price reduced by the client's discount percent.
#[must_use]
pub fn personal_price(price: Decimal, discount_percent: Decimal) -> Decimal {
    if discount_percent <= Decimal::ZERO {
        return price;
    }
    round_money(price - price * discount_percent / Decimal::ONE_HUNDRED)
}

/// Discount percent for a client's first order of `amount`.
#[must_use]
pub fn first_order_discount_percent(amount: Decimal) -> Decimal {
    FIRST_ORDER_DISCOUNT_TIERS
        .iter()
        .find(|(minimum, _)| amount >= Decimal::from(*minimum))
        .map_or(Decimal::ZERO, |(_, percent)| Decimal::from(*percent))
}

/// Merge duplicate product lines and reject non-positive quantities.
///
/// Output is ordered by product id, which is also the order rows get locked in.
///
/// # Errors
///
/// Returns [`QuoteError::EmptyOrder`] for no lines and
/// [`QuoteError::InvalidQuantity`] for a quantity of zero or less.
pub fn merge_lines<I>(lines: I) -> Result<Vec<(ProductId, i32)>, QuoteError>
where
    I: IntoIterator<Item = (ProductId, i32)>,
{
    let mut merged: BTreeMap<ProductId, i32> = BTreeMap::new();
    for (product_id, quantity) in lines {
        if quantity <= 0 {
            return Err(QuoteError::InvalidQuantity { product_id });
        }
        let entry = merged.entry(product_id).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }
    if merged.is_empty() {
        return Err(QuoteError::EmptyOrder);
    }
    Ok(merged.into_iter().collect())
}

/// Price an order for a client.
///
/// # Errors
///
/// Returns a [`QuoteError`] when the order violates stock, the minimum order
/// amount, the bonus balance or the client's credit limit.
pub fn quote_order(
    lines: &[PricedLine],
    terms: &ClientTerms,
    bonus_to_use: Decimal,
    settings: &ShopSettings,
) -> Result<OrderQuote, QuoteError> {
    if lines.is_empty() {
        return Err(QuoteError::EmptyOrder);
    }
    if bonus_to_use < Decimal::ZERO {
        return Err(QuoteError::InvalidBonusAmount);
    }

    let mut quoted = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;
    let mut client_discount = Decimal::ZERO;

    for line in lines {
        if line.quantity <= 0 {
            return Err(QuoteError::InvalidQuantity {
                product_id: line.product_id,
            });
        }
        if line.stock < line.quantity {
            return Err(QuoteError::InsufficientStock {
                product_id: line.product_id,
                name: line.name.clone(),
                available: line.stock,
                requested: line.quantity,
            });
        }

        let quantity = Decimal::from(line.quantity);
        let subtotal = line.price * quantity;
        let personal = personal_price(line.price, terms.discount_percent);

        total += subtotal;
        client_discount += (line.price - personal) * quantity;

        quoted.push(QuotedLine {
            product_id: line.product_id,
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.price,
            personal_price: personal,
            subtotal,
        });
    }

    let after_client_discount = total - client_discount;

    let (first_order_discount_percent, first_order_discount) =
        if terms.first_order_discount_available {
            let percent = first_order_discount_percent(after_client_discount);
            (percent, percent_of(after_client_discount, percent))
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

    let discount_amount = client_discount + first_order_discount;
    let net_amount = total - discount_amount;

    if net_amount < settings.min_order_amount {
        return Err(QuoteError::BelowMinimum {
            minimum: settings.min_order_amount,
            amount: net_amount,
        });
    }

    if bonus_to_use > terms.bonus_balance {
        return Err(QuoteError::InsufficientBonus {
            requested: bonus_to_use,
            available: terms.bonus_balance,
        });
    }
    let bonus_cap = percent_of(net_amount, settings.bonus_max_use_percent);
    let bonus_used = bonus_to_use.min(bonus_cap).min(terms.bonus_balance);

    let final_total = net_amount - bonus_used;

    if terms.debt + final_total > terms.credit_limit {
        return Err(QuoteError::CreditLimitExceeded {
            limit: terms.credit_limit,
            debt: terms.debt,
            order_total: final_total,
        });
    }

    Ok(OrderQuote {
        lines: quoted,
        total,
        client_discount,
        first_order_discount_percent,
        first_order_discount,
        discount_amount,
        bonus_used,
        final_total,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, price: i64, stock: i32, quantity: i32) -> PricedLine {
        PricedLine {
            product_id: ProductId::new(id),
            name: format!("product-{id}"),
            price: Decimal::from(price),
            stock,
            quantity,
        }
    }

    fn terms() -> ClientTerms {
        ClientTerms {
            discount_percent: Decimal::ZERO,
            bonus_balance: Decimal::ZERO,
            credit_limit: Decimal::from(500_000),
            debt: Decimal::ZERO,
            first_order_discount_available: false,
        }
    }

    #[test]
    fn test_personal_price() {
        assert_eq!(
            personal_price(Decimal::from(1000), Decimal::from(5)),
            Decimal::from(950)
        );
        assert_eq!(
            personal_price(Decimal::new(333, 0), Decimal::from(10)),
            Decimal::new(29970, 2)
        );
        assert_eq!(
            personal_price(Decimal::from(1000), Decimal::ZERO),
            Decimal::from(1000)
        );
    }

    #[test]
    fn test_first_order_discount_tiers() {
        assert_eq!(
            first_order_discount_percent(Decimal::from(14_999)),
            Decimal::ZERO
        );
        assert_eq!(
            first_order_discount_percent(Decimal::from(15_000)),
            Decimal::from(10)
        );
        assert_eq!(
            first_order_discount_percent(Decimal::from(30_000)),
            Decimal::from(15)
        );
        assert_eq!(
            first_order_discount_percent(Decimal::from(50_000)),
            Decimal::from(20)
        );
    }

    #[test]
    fn test_merge_lines_sums_duplicates() {
        let merged = merge_lines([
            (ProductId::new(5), 2),
            (ProductId::new(1), 1),
            (ProductId::new(5), 3),
        ])
        .unwrap();
        assert_eq!(merged, vec![(ProductId::new(1), 1), (ProductId::new(5), 5)]);
    }

    #[test]
    fn test_merge_lines_rejects_bad_input() {
        assert_eq!(merge_lines([]), Err(QuoteError::EmptyOrder));
        assert_eq!(
            merge_lines([(ProductId::new(3), 0)]),
            Err(QuoteError::InvalidQuantity {
                product_id: ProductId::new(3)
            })
        );
    }

    #[test]
    fn test_plain_order_totals() {
        let quote = quote_order(
            &[line(1, 1200, 50, 10), line(2, 500, 10, 4)],
            &terms(),
            Decimal::ZERO,
            &ShopSettings::default(),
        )
        .unwrap();

        assert_eq!(quote.total, Decimal::from(14_000));
        assert_eq!(quote.discount_amount, Decimal::ZERO);
        assert_eq!(quote.final_total, Decimal::from(14_000));
        for l in &quote.lines {
            assert_eq!(l.subtotal, l.price * Decimal::from(l.quantity));
        }
    }

    #[test]
    fn test_client_discount_and_bonus_cap() {
        let mut t = terms();
        t.discount_percent = Decimal::from(10);
        t.bonus_balance = Decimal::from(10_000);

        let quote = quote_order(
            &[line(1, 2000, 100, 10)],
            &t,
            Decimal::from(10_000),
            &ShopSettings::default(),
        )
        .unwrap();

        assert_eq!(quote.total, Decimal::from(20_000));
        assert_eq!(quote.client_discount, Decimal::from(2000));
        // 30% of 18 000
        assert_eq!(quote.bonus_used, Decimal::from(5400));
        assert_eq!(quote.final_total, Decimal::from(12_600));
        assert_eq!(
            quote.final_total,
            quote.total - quote.discount_amount - quote.bonus_used
        );
    }

    #[test]
    fn test_first_order_discount_applied_once() {
        let mut t = terms();
        t.first_order_discount_available = true;

        let quote = quote_order(
            &[line(1, 1000, 100, 30)],
            &t,
            Decimal::ZERO,
            &ShopSettings::default(),
        )
        .unwrap();

        assert_eq!(quote.first_order_discount_percent, Decimal::from(15));
        assert_eq!(quote.first_order_discount, Decimal::from(4500));
        assert!(quote.uses_first_order_discount());
        assert_eq!(quote.final_total, Decimal::from(25_500));
    }

    #[test]
    fn test_insufficient_stock() {
        let err = quote_order(
            &[line(1, 1000, 3, 20)],
            &terms(),
            Decimal::ZERO,
            &ShopSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock for product-1");
    }

    #[test]
    fn test_below_minimum() {
        let err = quote_order(
            &[line(1, 1000, 100, 5)],
            &terms(),
            Decimal::ZERO,
            &ShopSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, QuoteError::BelowMinimum { .. }));
    }

    #[test]
    fn test_bonus_request_above_balance() {
        let mut t = terms();
        t.bonus_balance = Decimal::from(100);
        let err = quote_order(
            &[line(1, 1000, 100, 20)],
            &t,
            Decimal::from(500),
            &ShopSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, QuoteError::InsufficientBonus { .. }));

        let err = quote_order(
            &[line(1, 1000, 100, 20)],
            &t,
            Decimal::from(-1),
            &ShopSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err, QuoteError::InvalidBonusAmount);
    }

    #[test]
    fn test_credit_limit() {
        let mut t = terms();
        t.credit_limit = Decimal::from(100_000);
        t.debt = Decimal::from(95_000);

        let err = quote_order(
            &[line(1, 1000, 100, 10)],
            &t,
            Decimal::ZERO,
            &ShopSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, QuoteError::CreditLimitExceeded { .. }));

        t.debt = Decimal::from(90_000);
        assert!(
            quote_order(
                &[line(1, 1000, 100, 10)],
                &t,
                Decimal::ZERO,
                &ShopSettings::default(),
            )
            .is_ok()
        );
    }
}
