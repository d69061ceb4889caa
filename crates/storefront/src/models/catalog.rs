//! Catalog and cart domain types.

use rust_decimal::Decimal;
use serde::Serialize;

use snacklane_core::pricing::personal_price;
use snacklane_core::tiers::{RewardTier, TierProgress, tier_progress};
use snacklane_core::{CategoryId, ProductId};

/// A product category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub sort_order: i32,
}

/// A catalog product at list price.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub description: Option<String>,
    pub price: Decimal,
    pub weight: Option<String>,
    pub package_size: Option<i32>,
    pub stock: i32,
    pub photo_file_id: Option<String>,
    pub sort_order: i32,
}

/// A product priced for a particular client.
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithPrice {
    #[serde(flatten)]
    pub product: Product,
    pub personal_price: Decimal,
    /// Client discount percent that produced `personal_price`.
    pub discount_applied: Decimal,
}

impl ProductWithPrice {
    #[must_use]
    pub fn new(product: Product, discount_percent: Decimal) -> Self {
        Self {
            personal_price: personal_price(product.price, discount_percent),
            discount_applied: discount_percent,
            product,
        }
    }
}

/// One product in a client's cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub personal_price: Decimal,
    pub quantity: i32,
    pub stock: i32,
    pub subtotal: Decimal,
}

/// The cart as shown in the mini-app.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub items_count: i32,
    pub tiers: TierProgress,
}

impl CartView {
    /// Price the stored `(product, quantity)` lines for a client and report
    /// progress toward the reward tiers.
    #[must_use]
    pub fn build(
        lines: Vec<(Product, i32)>,
        discount_percent: Decimal,
        tiers: &[RewardTier],
    ) -> Self {
        let items: Vec<CartLine> = lines
            .into_iter()
            .map(|(product, quantity)| {
                let personal = personal_price(product.price, discount_percent);
                CartLine {
                    product_id: product.id,
                    name: product.name,
                    price: product.price,
                    personal_price: personal,
                    quantity,
                    stock: product.stock,
                    subtotal: personal * Decimal::from(quantity),
                }
            })
            .collect();

        let total = items.iter().map(|line| line.subtotal).sum();
        let items_count = items.iter().map(|line| line.quantity).sum();

        Self {
            tiers: tier_progress(total, tiers),
            items,
            total,
            items_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i32, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Товар {id}"),
            category_id: CategoryId::new(1),
            description: None,
            price: Decimal::from(price),
            weight: None,
            package_size: None,
            stock: 100,
            photo_file_id: None,
            sort_order: 0,
        }
    }

    #[test]
    fn test_product_with_price() {
        let priced = ProductWithPrice::new(product(1, 1_000), Decimal::from(10));
        assert_eq!(priced.personal_price, Decimal::from(900));
        assert_eq!(priced.discount_applied, Decimal::from(10));

        let json = serde_json::to_value(&priced).unwrap_or_default();
        assert_eq!(json["name"], "Товар 1");
        assert_eq!(json["personal_price"], "900");
    }

    #[test]
    fn test_cart_view_totals_and_tiers() {
        let tiers = vec![
            RewardTier {
                threshold: Decimal::from(15_000),
                title: "Бесплатная доставка".to_string(),
            },
            RewardTier {
                threshold: Decimal::from(25_000),
                title: "Упаковка кваса в подарок".to_string(),
            },
        ];
        let view = CartView::build(
            vec![(product(1, 5_000), 2), (product(2, 3_000), 2)],
            Decimal::ZERO,
            &tiers,
        );

        assert_eq!(view.total, Decimal::from(16_000));
        assert_eq!(view.items_count, 4);
        assert_eq!(view.tiers.reached.len(), 1);
        let next = view.tiers.next.unwrap_or_else(|| panic!("next tier expected"));
        assert_eq!(next.remaining, Decimal::from(9_000));
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::build(Vec::new(), Decimal::ZERO, &[]);
        assert!(view.items.is_empty());
        assert_eq!(view.total, Decimal::ZERO);
        assert!(view.tiers.next.is_none());
    }
}
