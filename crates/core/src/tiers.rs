//! Cart reward tiers.
//!
//! A tier is a cart-total threshold that unlocks a reward (free delivery, a
//! gift pack, an extra discount). The cart view shows which tiers are reached
//! and how much more is needed for the next one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A reward unlocked at a cart total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTier {
    pub threshold: Decimal,
    pub title: String,
}

/// The next tier the cart has not reached yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextTier {
    pub title: String,
    pub threshold: Decimal,
    /// Amount still needed to reach the threshold.
    pub remaining: Decimal,
}

/// Progress of a cart total through the reward tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct TierProgress {
    pub reached: Vec<RewardTier>,
    pub next: Option<NextTier>,
}

/// Compute tier progress for `total`.
///
/// `tiers` need not be sorted.
#[must_use]
pub fn tier_progress(total: Decimal, tiers: &[RewardTier]) -> TierProgress {
    let mut sorted: Vec<&RewardTier> = tiers.iter().collect();
    sorted.sort_by(|a, b| a.threshold.cmp(&b.threshold));

    let reached = sorted
        .iter()
        .filter(|t| total >= t.threshold)
        .map(|t| (*t).clone())
        .collect();

    let next = sorted
        .iter()
        .find(|t| total < t.threshold)
        .map(|t| NextTier {
            title: t.title.clone(),
            threshold: t.threshold,
            remaining: t.threshold - total,
        });

    TierProgress { reached, next }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> Vec<RewardTier> {
        vec![
            RewardTier {
                threshold: Decimal::from(50_000),
                title: "discount".to_owned(),
            },
            RewardTier {
                threshold: Decimal::from(15_000),
                title: "delivery".to_owned(),
            },
            RewardTier {
                threshold: Decimal::from(25_000),
                title: "gift".to_owned(),
            },
        ]
    }

    #[test]
    fn test_empty_cart_points_at_first_tier() {
        let progress = tier_progress(Decimal::ZERO, &tiers());
        assert!(progress.reached.is_empty());
        let next = progress.next.unwrap_or_else(|| panic!("expected a next tier"));
        assert_eq!(next.title, "delivery");
        assert_eq!(next.remaining, Decimal::from(15_000));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let progress = tier_progress(Decimal::from(25_000), &tiers());
        assert_eq!(progress.reached.len(), 2);
        assert_eq!(
            progress.next.map(|n| n.remaining),
            Some(Decimal::from(25_000))
        );
    }

    #[test]
    fn test_all_tiers_reached() {
        let progress = tier_progress(Decimal::from(80_000), &tiers());
        assert_eq!(progress.reached.len(), 3);
        assert!(progress.next.is_none());
    }
}
