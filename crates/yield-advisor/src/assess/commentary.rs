//! Commentary Selector
//!
//! Category choice is deterministic. Only the line within a category is
//! random, and that choice goes through a [`CommentPicker`] so tests can
//! pin it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::CommentCatalog;
use crate::model::{PoolSnapshot, RiskLevel, Trend};

/// APY above which a pool gets high-APY commentary regardless of risk
const HIGH_APY_COMMENT_ABOVE: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentCategory {
    HighApy,
    LowRisk,
    MediumRisk,
    HighRisk,
    Stablecoin,
    IlPool,
    TrendingUp,
    TrendingDown,
}

impl CommentCategory {
    /// First matching rule wins
    pub fn for_pool(pool: &PoolSnapshot, level: RiskLevel, trend: Trend) -> Self {
        if pool.apy.is_some_and(|apy| apy > HIGH_APY_COMMENT_ABOVE) {
            Self::HighApy
        } else if level == RiskLevel::Low {
            Self::LowRisk
        } else if level == RiskLevel::High {
            Self::HighRisk
        } else if pool.stablecoin {
            Self::Stablecoin
        } else if pool.il_risk {
            Self::IlPool
        } else if trend == Trend::Up {
            Self::TrendingUp
        } else if trend == Trend::Down {
            Self::TrendingDown
        } else {
            Self::MediumRisk
        }
    }

    pub fn lines(self, catalog: &CommentCatalog) -> &[String] {
        match self {
            Self::HighApy => &catalog.high_apy,
            Self::LowRisk => &catalog.low_risk,
            Self::MediumRisk => &catalog.medium_risk,
            Self::HighRisk => &catalog.high_risk,
            Self::Stablecoin => &catalog.stablecoin,
            Self::IlPool => &catalog.il_pool,
            Self::TrendingUp => &catalog.trending_up,
            Self::TrendingDown => &catalog.trending_down,
        }
    }
}

/// Chooses an index into a non-empty list of `len` lines
pub trait CommentPicker: Send + Sync {
    fn pick(&self, len: usize) -> usize;
}

/// Uniform random choice
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPicker;

impl CommentPicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always the same index (wrapped to the list length)
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedPicker(pub usize);

impl CommentPicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        if len == 0 { 0 } else { self.0 % len }
    }
}

pub struct CommentSelector<'a> {
    catalog: &'a CommentCatalog,
    picker: &'a dyn CommentPicker,
}

impl<'a> CommentSelector<'a> {
    pub fn new(catalog: &'a CommentCatalog, picker: &'a dyn CommentPicker) -> Self {
        Self { catalog, picker }
    }

    /// A line from the category, or an empty string if the category has none
    pub fn select(&self, category: CommentCategory) -> String {
        let lines = category.lines(self.catalog);
        lines
            .get(self.picker.pick(lines.len()))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assess::PoolNormalizer;
    use crate::model::RawPool;

    fn snapshot(raw: RawPool) -> PoolSnapshot {
        PoolNormalizer::snapshot(&raw).unwrap()
    }

    #[test]
    fn test_high_apy_beats_risk_level() {
        let pool = snapshot(RawPool::new("Ethereum", "p", "X", 5e7, 51.0));
        assert_eq!(
            CommentCategory::for_pool(&pool, RiskLevel::Low, Trend::Stable),
            CommentCategory::HighApy
        );
    }

    #[test]
    fn test_priority_chain_for_medium_risk() {
        let stable = snapshot(RawPool::new("Ethereum", "p", "USDC", 5e6, 25.0).with_stablecoin(true));
        assert_eq!(
            CommentCategory::for_pool(&stable, RiskLevel::Medium, Trend::Up),
            CommentCategory::Stablecoin
        );

        let lp = snapshot(RawPool::new("Ethereum", "p", "ETH-USDC", 5e6, 25.0).with_il_risk("yes"));
        assert_eq!(
            CommentCategory::for_pool(&lp, RiskLevel::Medium, Trend::Down),
            CommentCategory::IlPool
        );

        let plain = snapshot(RawPool::new("Ethereum", "p", "GLP", 5e6, 25.0));
        assert_eq!(
            CommentCategory::for_pool(&plain, RiskLevel::Medium, Trend::Up),
            CommentCategory::TrendingUp
        );
        assert_eq!(
            CommentCategory::for_pool(&plain, RiskLevel::Medium, Trend::Down),
            CommentCategory::TrendingDown
        );
        assert_eq!(
            CommentCategory::for_pool(&plain, RiskLevel::Medium, Trend::Stable),
            CommentCategory::MediumRisk
        );
    }

    #[test]
    fn test_fixed_picker_wraps() {
        let catalog = CommentCatalog::default();
        let picker = FixedPicker(5);
        let selector = CommentSelector::new(&catalog, &picker);
        // lowRisk has four lines; index 5 wraps to 1
        assert_eq!(selector.select(CommentCategory::LowRisk), catalog.low_risk[1]);
    }

    #[test]
    fn test_random_picker_stays_in_bounds() {
        let catalog = CommentCatalog::default();
        let selector = CommentSelector::new(&catalog, &RandomPicker);
        for _ in 0..50 {
            let line = selector.select(CommentCategory::HighRisk);
            assert!(catalog.high_risk.contains(&line));
        }
    }

    #[test]
    fn test_empty_category_yields_empty_comment() {
        let mut catalog = CommentCatalog::default();
        catalog.trending_up.clear();
        let selector = CommentSelector::new(&catalog, &RandomPicker);
        assert!(selector.select(CommentCategory::TrendingUp).is_empty());
    }
}
