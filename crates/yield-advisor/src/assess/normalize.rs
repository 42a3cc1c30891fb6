//! Pool Normalizer
//!
//! Validates raw records and annotates the survivors with risk, trend and
//! commentary. A malformed record is skipped, never fatal to the batch.

use tracing::debug;

use super::commentary::{CommentCategory, CommentPicker, CommentSelector};
use super::risk::RiskAssessor;
use super::trend::classify_trend;
use crate::config::EngineConfig;
use crate::model::{format_tvl, Exposure, Pool, PoolSnapshot, RawPool};

pub struct PoolNormalizer<'a> {
    config: &'a EngineConfig,
    picker: &'a dyn CommentPicker,
}

impl<'a> PoolNormalizer<'a> {
    pub fn new(config: &'a EngineConfig, picker: &'a dyn CommentPicker) -> Self {
        Self { config, picker }
    }

    /// Validate a raw record.
    ///
    /// Chain, project and symbol must be present and TVL must be a finite,
    /// non-negative number. Optional numeric fields that are not finite are
    /// treated as absent.
    pub fn snapshot(raw: &RawPool) -> Option<PoolSnapshot> {
        let chain = raw.chain.clone()?;
        let protocol = raw.project.clone()?;
        let asset = raw.symbol.clone()?;
        let tvl_usd = finite(raw.tvl_usd).filter(|tvl| *tvl >= 0.0)?;

        Some(PoolSnapshot {
            pool_id: raw.pool.clone(),
            chain,
            protocol,
            asset,
            tvl_usd,
            apy: finite(raw.apy),
            apy_base: finite(raw.apy_base),
            apy_reward: finite(raw.apy_reward),
            reward_tokens: raw.reward_tokens.clone().unwrap_or_default(),
            stablecoin: raw.stablecoin.unwrap_or(false),
            il_risk: raw.il_risk.as_deref() == Some("yes"),
            exposure: raw
                .exposure
                .as_deref()
                .map_or(Exposure::Other, Exposure::parse),
            apy_pct_1d: finite(raw.apy_pct_1d),
            apy_pct_7d: finite(raw.apy_pct_7d),
            apy_pct_30d: finite(raw.apy_pct_30d),
            prediction: raw.predictions.clone(),
        })
    }

    /// Score, label and comment a validated pool
    pub fn annotate(&self, snapshot: PoolSnapshot) -> Pool {
        let risk = RiskAssessor::new(&self.config.risk).assess(&snapshot);
        let trend = classify_trend(snapshot.apy_pct_7d, &self.config.trend);
        let category = CommentCategory::for_pool(&snapshot, risk.level, trend.label);
        let comment = CommentSelector::new(&self.config.comments, self.picker).select(category);

        Pool {
            tvl_display: format_tvl(snapshot.tvl_usd),
            snapshot,
            risk,
            trend,
            comment,
        }
    }

    pub fn normalize(&self, raw: &RawPool) -> Option<Pool> {
        Self::snapshot(raw).map(|snapshot| self.annotate(snapshot))
    }
}

/// Normalize a whole snapshot, dropping malformed records
pub fn normalize_snapshot(
    raws: &[RawPool],
    config: &EngineConfig,
    picker: &dyn CommentPicker,
) -> Vec<Pool> {
    let normalizer = PoolNormalizer::new(config, picker);
    let pools: Vec<Pool> = raws.iter().filter_map(|raw| normalizer.normalize(raw)).collect();

    let dropped = raws.len() - pools.len();
    if dropped > 0 {
        debug!(dropped, kept = pools.len(), "Skipped malformed pool records");
    }

    pools
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assess::FixedPicker;
    use crate::model::{RiskLevel, Trend};

    #[test]
    fn test_malformed_records_are_dropped() {
        let mut missing_symbol = RawPool::new("Ethereum", "aave-v3", "USDC", 1e8, 4.0);
        missing_symbol.symbol = None;
        let mut negative_tvl = RawPool::new("Ethereum", "aave-v3", "DAI", 1e8, 4.0);
        negative_tvl.tvl_usd = Some(-1.0);
        let mut nan_tvl = RawPool::new("Ethereum", "aave-v3", "DAI", 1e8, 4.0);
        nan_tvl.tvl_usd = Some(f64::NAN);
        let good = RawPool::new("Ethereum", "aave-v3", "USDT", 1e8, 4.0);

        let config = EngineConfig::default();
        let pools = normalize_snapshot(
            &[missing_symbol, negative_tvl, nan_tvl, good],
            &config,
            &FixedPicker(0),
        );

        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].asset(), "USDT");
    }

    #[test]
    fn test_non_finite_apy_becomes_absent() {
        let mut raw = RawPool::new("Ethereum", "p", "X", 1e8, 4.0);
        raw.apy = Some(f64::INFINITY);
        let snapshot = PoolNormalizer::snapshot(&raw).unwrap();
        assert!(snapshot.apy.is_none());
    }

    #[test]
    fn test_flags_are_parsed_exactly() {
        let raw = RawPool::new("Ethereum", "p", "X", 1e8, 4.0)
            .with_il_risk("YES")
            .with_exposure("Multi");
        let snapshot = PoolNormalizer::snapshot(&raw).unwrap();
        assert!(!snapshot.il_risk);
        assert_eq!(snapshot.exposure, Exposure::Other);
    }

    #[test]
    fn test_annotation_fills_derived_fields() {
        let config = EngineConfig::default();
        let picker = FixedPicker(0);
        let normalizer = PoolNormalizer::new(&config, &picker);

        let pool = normalizer
            .normalize(&RawPool::new("Ethereum", "lido", "STETH", 2.5e10, 3.1).with_change_7d(6.0))
            .unwrap();

        assert_eq!(pool.risk_level(), RiskLevel::Low);
        assert_eq!(pool.trend.label, Trend::Up);
        assert_eq!(pool.tvl_display, "$25.00B");
        assert_eq!(pool.comment, config.comments.low_risk[0]);
    }

    #[test]
    fn test_pool_serializes_camel_case_with_rounded_apy() {
        let config = EngineConfig::default();
        let picker = FixedPicker(0);
        let pool = PoolNormalizer::new(&config, &picker)
            .normalize(&RawPool::new("Ethereum", "aave-v3", "USDC", 1.5e8, 4.2187).with_base_and_reward(4.2187, 0.0))
            .unwrap();

        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json["apy"], 4.22);
        assert_eq!(json["apyBase"], 4.22);
        assert!(json["apyReward"].is_null());
        assert_eq!(json["tvl"], "$150.00M");
        assert_eq!(json["riskLevel"], "low");
        assert_eq!(json["trend"], "stable");
        assert_eq!(json["riskFactors"][0], "No major risk factors identified");
    }
}
