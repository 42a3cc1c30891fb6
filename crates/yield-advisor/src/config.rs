//! Engine Configuration
//!
//! Chain aliases, rubric weights, allocation tiers and commentary lines as
//! explicit immutable data. `EngineConfig::default()` reproduces the
//! production constants; callers may deserialize overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};
use crate::model::{RiskLevel, RiskTolerance};

/// Chain key to chain-name alias table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainAliases {
    aliases: BTreeMap<String, Vec<String>>,
}

impl Default for ChainAliases {
    fn default() -> Self {
        let table: [(&str, &[&str]); 8] = [
            ("base", &["Base"]),
            ("ethereum", &["Ethereum"]),
            ("solana", &["Solana"]),
            ("arbitrum", &["Arbitrum"]),
            ("optimism", &["Optimism"]),
            ("polygon", &["Polygon"]),
            ("avalanche", &["Avalanche"]),
            ("bsc", &["BSC", "Binance"]),
        ];

        Self {
            aliases: table
                .into_iter()
                .map(|(key, names)| (key.to_string(), names.iter().map(|n| n.to_string()).collect()))
                .collect(),
        }
    }
}

impl ChainAliases {
    /// The wildcard key that matches every chain
    pub const ALL: &'static str = "all";

    /// Chain names a key stands for. Unknown keys stand for themselves.
    pub fn names_for<'a>(&'a self, key: &'a str) -> Vec<&'a str> {
        match self.aliases.get(&key.to_lowercase()) {
            Some(names) => names.iter().map(String::as_str).collect(),
            None => vec![key],
        }
    }

    /// Case-insensitive substring match of a pool's chain against a key
    pub fn matches(&self, key: &str, pool_chain: &str) -> bool {
        if key.eq_ignore_ascii_case(Self::ALL) {
            return true;
        }
        let chain = pool_chain.to_lowercase();
        self.names_for(key)
            .iter()
            .any(|name| chain.contains(&name.to_lowercase()))
    }

    pub fn matches_any(&self, keys: &[String], pool_chain: &str) -> bool {
        keys.iter().any(|key| self.matches(key, pool_chain))
    }

    /// Known chain keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }
}

/// A threshold that adds points and a factor when crossed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreTier {
    pub threshold: f64,
    pub points: u32,
    pub factor: String,
}

impl ScoreTier {
    fn new(threshold: f64, points: u32, factor: &str) -> Self {
        Self {
            threshold,
            points,
            factor: factor.into(),
        }
    }
}

/// A boolean condition that adds points and a factor when true
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreFlag {
    pub points: u32,
    pub factor: String,
}

/// Additive risk rubric. Tier lists are checked in order and the first
/// crossed tier wins, so TVL tiers ascend and APY/reward tiers descend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskRubric {
    /// Applies when `tvl_usd < threshold`
    pub tvl_tiers: Vec<ScoreTier>,

    /// Applies when `apy > threshold`
    pub apy_tiers: Vec<ScoreTier>,
    pub impermanent_loss: ScoreFlag,
    pub multi_exposure: ScoreFlag,

    /// Applies when `apy_reward / (apy_base + apy_reward) > threshold`
    pub reward_tiers: Vec<ScoreTier>,

    /// Applies when `apy_pct_7d < threshold`
    pub trend_drop: ScoreTier,

    /// Minimum score for `High`
    pub high_at: u32,

    /// Minimum score for `Medium`
    pub medium_at: u32,

    /// Sole factor when nothing fired
    pub no_factors: String,
}

impl Default for RiskRubric {
    fn default() -> Self {
        Self {
            tvl_tiers: vec![
                ScoreTier::new(1_000_000.0, 3, "Low TVL (<$1M)"),
                ScoreTier::new(10_000_000.0, 1, "Moderate TVL (<$10M)"),
            ],
            apy_tiers: vec![
                ScoreTier::new(100.0, 3, "Extremely high APY (>100%)"),
                ScoreTier::new(50.0, 2, "Very high APY (>50%)"),
                ScoreTier::new(20.0, 1, "High APY (>20%)"),
            ],
            impermanent_loss: ScoreFlag {
                points: 1,
                factor: "Impermanent loss exposure".into(),
            },
            multi_exposure: ScoreFlag {
                points: 1,
                factor: "Multi-asset exposure".into(),
            },
            reward_tiers: vec![
                ScoreTier::new(0.8, 2, "Yield mostly from reward tokens"),
                ScoreTier::new(0.5, 1, "Significant reward token dependency"),
            ],
            trend_drop: ScoreTier::new(-20.0, 1, "APY dropped >20% in 7 days"),
            high_at: 5,
            medium_at: 2,
            no_factors: "No major risk factors identified".into(),
        }
    }
}

impl RiskRubric {
    pub fn level_for(&self, score: u32) -> RiskLevel {
        if score >= self.high_at {
            RiskLevel::High
        } else if score >= self.medium_at {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// 7-day APY change bounds for trend labels (percent)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendThresholds {
    pub up_above: f64,
    pub down_below: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            up_above: 5.0,
            down_below: -5.0,
        }
    }
}

/// Eligibility and sizing rules for one risk tolerance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationTier {
    /// Highest admissible risk level; `None` admits everything
    pub max_risk: Option<RiskLevel>,

    /// Pools must have strictly more TVL than this
    pub min_tvl_exclusive: f64,
    pub max_positions: usize,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskMultipliers {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl RiskMultipliers {
    pub fn for_level(&self, level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationPolicy {
    pub conservative: AllocationTier,
    pub moderate: AllocationTier,
    pub aggressive: AllocationTier,
    pub risk_multipliers: RiskMultipliers,

    /// Largest share any single position may take before reconciliation
    pub position_cap_percent: f64,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            conservative: AllocationTier {
                max_risk: Some(RiskLevel::Low),
                min_tvl_exclusive: 10_000_000.0,
                max_positions: 5,
                description: "Mainly blue-chip protocols with >$10M TVL".into(),
            },
            moderate: AllocationTier {
                max_risk: Some(RiskLevel::Medium),
                min_tvl_exclusive: 1_000_000.0,
                max_positions: 7,
                description: "Mix of established and emerging protocols, no high-risk".into(),
            },
            aggressive: AllocationTier {
                max_risk: None,
                min_tvl_exclusive: 100_000.0,
                max_positions: 10,
                description: "Includes high-risk, high-reward opportunities".into(),
            },
            risk_multipliers: RiskMultipliers {
                low: 1.0,
                medium: 0.7,
                high: 0.4,
            },
            position_cap_percent: 30.0,
        }
    }
}

impl AllocationPolicy {
    pub fn tier(&self, tolerance: RiskTolerance) -> &AllocationTier {
        match tolerance {
            RiskTolerance::Conservative => &self.conservative,
            RiskTolerance::Moderate => &self.moderate,
            RiskTolerance::Aggressive => &self.aggressive,
        }
    }
}

/// Flavor-text lines per commentary category
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCatalog {
    pub high_apy: Vec<String>,
    pub low_risk: Vec<String>,
    pub medium_risk: Vec<String>,
    pub high_risk: Vec<String>,
    pub stablecoin: Vec<String>,
    pub il_pool: Vec<String>,
    pub trending_up: Vec<String>,
    pub trending_down: Vec<String>,
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for CommentCatalog {
    fn default() -> Self {
        Self {
            high_apy: lines(&[
                "APY this high usually means you're the yield. Proceed with caution.",
                "Numbers like these are either a goldmine or a rug in progress. Probably the latter.",
                "When yield is too good to be true, you're not the farmer - you're the crop.",
                "This APY is giving 'please provide exit liquidity' energy.",
            ]),
            low_risk: lines(&[
                "Boring and reliable. The Honda Civic of DeFi.",
                "Safe enough that you might actually sleep at night.",
                "Conservative choice. Your portfolio won't be exciting, but it'll probably exist tomorrow.",
                "This is what 'sustainable yield' looks like. Not sexy, but real.",
            ]),
            medium_risk: lines(&[
                "Middle of the road. Some risk, some reward. Standard DeFi stuff.",
                "Not quite degen, not quite boomer. A balanced position.",
                "Reasonable risk for reasonable returns. How novel.",
            ]),
            high_risk: lines(&[
                "Full degen mode. May the odds be ever in your favor.",
                "This is the financial equivalent of free soloing. Exciting until it isn't.",
                "High risk, high reward, high chance of becoming a cautionary tale.",
                "Only put in what you can watch go to zero while maintaining inner peace.",
            ]),
            stablecoin: lines(&[
                "Stablecoin yield - the closest thing to 'safe' in DeFi, which isn't saying much.",
                "At least you're not exposed to price volatility. Just smart contract risk, oracle risk, depegging risk...",
            ]),
            il_pool: lines(&[
                "LP position with impermanent loss risk. Math will punish you if assets diverge.",
                "Impermanent loss is permanent if you panic sell. Just saying.",
            ]),
            trending_up: lines(&[
                "APY trending up. Either more rewards or less TVL. Figure out which.",
            ]),
            trending_down: lines(&[
                "APY falling. The early farmers have harvested. You're arriving for the scraps.",
            ]),
        }
    }
}

/// Everything the engine needs, bundled
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub chains: ChainAliases,
    #[serde(default)]
    pub risk: RiskRubric,
    #[serde(default)]
    pub trend: TrendThresholds,
    #[serde(default)]
    pub allocation: AllocationPolicy,
    #[serde(default)]
    pub comments: CommentCatalog,
}

impl EngineConfig {
    /// Reject configurations the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        let catalog = &self.comments;
        let categories = [
            ("highApy", &catalog.high_apy),
            ("lowRisk", &catalog.low_risk),
            ("mediumRisk", &catalog.medium_risk),
            ("highRisk", &catalog.high_risk),
            ("stablecoin", &catalog.stablecoin),
            ("ilPool", &catalog.il_pool),
            ("trendingUp", &catalog.trending_up),
            ("trendingDown", &catalog.trending_down),
        ];
        if let Some((name, _)) = categories.iter().find(|(_, lines)| lines.is_empty()) {
            return Err(AdvisorError::Config(format!("comment category '{name}' has no lines")));
        }

        if self.risk.medium_at > self.risk.high_at {
            return Err(AdvisorError::Config("medium_at must not exceed high_at".into()));
        }

        if self.trend.down_below > self.trend.up_above {
            return Err(AdvisorError::Config("trend thresholds are inverted".into()));
        }

        let cap = self.allocation.position_cap_percent;
        if !(cap > 0.0 && cap <= 100.0) {
            return Err(AdvisorError::Config(format!("position cap {cap}% outside (0, 100]")));
        }

        for tolerance in [RiskTolerance::Conservative, RiskTolerance::Moderate, RiskTolerance::Aggressive] {
            if self.allocation.tier(tolerance).max_positions == 0 {
                return Err(AdvisorError::Config(format!(
                    "{} tier allows zero positions",
                    tolerance.as_str()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_chain_alias_matching() {
        let chains = ChainAliases::default();
        assert!(chains.matches("bsc", "BSC"));
        assert!(chains.matches("bsc", "Binance"));
        assert!(chains.matches("ethereum", "Ethereum"));
        assert!(!chains.matches("ethereum", "Arbitrum"));
        assert!(chains.matches("all", "Anything"));
    }

    #[test]
    fn test_unknown_chain_key_aliases_to_itself() {
        let chains = ChainAliases::default();
        assert_eq!(chains.names_for("Fantom"), vec!["Fantom"]);
        assert!(chains.matches("fantom", "Fantom"));
    }

    #[test]
    fn test_empty_comment_category_rejected() {
        let mut config = EngineConfig::default();
        config.comments.trending_up.clear();
        assert!(matches!(config.validate(), Err(AdvisorError::Config(_))));
    }

    #[test]
    fn test_risk_level_thresholds() {
        let rubric = RiskRubric::default();
        assert_eq!(rubric.level_for(0), RiskLevel::Low);
        assert_eq!(rubric.level_for(1), RiskLevel::Low);
        assert_eq!(rubric.level_for(2), RiskLevel::Medium);
        assert_eq!(rubric.level_for(4), RiskLevel::Medium);
        assert_eq!(rubric.level_for(5), RiskLevel::High);
    }
}
