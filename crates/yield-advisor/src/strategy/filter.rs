//! Yield Filter/Ranker
//!
//! Independent, ANDed predicates over annotated pools followed by a stable
//! descending APY sort and a result limit.

use serde::{Deserialize, Serialize};

use crate::config::ChainAliases;
use crate::error::{AdvisorError, Result};
use crate::model::{round2, Pool, RiskLevel};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 50;

const COMMENT_EMPTY: &str = "No pools match your criteria. Either your standards are too high or the market is too boring right now.";
const COMMENT_TOO_GOOD: &str = "These yields look great on paper. Remember: in DeFi, when something looks too good to be true, you're usually the product, not the customer.";
const COMMENT_GAMBLING: &str = "Most of these are high-risk plays. You're not yield farming, you're yield gambling. Know the difference.";
const COMMENT_CONSERVATIVE: &str = "Relatively conservative options. Won't make you rich, probably won't make you poor either.";
const COMMENT_MIXED: &str = "Mixed bag of opportunities. Do your own research on each protocol before aping in.";

/// Average APY above which a result set is called "too good to be true"
const SUSPICIOUS_AVERAGE_APY: f64 = 30.0;

fn default_chain() -> String {
    ChainAliases::ALL.to_string()
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Chain key, or `all`
    #[serde(default = "default_chain")]
    pub chain: String,

    /// Case-insensitive substring of the pool symbol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_apy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_apy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_tvl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_risk: Option<RiskLevel>,
    #[serde(default)]
    pub stablecoin_only: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            chain: default_chain(),
            asset: None,
            min_apy: None,
            max_apy: None,
            min_tvl: None,
            max_risk: None,
            stablecoin_only: false,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl FilterCriteria {
    pub fn validate(&self) -> Result<()> {
        if self.min_apy.is_some_and(|min| !(min >= 0.0)) {
            return Err(AdvisorError::InvalidRequest("minApy must be at least 0".into()));
        }
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(AdvisorError::InvalidRequest(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(())
    }

    /// Whether a pool passes every predicate
    pub fn admits(&self, pool: &Pool, chains: &ChainAliases) -> bool {
        let Some(apy) = pool.snapshot.yield_apy() else {
            return false;
        };

        chains.matches(&self.chain, pool.chain())
            && self
                .asset
                .as_ref()
                .is_none_or(|asset| pool.asset().to_lowercase().contains(&asset.to_lowercase()))
            && self.min_apy.is_none_or(|min| apy >= min)
            && self.max_apy.is_none_or(|max| apy <= max)
            && self.min_tvl.is_none_or(|min| pool.tvl_usd() >= min)
            && self.max_risk.is_none_or(|max| pool.risk_level() <= max)
            && (!self.stablecoin_only || pool.snapshot.stablecoin)
    }
}

/// Filter, sort descending by raw APY (stable) and truncate to the limit
pub fn filter_and_rank(pools: Vec<Pool>, criteria: &FilterCriteria, chains: &ChainAliases) -> Vec<Pool> {
    let mut matched: Vec<Pool> = pools
        .into_iter()
        .filter(|pool| criteria.admits(pool, chains))
        .collect();

    sort_by_apy_desc(&mut matched);
    matched.truncate(criteria.limit);
    matched
}

/// Stable descending sort on raw APY
pub(crate) fn sort_by_apy_desc(pools: &mut [Pool]) {
    pools.sort_by(|a, b| b.apy_or_zero().total_cmp(&a.apy_or_zero()));
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RiskDistribution {
    pub fn of<'a>(pools: impl IntoIterator<Item = &'a Pool>) -> Self {
        pools.into_iter().fold(Self::default(), |mut dist, pool| {
            match pool.risk_level() {
                RiskLevel::Low => dist.low += 1,
                RiskLevel::Medium => dist.medium += 1,
                RiskLevel::High => dist.high += 1,
            }
            dist
        })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindSummary {
    pub total_found: usize,

    /// Mean APY of the returned pools, two decimals
    pub average_apy: f64,
    pub risk_distribution: RiskDistribution,
    pub filters: FilterCriteria,
}

/// Ranked yields with summary statistics
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindReport {
    pub overall_comment: String,
    pub summary: FindSummary,
    pub yields: Vec<Pool>,
}

impl FindReport {
    /// Build a report from the normalized snapshot.
    ///
    /// An empty snapshot is `NoData`. Criteria that match nothing still
    /// produce a report, with zero yields.
    pub fn build(pools: Vec<Pool>, criteria: &FilterCriteria, chains: &ChainAliases) -> Result<Self> {
        if pools.is_empty() {
            return Err(AdvisorError::NoData("pool snapshot is empty".into()));
        }
        criteria.validate()?;

        let available = pools.len();
        let yields = filter_and_rank(pools, criteria, chains);
        tracing::debug!(available, matched = yields.len(), chain = %criteria.chain, "Filtered yields");

        let average_apy = if yields.is_empty() {
            0.0
        } else {
            yields.iter().map(Pool::apy_or_zero).sum::<f64>() / yields.len() as f64
        };
        let risk_distribution = RiskDistribution::of(&yields);

        Ok(Self {
            overall_comment: overall_comment(yields.len(), average_apy, risk_distribution).into(),
            summary: FindSummary {
                total_found: yields.len(),
                average_apy: round2(average_apy),
                risk_distribution,
                filters: criteria.clone(),
            },
            yields,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.yields.is_empty()
    }
}

fn overall_comment(count: usize, average_apy: f64, dist: RiskDistribution) -> &'static str {
    if count == 0 {
        COMMENT_EMPTY
    } else if average_apy > SUSPICIOUS_AVERAGE_APY {
        COMMENT_TOO_GOOD
    } else if dist.high > dist.low {
        COMMENT_GAMBLING
    } else if dist.low as f64 > count as f64 / 2.0 {
        COMMENT_CONSERVATIVE
    } else {
        COMMENT_MIXED
    }
}
