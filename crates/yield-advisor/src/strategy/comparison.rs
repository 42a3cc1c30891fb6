//! Comparator
//!
//! Head-to-head statistics for a handful of protocols.

use serde::{Deserialize, Serialize};

use super::filter::sort_by_apy_desc;
use crate::config::ChainAliases;
use crate::error::{AdvisorError, Result};
use crate::model::{format_tvl, round2, Pool, RiskLevel};

pub const MIN_PROTOCOLS: usize = 2;
pub const MAX_PROTOCOLS: usize = 10;

/// Pools listed per protocol in the breakdown
const BREAKDOWN_POOLS: usize = 5;

/// Leader's average APY must exceed the runner-up's by this factor for a landslide
const LANDSLIDE_FACTOR: f64 = 1.5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub protocols: Vec<String>,

    /// Optional chain key applied to every protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
}

impl ComparisonRequest {
    pub fn new(protocols: &[&str]) -> Self {
        Self {
            protocols: protocols.iter().map(|p| p.to_string()).collect(),
            chain: None,
        }
    }

    /// Protocol names without case-insensitive duplicates, first spelling kept
    pub fn distinct_protocols(&self) -> Vec<&str> {
        let mut seen = Vec::<String>::new();
        self.protocols
            .iter()
            .filter(|name| {
                let key = name.to_lowercase();
                if seen.contains(&key) {
                    false
                } else {
                    seen.push(key);
                    true
                }
            })
            .map(String::as_str)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let count = self.distinct_protocols().len();
        if self.protocols.len() > MAX_PROTOCOLS || count < MIN_PROTOCOLS {
            return Err(AdvisorError::InvalidRequest(format!(
                "compare needs between {MIN_PROTOCOLS} and {MAX_PROTOCOLS} distinct protocols"
            )));
        }
        Ok(())
    }
}

/// Aggregate risk character of a protocol's pools
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolRiskProfile {
    #[serde(rename = "No data")]
    NoData,
    Aggressive,
    Conservative,
    Balanced,
}

impl ProtocolRiskProfile {
    pub fn classify(pools: &[&Pool]) -> Self {
        if pools.is_empty() {
            return Self::NoData;
        }
        let high = pools.iter().filter(|p| p.risk_level() == RiskLevel::High).count();
        let low = pools.iter().filter(|p| p.risk_level() == RiskLevel::Low).count();

        #[allow(clippy::cast_precision_loss)]
        let majority_low = low as f64 > pools.len() as f64 / 2.0;
        if high > low {
            Self::Aggressive
        } else if majority_low {
            Self::Conservative
        } else {
            Self::Balanced
        }
    }
}

/// Per-protocol detail
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolBreakdown {
    pub protocol: String,

    /// Mean APY over pools with positive APY
    pub average_apy: f64,

    /// TVL over every matching pool, yielding or not
    pub total_tvl: f64,
    pub risk_profile: ProtocolRiskProfile,

    /// Pools with positive APY
    pub pool_count: usize,

    /// Highest-APY pools
    pub pools: Vec<Pool>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolRanking {
    pub protocol: String,
    pub average_apy: f64,
    pub total_tvl: String,
    pub pool_count: usize,
    pub risk_profile: ProtocolRiskProfile,
}

impl From<&ProtocolBreakdown> for ProtocolRanking {
    fn from(b: &ProtocolBreakdown) -> Self {
        Self {
            protocol: b.protocol.clone(),
            average_apy: round2(b.average_apy),
            total_tvl: format_tvl(b.total_tvl),
            pool_count: b.pool_count,
            risk_profile: b.risk_profile,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub verdict: String,
    pub winner: Option<String>,

    /// Descending average APY; ties keep request order
    pub rankings: Vec<ProtocolRanking>,

    /// In request order
    pub breakdown: Vec<ProtocolBreakdown>,
}

pub struct Comparator<'a> {
    chains: &'a ChainAliases,
}

impl<'a> Comparator<'a> {
    pub fn new(chains: &'a ChainAliases) -> Self {
        Self { chains }
    }

    /// Statistics for one protocol name (case-insensitive substring of the project)
    pub fn breakdown(&self, pools: &[Pool], protocol: &str, chain: Option<&str>) -> ProtocolBreakdown {
        let needle = protocol.to_lowercase();
        let matching: Vec<&Pool> = pools
            .iter()
            .filter(|pool| pool.protocol().to_lowercase().contains(&needle))
            .filter(|pool| chain.is_none_or(|key| self.chains.matches(key, pool.chain())))
            .collect();

        let valid: Vec<&Pool> = matching.iter().copied().filter(|pool| pool.has_yield()).collect();

        #[allow(clippy::cast_precision_loss)]
        let average_apy = if valid.is_empty() {
            0.0
        } else {
            valid.iter().map(|pool| pool.apy_or_zero()).sum::<f64>() / valid.len() as f64
        };

        let mut top: Vec<Pool> = valid.iter().map(|pool| (*pool).clone()).collect();
        sort_by_apy_desc(&mut top);
        top.truncate(BREAKDOWN_POOLS);

        ProtocolBreakdown {
            protocol: protocol.to_string(),
            average_apy,
            total_tvl: matching.iter().map(|pool| pool.tvl_usd()).sum(),
            risk_profile: ProtocolRiskProfile::classify(&valid),
            pool_count: valid.len(),
            pools: top,
        }
    }

    pub fn compare(&self, pools: &[Pool], request: &ComparisonRequest) -> Result<ComparisonReport> {
        if pools.is_empty() {
            return Err(AdvisorError::NoData("pool snapshot is empty".into()));
        }
        request.validate()?;

        let breakdown: Vec<ProtocolBreakdown> = request
            .distinct_protocols()
            .into_iter()
            .map(|name| self.breakdown(pools, name, request.chain.as_deref()))
            .collect();

        let mut rankings: Vec<ProtocolRanking> = breakdown.iter().map(ProtocolRanking::from).collect();
        rankings.sort_by(|a, b| b.average_apy.total_cmp(&a.average_apy));

        let winner = rankings
            .first()
            .filter(|leader| leader.average_apy != 0.0)
            .map(|leader| leader.protocol.clone());

        let verdict = verdict(winner.as_deref(), &rankings);
        tracing::debug!(protocols = breakdown.len(), winner = ?winner, "Protocols compared");

        Ok(ComparisonReport {
            verdict,
            winner,
            rankings,
            breakdown,
        })
    }
}

fn verdict(winner: Option<&str>, rankings: &[ProtocolRanking]) -> String {
    let Some(winner) = winner else {
        return "No clear winner - either the protocols aren't on DeFiLlama or they have no active yield pools.".into();
    };

    match rankings {
        [first, second, ..] if first.average_apy > second.average_apy * LANDSLIDE_FACTOR => format!(
            "{winner} wins by a landslide, but ask yourself why the APY is so much higher. Usually it's either more risk or more inflation."
        ),
        _ => format!(
            "{winner} leads on raw APY, but consider TVL and risk profile before deciding. Higher yield often means higher risk of getting rekt."
        ),
    }
}
