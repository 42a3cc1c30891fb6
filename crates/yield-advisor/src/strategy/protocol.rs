//! Protocol Overview
//!
//! Deep-dive statistics for a single protocol, the numeric half of the
//! `analyze-protocol` entrypoint.

use serde::{Deserialize, Serialize};

use super::filter::sort_by_apy_desc;
use crate::config::ChainAliases;
use crate::error::{AdvisorError, Result};
use crate::model::{format_tvl, round2, Pool, RiskLevel};

/// Pools listed in an overview
const TOP_POOLS: usize = 15;

const MIN_PROTOCOL_NAME: usize = 2;

fn default_chain() -> String {
    ChainAliases::ALL.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolRequest {
    pub protocol: String,

    /// Exact chain name (case-insensitive), or `all`
    #[serde(default = "default_chain")]
    pub chain: String,
}

impl ProtocolRequest {
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            chain: default_chain(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.protocol.trim().chars().count() < MIN_PROTOCOL_NAME {
            return Err(AdvisorError::InvalidRequest("Protocol name required".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPool {
    pub chain: String,
    pub asset: String,
    pub apy: f64,
    pub tvl: String,
    pub risk: RiskLevel,
}

impl From<&Pool> for TopPool {
    fn from(pool: &Pool) -> Self {
        Self {
            chain: pool.chain().to_string(),
            asset: pool.asset().to_string(),
            apy: round2(pool.apy_or_zero()),
            tvl: pool.tvl_display.clone(),
            risk: pool.risk_level(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolOverview {
    pub protocol: String,
    pub total_tvl: String,
    pub tvl_raw: f64,

    /// Mean over every matching pool; absent APY counts as zero
    pub average_apy: f64,
    pub pool_count: usize,

    /// Distinct chains, first-seen order
    pub active_chains: Vec<String>,
    pub top_pools: Vec<TopPool>,
}

impl ProtocolOverview {
    pub fn build(pools: &[Pool], request: &ProtocolRequest) -> Result<Self> {
        if pools.is_empty() {
            return Err(AdvisorError::NoData("pool snapshot is empty".into()));
        }
        request.validate()?;

        let needle = request.protocol.to_lowercase();
        let any_chain = request.chain.eq_ignore_ascii_case(ChainAliases::ALL);
        let mut matching: Vec<Pool> = pools
            .iter()
            .filter(|pool| pool.protocol().to_lowercase().contains(&needle))
            .filter(|pool| any_chain || pool.chain().eq_ignore_ascii_case(&request.chain))
            .cloned()
            .collect();

        if matching.is_empty() {
            return Err(AdvisorError::NoMatch(format!("No pools found for {}", request.protocol)));
        }

        let tvl_raw: f64 = matching.iter().map(Pool::tvl_usd).sum();
        #[allow(clippy::cast_precision_loss)]
        let average_apy = matching.iter().map(Pool::apy_or_zero).sum::<f64>() / matching.len() as f64;

        let mut active_chains: Vec<String> = Vec::new();
        for pool in &matching {
            if !active_chains.iter().any(|c| c == pool.chain()) {
                active_chains.push(pool.chain().to_string());
            }
        }

        let pool_count = matching.len();
        sort_by_apy_desc(&mut matching);

        Ok(Self {
            protocol: request.protocol.clone(),
            total_tvl: format_tvl(tvl_raw),
            tvl_raw,
            average_apy: round2(average_apy),
            pool_count,
            active_chains,
            top_pools: matching.iter().take(TOP_POOLS).map(TopPool::from).collect(),
        })
    }
}
