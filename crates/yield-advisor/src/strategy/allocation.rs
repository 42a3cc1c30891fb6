//! Allocator
//!
//! Picks pools for a risk tolerance, ranks them by risk-adjusted APY and
//! splits capital into integer percentages that always sum to 100.
//!
//! ## Percentage pipeline
//!
//! ```text
//! raw_i      = apy_i / Σapy * 100
//! capped_i   = min(raw_i, cap)                 (excess is not redistributed)
//! rounded_i  = round_half_up(capped_i)
//! even_i     = round_half_up(rounded_i + (100 - Σrounded) / n)
//! final_i    = even_i ± 1, applied in rank order until Σ = 100
//! ```
//!
//! Reconciliation can lift a position above the cap. The lift is bounded:
//! `final_i <= rounded_i + (100 - Σrounded) / n + 1.5`, and when no position
//! was capped `final_i <= rounded_i + 1`. The sum-to-100 guarantee takes
//! precedence over the cap.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{AllocationPolicy, ChainAliases};
use crate::error::{AdvisorError, Result};
use crate::model::{round2, Allocation, Pool, RiskTolerance};

/// Smallest amount an allocation request may specify (USD)
pub const MIN_AMOUNT: Decimal = Decimal::ONE_HUNDRED;

pub const NO_SUITABLE_POOLS: &str = "No suitable pools found for your criteria";

pub const WARNINGS: [&str; 4] = [
    "This is algorithmic allocation, not financial advice",
    "APYs change constantly - rebalance regularly",
    "Smart contract risk exists for all protocols",
    "Past yields don't guarantee future returns",
];

fn default_chains() -> Vec<String> {
    vec!["ethereum".to_string()]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub risk_tolerance: RiskTolerance,

    /// Capital to allocate (USD)
    pub amount: Decimal,

    /// Chain keys; a pool on any of them qualifies
    #[serde(default = "default_chains")]
    pub chains: Vec<String>,
    #[serde(default)]
    pub stablecoin_only: bool,
}

impl AllocationRequest {
    pub fn new(risk_tolerance: RiskTolerance, amount: Decimal) -> Self {
        Self {
            risk_tolerance,
            amount,
            chains: default_chains(),
            stablecoin_only: false,
        }
    }

    pub fn on_chains(mut self, chains: &[&str]) -> Self {
        self.chains = chains.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount < MIN_AMOUNT {
            return Err(AdvisorError::InvalidRequest(format!(
                "amount must be at least {MIN_AMOUNT}"
            )));
        }
        Ok(())
    }
}

/// A complete allocation for one request
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPlan {
    pub risk_tolerance: RiskTolerance,
    pub total_amount: Decimal,
    pub positions: Vec<Allocation>,

    /// Σ apy_i * percentage_i / 100, two decimals
    pub weighted_apy: f64,
    pub expected_yearly_return: Decimal,

    /// Description of the tolerance tier used
    pub risk_profile: String,
    pub overall_comment: String,
    pub warnings: Vec<String>,
}

impl AllocationPlan {
    pub fn total_percentage(&self) -> u32 {
        self.positions.iter().map(|p| p.percentage).sum()
    }

    pub fn allocated_amount(&self) -> Decimal {
        self.positions.iter().map(|p| p.amount).sum()
    }
}

pub struct Allocator<'a> {
    policy: &'a AllocationPolicy,
    chains: &'a ChainAliases,
}

impl<'a> Allocator<'a> {
    pub fn new(policy: &'a AllocationPolicy, chains: &'a ChainAliases) -> Self {
        Self { policy, chains }
    }

    /// Pools admitted by the request's chains, stablecoin flag and tier,
    /// ranked by risk-adjusted APY and truncated to the tier's position limit
    pub fn select<'p>(&self, pools: &'p [Pool], request: &AllocationRequest) -> Vec<&'p Pool> {
        let tier = self.policy.tier(request.risk_tolerance);
        let multipliers = &self.policy.risk_multipliers;

        let mut eligible: Vec<&Pool> = pools
            .iter()
            .filter(|pool| self.chains.matches_any(&request.chains, pool.chain()))
            .filter(|pool| !request.stablecoin_only || pool.snapshot.stablecoin)
            .filter(|pool| pool.has_yield())
            .filter(|pool| tier.max_risk.is_none_or(|max| pool.risk_level() <= max))
            .filter(|pool| pool.tvl_usd() > tier.min_tvl_exclusive)
            .collect();

        let score = |pool: &Pool| pool.apy_or_zero() * multipliers.for_level(pool.risk_level());
        eligible.sort_by(|a, b| score(b).total_cmp(&score(a)));
        eligible.truncate(tier.max_positions);
        eligible
    }

    pub fn allocate(&self, pools: &[Pool], request: &AllocationRequest) -> Result<AllocationPlan> {
        if pools.is_empty() {
            return Err(AdvisorError::NoData("pool snapshot is empty".into()));
        }
        request.validate()?;

        let selected = self.select(pools, request);
        if selected.is_empty() {
            debug!(
                tolerance = request.risk_tolerance.as_str(),
                chains = ?request.chains,
                "No pools eligible for allocation"
            );
            return Err(AdvisorError::NoMatch(NO_SUITABLE_POOLS.into()));
        }

        let cap = self.policy.position_cap_percent;
        let total_apy: f64 = selected.iter().map(|pool| pool.apy_or_zero()).sum();
        let capped: Vec<f64> = selected
            .iter()
            .map(|pool| (pool.apy_or_zero() / total_apy * 100.0).min(cap))
            .collect();

        let rounded: Vec<i64> = capped.iter().map(|pct| round_half_up(*pct)).collect();
        let percentages = reconcile_percentages(&rounded);

        let positions: Vec<Allocation> = selected
            .iter()
            .zip(capped.iter().zip(percentages))
            .map(|(pool, (capped_pct, pct))| {
                Allocation::new(pool, round2(*capped_pct)).with_percentage(pct, request.amount)
            })
            .collect();

        let weighted_apy: f64 = selected
            .iter()
            .zip(&positions)
            .map(|(pool, position)| pool.apy_or_zero() * f64::from(position.percentage) / 100.0)
            .sum();
        let expected_yearly_return = expected_return(request.amount, weighted_apy)?;

        let tier = self.policy.tier(request.risk_tolerance);
        info!(
            tolerance = request.risk_tolerance.as_str(),
            positions = positions.len(),
            weighted_apy,
            "Allocation computed"
        );

        Ok(AllocationPlan {
            risk_tolerance: request.risk_tolerance,
            total_amount: request.amount,
            positions,
            weighted_apy: round2(weighted_apy),
            expected_yearly_return,
            risk_profile: tier.description.clone(),
            overall_comment: overall_comment(request.risk_tolerance).into(),
            warnings: WARNINGS.iter().map(|w| w.to_string()).collect(),
        })
    }
}

/// `amount * apy / 100`, two decimals; too large for `Decimal` is an invalid request
fn expected_return(amount: Decimal, weighted_apy: f64) -> Result<Decimal> {
    let overflow = || AdvisorError::InvalidRequest("amount too large for the expected return of the selected pools".into());
    let apy = Decimal::from_f64_retain(weighted_apy).ok_or_else(overflow)?;
    amount
        .checked_mul(apy)
        .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
        .map(|value| value.round_dp(2))
        .ok_or_else(overflow)
}

fn overall_comment(tolerance: RiskTolerance) -> &'static str {
    match tolerance {
        RiskTolerance::Conservative => {
            "Conservative allocation focusing on battle-tested protocols. You won't get rich quick, but you probably won't get rekt either."
        }
        RiskTolerance::Moderate => {
            "Balanced approach - some safe harbors, some moonshots. A reasonable strategy if you can resist the urge to go full degen."
        }
        RiskTolerance::Aggressive => {
            "Aggressive allocation with higher yield potential. Also higher potential for watching your portfolio go to zero. You've been warned."
        }
    }
}

/// Round to the nearest integer, halves toward positive infinity
#[allow(clippy::cast_possible_truncation)]
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Bring integer percentages to a total of exactly 100.
///
/// The shortfall (or excess) is first spread evenly and re-rounded. Whatever
/// rounding leaves over is settled one point at a time in rank order.
/// Percentages never go below zero.
pub fn reconcile_percentages(initial: &[i64]) -> Vec<u32> {
    if initial.is_empty() {
        return Vec::new();
    }

    let count = initial.len();
    let sum: i64 = initial.iter().sum();
    let mut pcts: Vec<i64> = if sum == 100 {
        initial.to_vec()
    } else {
        #[allow(clippy::cast_precision_loss)]
        let adjustment = (100 - sum) as f64 / count as f64;
        #[allow(clippy::cast_precision_loss)]
        initial
            .iter()
            .map(|pct| round_half_up(*pct as f64 + adjustment).max(0))
            .collect()
    };

    let mut residual = 100 - pcts.iter().sum::<i64>();
    let mut idx = 0;
    while residual != 0 {
        let slot = &mut pcts[idx % count];
        if residual > 0 {
            *slot += 1;
            residual -= 1;
        } else if *slot > 0 {
            *slot -= 1;
            residual += 1;
        }
        idx += 1;
    }

    pcts.into_iter()
        .map(|pct| u32::try_from(pct).unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assess::{normalize_snapshot, FixedPicker};
    use crate::config::EngineConfig;
    use crate::model::{RawPool, RiskLevel};
    use rust_decimal_macros::dec;

    fn pools(raws: Vec<RawPool>) -> Vec<Pool> {
        normalize_snapshot(&raws, &EngineConfig::default(), &FixedPicker(0))
    }

    fn allocate(pools: &[Pool], request: &AllocationRequest) -> Result<AllocationPlan> {
        let config = EngineConfig::default();
        Allocator::new(&config.allocation, &config.chains).allocate(pools, request)
    }

    fn blue_chips(apys: &[f64]) -> Vec<RawPool> {
        apys.iter()
            .enumerate()
            .map(|(i, apy)| RawPool::new("Ethereum", format!("proto-{i}"), "USDC", 5e7, *apy))
            .collect()
    }

    #[test]
    fn test_reconcile_sums_to_hundred() {
        assert_eq!(reconcile_percentages(&[33, 33, 33]), vec![34, 33, 33]);
        assert_eq!(reconcile_percentages(&[30, 30]), vec![50, 50]);
        assert_eq!(reconcile_percentages(&[25, 25, 25, 25]), vec![25, 25, 25, 25]);
        assert_eq!(
            reconcile_percentages(&[14, 14, 14, 14, 14, 14, 14]),
            vec![15, 15, 14, 14, 14, 14, 14]
        );
        assert_eq!(reconcile_percentages(&[]), Vec::<u32>::new());
    }

    #[test]
    fn test_reconcile_handles_excess() {
        let result = reconcile_percentages(&[51, 50]);
        assert_eq!(result.iter().sum::<u32>(), 100);
    }

    #[test]
    fn test_three_equal_pools() {
        let plan = allocate(&pools(blue_chips(&[8.0, 8.0, 8.0])), &AllocationRequest::new(RiskTolerance::Conservative, dec!(1000))).unwrap();

        let pcts: Vec<u32> = plan.positions.iter().map(|p| p.percentage).collect();
        assert_eq!(pcts, vec![34, 33, 33]);
        assert_eq!(plan.allocated_amount(), dec!(1000));
        assert_eq!(plan.weighted_apy, 8.0);
        assert_eq!(plan.expected_yearly_return, dec!(80.00));
    }

    #[test]
    fn test_capped_positions_reconcile_above_cap() {
        // Two equal pools: raw 50% each, capped to 30%, reconciled back to 50%
        let plan = allocate(&pools(blue_chips(&[6.0, 6.0])), &AllocationRequest::new(RiskTolerance::Conservative, dec!(500))).unwrap();

        assert_eq!(plan.total_percentage(), 100);
        for position in &plan.positions {
            assert_eq!(position.capped_percentage, 30.0);
            assert_eq!(position.percentage, 50);
            assert_eq!(position.amount, dec!(250));
        }
    }

    #[test]
    fn test_reconciliation_bound() {
        let apys = [40.0, 12.0, 9.5, 7.25, 3.0];
        let raws: Vec<RawPool> = apys
            .iter()
            .enumerate()
            .map(|(i, apy)| RawPool::new("Ethereum", format!("p{i}"), "X", 5e7, *apy))
            .collect();
        let config = EngineConfig::default();
        let plan = Allocator::new(&config.allocation, &config.chains)
            .allocate(&pools(raws), &AllocationRequest::new(RiskTolerance::Aggressive, dec!(10000)))
            .unwrap();

        assert_eq!(plan.total_percentage(), 100);

        let rounded: Vec<f64> = plan.positions.iter().map(|p| (p.capped_percentage + 0.5).floor()).collect();
        let shortfall = (100.0 - rounded.iter().sum::<f64>()) / rounded.len() as f64;
        for (position, base) in plan.positions.iter().zip(rounded) {
            assert!(position.capped_percentage <= 30.0);
            assert!(f64::from(position.percentage) <= base + shortfall + 1.5);
        }

        let drift = (plan.allocated_amount() - dec!(10000)).abs();
        assert!(drift <= Decimal::from(plan.positions.len()));
    }

    #[test]
    fn test_uncapped_positions_move_at_most_one_point() {
        let plan = allocate(&pools(blue_chips(&[5.0, 4.0, 3.0, 3.0, 2.0, 2.0, 1.0])), &AllocationRequest::new(RiskTolerance::Moderate, dec!(2500))).unwrap();

        assert_eq!(plan.total_percentage(), 100);
        for position in &plan.positions {
            let base = (position.capped_percentage + 0.5).floor();
            assert!(position.capped_percentage < 30.0);
            assert!((f64::from(position.percentage) - base).abs() <= 1.0);
        }
    }

    #[test]
    fn test_conservative_requires_low_risk_and_large_tvl() {
        // every pool under $10M TVL
        let raws = vec![
            RawPool::new("Ethereum", "a", "USDC", 9e6, 5.0),
            RawPool::new("Ethereum", "b", "DAI", 1e6, 6.0),
        ];
        let result = allocate(&pools(raws), &AllocationRequest::new(RiskTolerance::Conservative, dec!(1000)));
        match result {
            Err(AdvisorError::NoMatch(msg)) => assert_eq!(msg, NO_SUITABLE_POOLS),
            other => panic!("expected NoMatch, got {other:?}"),
        }
    }

    #[test]
    fn test_tvl_floor_is_exclusive() {
        let raws = vec![RawPool::new("Ethereum", "edge", "USDC", 10_000_000.0, 5.0)];
        let result = allocate(&pools(raws), &AllocationRequest::new(RiskTolerance::Moderate, dec!(1000)));
        assert!(result.is_ok());

        let raws = vec![RawPool::new("Ethereum", "edge", "USDC", 1_000_000.0, 5.0)];
        let result = allocate(&pools(raws), &AllocationRequest::new(RiskTolerance::Moderate, dec!(1000)));
        assert!(matches!(result, Err(AdvisorError::NoMatch(_))));
    }

    #[test]
    fn test_empty_snapshot_is_no_data() {
        let result = allocate(&[], &AllocationRequest::new(RiskTolerance::Aggressive, dec!(1000)));
        assert!(matches!(result, Err(AdvisorError::NoData(_))));
    }

    #[test]
    fn test_amount_below_minimum_rejected() {
        let result = allocate(&pools(blue_chips(&[5.0])), &AllocationRequest::new(RiskTolerance::Aggressive, dec!(99.99)));
        assert!(matches!(result, Err(AdvisorError::InvalidRequest(_))));
    }

    #[test]
    fn test_expected_return_overflow_is_invalid_request() {
        let snapshot = pools(vec![RawPool::new("Ethereum", "moon-farm", "MEME", 5e7, 1e7)]);
        let request = AllocationRequest::new(RiskTolerance::Aggressive, dec!(10000000000000000000000));
        let result = allocate(&snapshot, &request);
        assert!(matches!(result, Err(AdvisorError::InvalidRequest(_))));
    }

    #[test]
    fn test_expected_return_two_decimals() {
        assert_eq!(expected_return(dec!(1000), 4.125).unwrap(), dec!(41.25));
        assert!(expected_return(Decimal::MAX, 200.0).is_err());
    }

    #[test]
    fn test_risk_adjusted_ranking_and_position_limit() {
        let raws: Vec<RawPool> = (0..12)
            .map(|i| RawPool::new("Ethereum", format!("p{i}"), "X", 5e7, 2.0 + f64::from(i)))
            .chain(std::iter::once(
                // scores 5 (high), so ranks on 0.4 * 60 = 24
                RawPool::new("Ethereum", "degen", "Y", 500_000.0, 60.0),
            ))
            .collect();

        let plan = allocate(&pools(raws), &AllocationRequest::new(RiskTolerance::Aggressive, dec!(1000))).unwrap();
        assert_eq!(plan.positions.len(), 10);
        assert_eq!(plan.positions[0].protocol, "degen");
        assert_eq!(plan.positions[0].risk_level, RiskLevel::High);
        assert_eq!(plan.total_percentage(), 100);
    }

    #[test]
    fn test_chain_and_stablecoin_filters() {
        let raws = vec![
            RawPool::new("Ethereum", "eth-stable", "USDC", 5e7, 5.0).with_stablecoin(true),
            RawPool::new("Ethereum", "eth-vol", "WETH", 5e7, 7.0),
            RawPool::new("Binance", "bsc-stable", "USDT", 5e7, 6.0).with_stablecoin(true),
        ];
        let mut request = AllocationRequest::new(RiskTolerance::Conservative, dec!(1000)).on_chains(&["bsc", "ethereum"]);
        request.stablecoin_only = true;

        let plan = allocate(&pools(raws), &request).unwrap();
        let names: Vec<&str> = plan.positions.iter().map(|p| p.protocol.as_str()).collect();
        assert_eq!(names, vec!["bsc-stable", "eth-stable"]);
    }

    #[test]
    fn test_request_defaults_from_json() {
        let request: AllocationRequest = serde_json::from_value(serde_json::json!({
            "amount": 5000,
            "riskTolerance": "moderate"
        }))
        .unwrap();
        assert_eq!(request.chains, vec!["ethereum"]);
        assert!(!request.stablecoin_only);
        assert_eq!(request.amount, dec!(5000));
    }
}
