//! Domain Models
//!
//! Core data types for yield pools, risk classification and allocations.
//! Capital amounts use `rust_decimal`; APY and TVL arrive as floats from
//! the data source and stay floats for scoring.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A pool record as published by the DeFiLlama `/pools` endpoint.
///
/// Every field is optional: the record is untrusted until the normalizer
/// has validated it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPool {
    pub chain: Option<String>,
    pub project: Option<String>,
    pub symbol: Option<String>,
    pub tvl_usd: Option<f64>,
    pub apy: Option<f64>,
    pub apy_base: Option<f64>,
    pub apy_reward: Option<f64>,
    pub reward_tokens: Option<Vec<String>>,

    /// DeFiLlama pool identifier
    pub pool: Option<String>,
    pub stablecoin: Option<bool>,

    /// "yes" when the pool is exposed to impermanent loss
    pub il_risk: Option<String>,

    /// "single", "multi", or something else
    pub exposure: Option<String>,

    #[serde(rename = "apyPct1D")]
    pub apy_pct_1d: Option<f64>,
    #[serde(rename = "apyPct7D")]
    pub apy_pct_7d: Option<f64>,
    #[serde(rename = "apyPct30D")]
    pub apy_pct_30d: Option<f64>,

    pub predictions: Option<Prediction>,
}

impl RawPool {
    pub fn new(
        chain: impl Into<String>,
        project: impl Into<String>,
        symbol: impl Into<String>,
        tvl_usd: f64,
        apy: f64,
    ) -> Self {
        Self {
            chain: Some(chain.into()),
            project: Some(project.into()),
            symbol: Some(symbol.into()),
            tvl_usd: Some(tvl_usd),
            apy: Some(apy),
            stablecoin: Some(false),
            il_risk: Some("no".into()),
            exposure: Some("single".into()),
            ..Default::default()
        }
    }

    pub fn with_base_and_reward(mut self, apy_base: f64, apy_reward: f64) -> Self {
        self.apy_base = Some(apy_base);
        self.apy_reward = Some(apy_reward);
        self
    }

    pub fn with_il_risk(mut self, il_risk: impl Into<String>) -> Self {
        self.il_risk = Some(il_risk.into());
        self
    }

    pub fn with_exposure(mut self, exposure: impl Into<String>) -> Self {
        self.exposure = Some(exposure.into());
        self
    }

    pub fn with_stablecoin(mut self, stablecoin: bool) -> Self {
        self.stablecoin = Some(stablecoin);
        self
    }

    pub fn with_change_7d(mut self, pct: f64) -> Self {
        self.apy_pct_7d = Some(pct);
        self
    }
}

/// DeFiLlama's own APY trend prediction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub predicted_class: Option<String>,
    pub predicted_probability: Option<f64>,
}

/// Categorical risk output of the scoring rubric. Ordered `Low < Medium < High`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 7-day APY trajectory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exposure {
    Single,
    Multi,
    Other,
}

impl Exposure {
    pub fn parse(s: &str) -> Self {
        match s {
            "single" => Exposure::Single,
            "multi" => Exposure::Multi,
            _ => Exposure::Other,
        }
    }
}

/// Caller-specified allocation aggressiveness
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTolerance::Conservative => "conservative",
            RiskTolerance::Moderate => "moderate",
            RiskTolerance::Aggressive => "aggressive",
        }
    }
}

/// Validated core of a pool record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub pool_id: Option<String>,
    pub chain: String,
    pub protocol: String,
    pub asset: String,
    pub tvl_usd: f64,

    /// Raw APY; `None` when the source omitted it
    pub apy: Option<f64>,
    pub apy_base: Option<f64>,
    pub apy_reward: Option<f64>,
    pub reward_tokens: Vec<String>,
    pub stablecoin: bool,
    pub il_risk: bool,
    pub exposure: Exposure,
    pub apy_pct_1d: Option<f64>,
    pub apy_pct_7d: Option<f64>,
    pub apy_pct_30d: Option<f64>,
    pub prediction: Option<Prediction>,
}

impl PoolSnapshot {
    /// APY only when it is meaningful yield (strictly positive)
    pub fn yield_apy(&self) -> Option<f64> {
        self.apy.filter(|apy| *apy > 0.0)
    }
}

/// Output of the risk rubric for one pool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub level: RiskLevel,

    /// Never empty
    pub factors: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendReading {
    pub label: Trend,

    /// Raw 7-day percent change, kept for display
    pub change: Option<f64>,
}

/// A normalized, annotated pool. Constructed once per request and never mutated.
#[derive(Clone, Debug, Serialize)]
#[serde(into = "PoolView")]
pub struct Pool {
    pub snapshot: PoolSnapshot,
    pub risk: RiskAssessment,
    pub trend: TrendReading,
    pub tvl_display: String,
    pub comment: String,
}

impl Pool {
    pub fn protocol(&self) -> &str {
        &self.snapshot.protocol
    }

    pub fn chain(&self) -> &str {
        &self.snapshot.chain
    }

    pub fn asset(&self) -> &str {
        &self.snapshot.asset
    }

    pub fn tvl_usd(&self) -> f64 {
        self.snapshot.tvl_usd
    }

    pub fn apy(&self) -> Option<f64> {
        self.snapshot.apy
    }

    /// APY used for ranking and arithmetic; absent counts as zero
    pub fn apy_or_zero(&self) -> f64 {
        self.snapshot.apy.unwrap_or(0.0)
    }

    pub fn has_yield(&self) -> bool {
        self.snapshot.yield_apy().is_some()
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk.level
    }
}

/// Wire shape of a [`Pool`]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    pub chain: String,
    pub protocol: String,
    pub asset: String,
    pub apy: f64,
    pub apy_base: Option<f64>,
    pub apy_reward: Option<f64>,
    pub tvl: String,
    pub tvl_raw: f64,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    pub stablecoin: bool,
    pub il_risk: bool,
    pub trend: Trend,
    pub trend_change: Option<f64>,
    pub comment: String,
}

impl From<Pool> for PoolView {
    fn from(pool: Pool) -> Self {
        let snapshot = pool.snapshot;
        Self {
            pool: snapshot.pool_id,
            chain: snapshot.chain,
            protocol: snapshot.protocol,
            asset: snapshot.asset,
            apy: round2(snapshot.apy.unwrap_or(0.0)),
            apy_base: snapshot.apy_base.filter(|v| *v != 0.0).map(round2),
            apy_reward: snapshot.apy_reward.filter(|v| *v != 0.0).map(round2),
            tvl: pool.tvl_display,
            tvl_raw: snapshot.tvl_usd,
            risk_level: pool.risk.level,
            risk_factors: pool.risk.factors,
            stablecoin: snapshot.stablecoin,
            il_risk: snapshot.il_risk,
            trend: pool.trend.label,
            trend_change: pool.trend.change,
            comment: pool.comment,
        }
    }
}

/// One position of an allocation plan
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub protocol: String,
    pub asset: String,
    pub chain: String,
    pub apy: f64,
    pub risk_level: RiskLevel,

    /// Final integer percentage; all positions of a plan sum to 100
    pub percentage: u32,

    /// Share before integer reconciliation, never above the position cap
    pub capped_percentage: f64,

    /// Dollar amount at the final percentage
    pub amount: Decimal,
    pub comment: String,
}

impl Allocation {
    pub fn new(pool: &Pool, capped_percentage: f64) -> Self {
        Self {
            protocol: pool.protocol().to_string(),
            asset: pool.asset().to_string(),
            chain: pool.chain().to_string(),
            apy: round2(pool.apy_or_zero()),
            risk_level: pool.risk_level(),
            percentage: 0,
            capped_percentage,
            amount: Decimal::ZERO,
            comment: pool.comment.clone(),
        }
    }

    /// Set the final percentage and derive the dollar amount from it
    pub fn with_percentage(mut self, percentage: u32, total_amount: Decimal) -> Self {
        self.percentage = percentage;
        self.amount = (Decimal::from(percentage) / Decimal::ONE_HUNDRED * total_amount)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        self
    }
}

/// Round to two decimal places for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a TVL figure as "$1.23B", "$4.56M", "$7.89K" or "$12.34"
pub fn format_tvl(tvl: f64) -> String {
    if tvl >= 1e9 {
        format!("${:.2}B", tvl / 1e9)
    } else if tvl >= 1e6 {
        format!("${:.2}M", tvl / 1e6)
    } else if tvl >= 1e3 {
        format!("${:.2}K", tvl / 1e3)
    } else {
        format!("${:.2}", tvl)
    }
}

/// Format a dollar amount with thousands separators, e.g. "$12,500.5"
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp(2).normalize();
    let text = rounded.abs().to_string();
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w.to_string(), Some(f.to_string())),
        None => (text, None),
    };

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    match frac {
        Some(f) => format!("{sign}${grouped}.{f}"),
        None => format!("{sign}${grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_tvl_thresholds() {
        assert_eq!(format_tvl(1_234_000_000.0), "$1.23B");
        assert_eq!(format_tvl(5_500_000.0), "$5.50M");
        assert_eq!(format_tvl(1_000.0), "$1.00K");
        assert_eq!(format_tvl(999.5), "$999.50");
    }

    #[test]
    fn test_format_usd_grouping() {
        assert_eq!(format_usd(dec!(1000)), "$1,000");
        assert_eq!(format_usd(dec!(1234567.5)), "$1,234,567.5");
        assert_eq!(format_usd(dec!(100)), "$100");
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn test_raw_pool_parses_defillama_shape() {
        let json = serde_json::json!({
            "chain": "Ethereum",
            "project": "aave-v3",
            "symbol": "USDC",
            "tvlUsd": 1.5e8,
            "apy": 4.21,
            "apyBase": 4.21,
            "apyReward": null,
            "stablecoin": true,
            "ilRisk": "no",
            "exposure": "single",
            "apyPct7D": -1.2
        });

        let raw: RawPool = serde_json::from_value(json).unwrap();
        assert_eq!(raw.project.as_deref(), Some("aave-v3"));
        assert_eq!(raw.apy_pct_7d, Some(-1.2));
        assert!(raw.apy_reward.is_none());
        assert!(raw.apy_pct_30d.is_none());
    }

    #[test]
    fn test_allocation_amount_rounds_half_up() {
        let pool = Pool {
            snapshot: PoolSnapshot {
                pool_id: None,
                chain: "Ethereum".into(),
                protocol: "aave-v3".into(),
                asset: "USDC".into(),
                tvl_usd: 1e8,
                apy: Some(5.0),
                apy_base: None,
                apy_reward: None,
                reward_tokens: Vec::new(),
                stablecoin: true,
                il_risk: false,
                exposure: Exposure::Single,
                apy_pct_1d: None,
                apy_pct_7d: None,
                apy_pct_30d: None,
                prediction: None,
            },
            risk: RiskAssessment {
                score: 0,
                level: RiskLevel::Low,
                factors: vec!["No major risk factors identified".into()],
            },
            trend: TrendReading { label: Trend::Stable, change: None },
            tvl_display: format_tvl(1e8),
            comment: String::new(),
        };

        let alloc = Allocation::new(&pool, 25.0).with_percentage(25, dec!(1002));
        assert_eq!(alloc.amount, dec!(251)); // 250.5 rounds up
    }
}
