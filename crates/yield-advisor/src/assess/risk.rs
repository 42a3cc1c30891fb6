//! Risk Assessor
//!
//! Additive integer rubric over TVL, APY, impermanent loss, exposure,
//! reward-token dependency and APY trend. The rubric is a heuristic: the
//! weights live in [`RiskRubric`] and are applied exactly as configured.

use crate::config::{RiskRubric, ScoreTier};
use crate::model::{Exposure, PoolSnapshot, RiskAssessment};

/// Scores pools against a rubric
pub struct RiskAssessor<'a> {
    rubric: &'a RiskRubric,
}

impl<'a> RiskAssessor<'a> {
    pub fn new(rubric: &'a RiskRubric) -> Self {
        Self { rubric }
    }

    /// Score one pool. Pure: identical input gives identical output.
    pub fn assess(&self, pool: &PoolSnapshot) -> RiskAssessment {
        let mut score = 0;
        let mut factors = Vec::new();
        let mut apply = |points: u32, factor: &str| {
            score += points;
            factors.push(factor.to_string());
        };

        if let Some(tier) = first_tier(&self.rubric.tvl_tiers, |t| pool.tvl_usd < t) {
            apply(tier.points, &tier.factor);
        }

        // Absent APY scores as zero
        let apy = pool.apy.unwrap_or(0.0);
        if let Some(tier) = first_tier(&self.rubric.apy_tiers, |t| apy > t) {
            apply(tier.points, &tier.factor);
        }

        if pool.il_risk {
            let flag = &self.rubric.impermanent_loss;
            apply(flag.points, &flag.factor);
        }

        if pool.exposure == Exposure::Multi {
            let flag = &self.rubric.multi_exposure;
            apply(flag.points, &flag.factor);
        }

        if let Some(ratio) = reward_ratio(pool) {
            if let Some(tier) = first_tier(&self.rubric.reward_tiers, |t| ratio > t) {
                apply(tier.points, &tier.factor);
            }
        }

        let drop = &self.rubric.trend_drop;
        if pool.apy_pct_7d.is_some_and(|change| change < drop.threshold) {
            apply(drop.points, &drop.factor);
        }

        if factors.is_empty() {
            factors.push(self.rubric.no_factors.clone());
        }

        RiskAssessment {
            score,
            level: self.rubric.level_for(score),
            factors,
        }
    }
}

fn first_tier(tiers: &[ScoreTier], crossed: impl Fn(f64) -> bool) -> Option<&ScoreTier> {
    tiers.iter().find(|tier| crossed(tier.threshold))
}

/// Share of yield paid in reward tokens; only defined when both parts are positive
fn reward_ratio(pool: &PoolSnapshot) -> Option<f64> {
    let base = pool.apy_base.filter(|v| *v > 0.0)?;
    let reward = pool.apy_reward.filter(|v| *v > 0.0)?;
    Some(reward / (base + reward))
}
