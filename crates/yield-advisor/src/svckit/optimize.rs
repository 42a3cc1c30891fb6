//! Optimize Entrypoint
//!
//! Risk-tolerance-driven allocation of a capital amount across pools.

use async_trait::async_trait;
use serde_json::json;

use agent_core::{
    Entrypoint, EntrypointCall, EntrypointManifest, EntrypointOutput, ParameterSchema, Result as CoreResult,
};

use super::{failure, merge_fields, YieldContext};
use crate::error::AdvisorError;
use crate::model::format_usd;
use crate::strategy::{AllocationPlan, AllocationRequest, Allocator};

const KEY: &str = "optimize";

const CLOSING_COMMENT: &str = "I've given you a spreadsheet, not a crystal ball. The market will do what it does regardless of what any algorithm suggests. Stay humble, stay solvent.";

const NO_MATCH_COMMENT: &str = "Your filters are too restrictive, or the chains you selected don't have qualifying yields. Try broader criteria.";

pub struct OptimizeEntrypoint {
    ctx: YieldContext,
}

impl OptimizeEntrypoint {
    pub fn new(ctx: YieldContext) -> Self {
        Self { ctx }
    }
}

/// Display strings for the plan header
fn summary(plan: &AllocationPlan) -> serde_json::Value {
    json!({
        "totalAmount": format_usd(plan.total_amount),
        "positions": plan.positions.len(),
        "weightedApy": format!("{:.2}%", plan.weighted_apy),
        "expectedYearlyReturn": format!("${:.2}", plan.expected_yearly_return),
        "riskProfile": plan.risk_profile,
    })
}

#[async_trait]
impl Entrypoint for OptimizeEntrypoint {
    fn manifest(&self) -> EntrypointManifest {
        EntrypointManifest {
            key: KEY.into(),
            description: "Get yield allocation suggestions based on your risk tolerance. Not financial advice, obviously.".into(),
            price: Some("0.50".into()),
            parameters: vec![
                ParameterSchema::required("amount", "number", "Capital to allocate in USD (>= 100)"),
                ParameterSchema::required("riskTolerance", "string", "How much risk to accept")
                    .with_enum(&["conservative", "moderate", "aggressive"]),
                ParameterSchema::optional("chains", "array", "Chain keys to draw pools from")
                    .with_default(json!(["ethereum"])),
                ParameterSchema::optional("stablecoinOnly", "boolean", "Only stablecoin pools"),
            ],
            category: Some("planning".into()),
        }
    }

    async fn invoke(&self, call: &EntrypointCall) -> CoreResult<EntrypointOutput> {
        let request: AllocationRequest = call.parse_input()?;
        request.validate()?;

        let pools = self.ctx.snapshot().await;
        let config = &self.ctx.config;
        match Allocator::new(&config.allocation, &config.chains).allocate(&pools, &request) {
            Ok(plan) => {
                let output = merge_fields(
                    &plan,
                    vec![
                        ("success", json!(true)),
                        ("summary", summary(&plan)),
                        ("comment", json!(CLOSING_COMMENT)),
                    ],
                )?;
                Ok(EntrypointOutput::success(KEY, output))
            }
            Err(AdvisorError::NoData(_)) => Ok(failure(KEY, "Failed to fetch yield data", None)),
            Err(AdvisorError::NoMatch(msg)) => Ok(failure(KEY, &msg, Some(NO_MATCH_COMMENT))),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svckit::testing::{context, empty_context};
    use agent_core::AgentError;

    #[tokio::test]
    async fn test_optimize_allocates_to_hundred_percent() {
        let out = OptimizeEntrypoint::new(context())
            .invoke(&EntrypointCall::new(
                "optimize",
                json!({"amount": 10000, "riskTolerance": "moderate", "chains": ["ethereum", "base"]}),
            ))
            .await
            .unwrap();

        assert!(out.success);
        let positions = out.output["positions"].as_array().unwrap();
        let total: u64 = positions.iter().map(|p| p["percentage"].as_u64().unwrap()).sum();
        assert_eq!(total, 100);
        assert_eq!(out.output["summary"]["totalAmount"], "$10,000");
        assert_eq!(out.output["warnings"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_no_eligible_pools() {
        let out = OptimizeEntrypoint::new(context())
            .invoke(&EntrypointCall::new(
                "optimize",
                json!({"amount": 1000, "riskTolerance": "conservative", "chains": ["avalanche"]}),
            ))
            .await
            .unwrap();

        assert!(!out.success);
        assert_eq!(out.output["error"], "No suitable pools found for your criteria");
        assert_eq!(out.output["comment"], NO_MATCH_COMMENT);
    }

    #[tokio::test]
    async fn test_empty_snapshot() {
        let out = OptimizeEntrypoint::new(empty_context())
            .invoke(&EntrypointCall::new("optimize", json!({"amount": 1000, "riskTolerance": "aggressive"})))
            .await
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.output["error"], "Failed to fetch yield data");
    }

    #[tokio::test]
    async fn test_small_amount_rejected() {
        let result = OptimizeEntrypoint::new(context())
            .invoke(&EntrypointCall::new("optimize", json!({"amount": 50, "riskTolerance": "aggressive"})))
            .await;
        assert!(matches!(result, Err(AgentError::InvalidInput(_))));
    }
}
