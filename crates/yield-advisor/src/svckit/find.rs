//! Find Entrypoint
//!
//! Filtered, ranked yields with summary statistics.

use async_trait::async_trait;
use serde_json::json;

use agent_core::{
    Entrypoint, EntrypointCall, EntrypointManifest, EntrypointOutput, ParameterSchema, Result as CoreResult,
};

use super::{failure, merge_fields, YieldContext};
use crate::error::AdvisorError;
use crate::strategy::{FilterCriteria, FindReport};

const KEY: &str = "find";

const DISCLAIMER: &str = "APYs are historical and not guaranteed. DeFi protocols can be exploited. Only invest what you can afford to lose. This is not financial advice - it's a search engine with opinions.";

pub struct FindEntrypoint {
    ctx: YieldContext,
}

impl FindEntrypoint {
    pub fn new(ctx: YieldContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Entrypoint for FindEntrypoint {
    fn manifest(&self) -> EntrypointManifest {
        let chains: Vec<&str> = self.ctx.config.chains.keys().chain(["all"]).collect();
        EntrypointManifest {
            key: KEY.into(),
            description: "Find the best DeFi yields across chains and protocols. Real data from DeFiLlama, real opinions included.".into(),
            price: Some("0.25".into()),
            parameters: vec![
                ParameterSchema::optional("chain", "string", "Chain to search, or 'all'")
                    .with_default(json!("all"))
                    .with_enum(&chains),
                ParameterSchema::optional("asset", "string", "Substring of the pool symbol (e.g. 'USDC')"),
                ParameterSchema::optional("minApy", "number", "Minimum APY in percent (>= 0)"),
                ParameterSchema::optional("maxApy", "number", "Maximum APY in percent"),
                ParameterSchema::optional("minTvl", "number", "Minimum TVL in USD"),
                ParameterSchema::optional("maxRisk", "string", "Highest acceptable risk level")
                    .with_enum(&["low", "medium", "high"]),
                ParameterSchema::optional("stablecoinOnly", "boolean", "Only stablecoin pools"),
                ParameterSchema::optional("limit", "number", "Number of results (1-50)").with_default(json!(20)),
            ],
            category: Some("discovery".into()),
        }
    }

    async fn invoke(&self, call: &EntrypointCall) -> CoreResult<EntrypointOutput> {
        let criteria: FilterCriteria = call.parse_input()?;
        criteria.validate()?;

        let pools = self.ctx.snapshot().await;
        match FindReport::build(pools, &criteria, &self.ctx.config.chains) {
            Ok(report) => {
                let output = merge_fields(
                    &report,
                    vec![
                        ("success", json!(true)),
                        ("dataSource", json!(self.ctx.source_name())),
                        ("disclaimer", json!(DISCLAIMER)),
                    ],
                )?;
                Ok(EntrypointOutput::success(KEY, output))
            }
            Err(AdvisorError::NoData(_)) => Ok(failure(
                KEY,
                "Failed to fetch yield data from DeFiLlama. Try again in a moment.",
                Some("DeFiLlama is taking a llama break. The APIs that power DeFi are themselves centralized services. Ironic, isn't it?"),
            )),
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
    async fn test_find_returns_ranked_yields() {
        let entrypoint = FindEntrypoint::new(context());
        let out = entrypoint
            .invoke(&EntrypointCall::new("find", json!({"chain": "ethereum", "limit": 3})))
            .await
            .unwrap();

        assert!(out.success);
        let yields = out.output["yields"].as_array().unwrap();
        assert_eq!(yields.len(), 3);
        assert!(yields.iter().all(|y| y["chain"] == "Ethereum"));
        assert!(yields[0]["apy"].as_f64() >= yields[1]["apy"].as_f64());
        assert_eq!(out.output["summary"]["totalFound"], 3);
        assert_eq!(out.output["dataSource"], "MockPools");
        assert_eq!(out.output["disclaimer"], DISCLAIMER);
    }

    #[tokio::test]
    async fn test_no_match_is_successful_empty_result() {
        let out = FindEntrypoint::new(context())
            .invoke(&EntrypointCall::new("find", json!({"minApy": 10000})))
            .await
            .unwrap();

        assert!(out.success);
        assert_eq!(out.output["summary"]["totalFound"], 0);
        assert!(out.output["overallComment"].as_str().unwrap().starts_with("No pools match"));
    }

    #[tokio::test]
    async fn test_empty_snapshot_reports_fetch_failure() {
        let out = FindEntrypoint::new(empty_context())
            .invoke(&EntrypointCall::new("find", json!({})))
            .await
            .unwrap();

        assert!(!out.success);
        assert!(out.output["error"].as_str().unwrap().starts_with("Failed to fetch yield data"));
    }

    #[tokio::test]
    async fn test_out_of_range_limit_is_invalid_input() {
        let result = FindEntrypoint::new(context())
            .invoke(&EntrypointCall::new("find", json!({"limit": 51})))
            .await;
        assert!(matches!(result, Err(AgentError::InvalidInput(_))));
    }
}
