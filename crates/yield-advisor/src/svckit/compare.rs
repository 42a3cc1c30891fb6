//! Compare Entrypoint
//!
//! Head-to-head protocol comparison.

use async_trait::async_trait;
use serde_json::json;

use agent_core::{
    Entrypoint, EntrypointCall, EntrypointManifest, EntrypointOutput, ParameterSchema, Result as CoreResult,
};

use super::{failure, merge_fields, YieldContext};
use crate::error::AdvisorError;
use crate::strategy::{Comparator, ComparisonRequest};

const KEY: &str = "compare";

const CLOSING_COMMENT: &str = "Comparing protocols is like comparing casinos. Some have better odds, but they're all designed to take your money. At least DeFi lets you see the code that's taking it.";

pub struct CompareEntrypoint {
    ctx: YieldContext,
}

impl CompareEntrypoint {
    pub fn new(ctx: YieldContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Entrypoint for CompareEntrypoint {
    fn manifest(&self) -> EntrypointManifest {
        EntrypointManifest {
            key: KEY.into(),
            description: "Compare yields across specific protocols. Head-to-head analysis with commentary.".into(),
            price: Some("0.15".into()),
            parameters: vec![
                ParameterSchema::required("protocols", "array", "2 to 10 protocol names (e.g. ['aave', 'compound'])"),
                ParameterSchema::optional("chain", "string", "Restrict every protocol to one chain"),
            ],
            category: Some("analysis".into()),
        }
    }

    async fn invoke(&self, call: &EntrypointCall) -> CoreResult<EntrypointOutput> {
        let request: ComparisonRequest = call.parse_input()?;
        request.validate()?;

        let pools = self.ctx.snapshot().await;
        match Comparator::new(&self.ctx.config.chains).compare(&pools, &request) {
            Ok(report) => {
                let output = merge_fields(
                    &report,
                    vec![("success", json!(true)), ("comment", json!(CLOSING_COMMENT))],
                )?;
                Ok(EntrypointOutput::success(KEY, output))
            }
            Err(AdvisorError::NoData(_)) => Ok(failure(
                KEY,
                "Failed to fetch yield data",
                Some("The oracle is offline. Even DeFi can't escape infrastructure dependencies."),
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
    async fn test_compare_ranks_protocols() {
        let out = CompareEntrypoint::new(context())
            .invoke(&EntrypointCall::new("compare", json!({"protocols": ["aave", "pancakeswap"]})))
            .await
            .unwrap();

        assert!(out.success);
        assert_eq!(out.output["winner"], "pancakeswap");
        assert_eq!(out.output["rankings"][0]["protocol"], "pancakeswap");
        assert_eq!(out.output["breakdown"][0]["protocol"], "aave");
        assert!(out.output["verdict"].as_str().unwrap().contains("landslide"));
        assert_eq!(out.output["comment"], CLOSING_COMMENT);
    }

    #[tokio::test]
    async fn test_single_protocol_rejected() {
        let result = CompareEntrypoint::new(context())
            .invoke(&EntrypointCall::new("compare", json!({"protocols": ["aave"]})))
            .await;
        assert!(matches!(result, Err(AgentError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_empty_snapshot() {
        let out = CompareEntrypoint::new(empty_context())
            .invoke(&EntrypointCall::new("compare", json!({"protocols": ["aave", "lido"]})))
            .await
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.output["error"], "Failed to fetch yield data");
    }
}
