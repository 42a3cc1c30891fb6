//! Service Kit - Agent Entrypoints
//!
//! Paid entrypoints that implement `agent_core::Entrypoint` for the yield
//! finder. Each one fetches the snapshot through [`YieldContext`], runs the
//! engine and shapes the JSON response.

mod analyze;
mod compare;
mod find;
mod optimize;

pub use analyze::{AnalyzeProtocolEntrypoint, YIELD_ANALYST_PROMPT};
pub use compare::CompareEntrypoint;
pub use find::FindEntrypoint;
pub use optimize::OptimizeEntrypoint;

use std::sync::Arc;

use agent_core::{AgentError, EntrypointOutput};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::assess::{normalize_snapshot, CommentPicker, RandomPicker};
use crate::config::EngineConfig;
use crate::error::AdvisorError;
use crate::model::Pool;
use crate::source::PoolSource;

/// Shared dependencies for every entrypoint
#[derive(Clone)]
pub struct YieldContext {
    pub source: Arc<dyn PoolSource>,
    pub config: Arc<EngineConfig>,
    pub picker: Arc<dyn CommentPicker>,
}

impl YieldContext {
    /// Default engine configuration with random commentary
    pub fn new(source: Arc<dyn PoolSource>) -> Self {
        Self {
            source,
            config: Arc::new(EngineConfig::default()),
            picker: Arc::new(RandomPicker),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn with_picker(mut self, picker: Arc<dyn CommentPicker>) -> Self {
        self.picker = picker;
        self
    }

    /// Fetch and normalize the current snapshot.
    ///
    /// A failing source yields an empty snapshot, which the engine then
    /// reports as absent data.
    pub async fn snapshot(&self) -> Vec<Pool> {
        match self.source.fetch_pools().await {
            Ok(raws) => normalize_snapshot(&raws, &self.config, self.picker.as_ref()),
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Failed to fetch pool snapshot");
                Vec::new()
            }
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}

impl From<AdvisorError> for AgentError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::InvalidRequest(msg) => AgentError::InvalidInput(msg),
            AdvisorError::Network(e) => AgentError::ProviderUnavailable(e.to_string()),
            AdvisorError::Source(msg) => AgentError::ProviderUnavailable(msg),
            AdvisorError::Config(msg) => AgentError::Config(msg),
            AdvisorError::Serialization(e) => AgentError::Json(e),
            other @ (AdvisorError::NoData(_) | AdvisorError::NoMatch(_)) => {
                AgentError::Execution(other.to_string())
            }
        }
    }
}

/// Serialize a report and add envelope fields next to its own
pub(crate) fn merge_fields<T: Serialize>(report: &T, extra: Vec<(&str, Value)>) -> Result<Value, AgentError> {
    let mut value = serde_json::to_value(report)?;
    if let Value::Object(map) = &mut value {
        for (key, field) in extra {
            map.insert(key.to_string(), field);
        }
    }
    Ok(value)
}

/// `success: false` output carrying an error and a closing comment
pub(crate) fn failure(key: &str, error: &str, comment: Option<&str>) -> EntrypointOutput {
    let mut output = json!({ "success": false, "error": error });
    if let (Some(comment), Value::Object(map)) = (comment, &mut output) {
        map.insert("comment".into(), json!(comment));
    }
    EntrypointOutput::failure(key, output)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_shape() {
        let out = failure("find", "Failed", Some("Try later"));
        assert!(!out.success);
        assert_eq!(out.output["success"], false);
        assert_eq!(out.output["error"], "Failed");
        assert_eq!(out.output["comment"], "Try later");
    }

    #[test]
    fn test_invalid_request_maps_to_invalid_input() {
        let err: AgentError = AdvisorError::InvalidRequest("limit".into()).into();
        assert!(matches!(err, AgentError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_snapshot_normalizes_mock_pools() {
        let pools = testing::context().snapshot().await;
        assert!(!pools.is_empty());
        assert!(pools.iter().all(|p| !p.risk.factors.is_empty()));
    }
}
