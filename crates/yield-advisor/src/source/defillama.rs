//! DeFiLlama Yields Source
//!
//! Reads the public `/pools` endpoint of `yields.llama.fi`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::PoolSource;
use crate::error::{AdvisorError, Result};
use crate::model::RawPool;

pub const DEFAULT_BASE_URL: &str = "https://yields.llama.fi";

#[derive(Clone, Debug)]
pub struct DefiLlamaConfig {
    /// API root, without the `/pools` suffix
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DefiLlamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 30,
        }
    }
}

impl DefiLlamaConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("DEFILLAMA_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let timeout_secs = std::env::var("DEFILLAMA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Self {
            base_url,
            timeout_secs,
        }
    }
}

/// `{"status": "success", "data": [...]}`
#[derive(Deserialize)]
struct PoolsEnvelope {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

pub struct DefiLlamaSource {
    client: Client,
    config: DefiLlamaConfig,
}

impl DefiLlamaSource {
    pub fn new() -> Result<Self> {
        Self::from_config(DefiLlamaConfig::default())
    }

    pub fn from_config(config: DefiLlamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(DefiLlamaConfig::from_env())
    }

    fn pools_url(&self) -> String {
        format!("{}/pools", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PoolSource for DefiLlamaSource {
    async fn fetch_pools(&self) -> Result<Vec<RawPool>> {
        let url = self.pools_url();
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AdvisorError::Source(format!(
                "DeFiLlama API error: {}",
                response.status()
            )));
        }

        let envelope: PoolsEnvelope = response.json().await?;
        let total = envelope.data.len();

        // One bad record must not sink the batch
        let pools: Vec<RawPool> = envelope
            .data
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(pool) => Some(pool),
                Err(e) => {
                    debug!(error = %e, "Skipping unparseable pool record");
                    None
                }
            })
            .collect();

        if pools.len() < total {
            warn!(skipped = total - pools.len(), total, "DeFiLlama returned records that failed to parse");
        }
        debug!(count = pools.len(), url = %url, "Fetched pool snapshot");

        Ok(pools)
    }

    fn name(&self) -> &str {
        "DeFiLlama (yields.llama.fi)"
    }
}
