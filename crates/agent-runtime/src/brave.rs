//! Brave Web Search
//!
//! Implementation of `SearchProvider` for the Brave Search API.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    search::{SearchHit, SearchProvider},
};
use async_trait::async_trait;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.search.brave.com";

#[derive(Clone, Debug)]
pub struct BraveConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl BraveConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 15,
        }
    }

    /// `None` when `BRAVE_API_KEY` is unset or empty
    pub fn from_env() -> Option<Self> {
        std::env::var("BRAVE_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    web: Option<WebResults>,
}

#[derive(Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<SearchHit>,
}

pub struct BraveSearch {
    client: reqwest::Client,
    config: BraveConfig,
}

impl BraveSearch {
    pub fn from_config(config: BraveConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Option<Result<Self>> {
        BraveConfig::from_env().map(Self::from_config)
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    async fn search(&self, query: &str, count: u8) -> Result<Vec<SearchHit>> {
        let url = format!("{}/res/v1/web/search", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query.to_string()), ("count", count.to_string())])
            .header("X-Subscription-Token", &self.config.api_key)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AgentError::Provider(format!("Brave returned {}", response.status())));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;
        let hits = parsed.web.map(|web| web.results).unwrap_or_default();

        tracing::debug!(query, hits = hits.len(), "Brave search complete");
        Ok(hits.into_iter().take(usize::from(count)).collect())
    }

    fn name(&self) -> &str {
        "Brave Search"
    }
}
