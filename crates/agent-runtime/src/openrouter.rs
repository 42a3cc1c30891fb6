//! OpenRouter LLM Provider
//!
//! Implementation of `LlmProvider` for the OpenRouter chat-completions API.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{Completion, GenerationOptions, LlmProvider, TokenUsage, DEFAULT_MODEL},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

const REFERER: &str = "https://unabotter.xyz";
const TITLE: &str = "Ted Yield Finder";

/// OpenRouter provider configuration
#[derive(Clone, Debug)]
pub struct OpenRouterConfig {
    pub api_key: String,

    /// API root, without the trailing `/chat/completions`
    pub base_url: String,

    /// Model used when the caller's options name none
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenRouterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            timeout_secs: 60,
        }
    }

    /// `None` when `OPENROUTER_API_KEY` is unset or empty
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY").ok().filter(|k| !k.is_empty())?;
        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var("OPENROUTER_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("OPENROUTER_MODEL") {
            config.model = model;
        }
        Some(config)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// OpenRouter LLM provider
pub struct OpenRouterProvider {
    client: reqwest::Client,
    config: OpenRouterConfig,
}

impl OpenRouterProvider {
    /// Create from configuration
    pub fn from_config(config: OpenRouterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables; `None` without an API key
    pub fn from_env() -> Option<Result<Self>> {
        OpenRouterConfig::from_env().map(Self::from_config)
    }

    fn model<'a>(&'a self, options: &'a GenerationOptions) -> &'a str {
        if options.model.is_empty() {
            &self.config.model
        } else {
            &options.model
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.base_url);
        match self.authorized(self.client.get(&url)).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!(error = %e, "OpenRouter health check failed");
                Ok(false)
            }
        }
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let model = self.model(options);
        let body = ChatRequest {
            model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        tracing::debug!(model, messages = messages.len(), "Requesting completion");

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AgentError::RateLimited("OpenRouter".into()));
        }
        if !status.is_success() {
            return Err(AgentError::Provider(format!("OpenRouter returned {status}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AgentError::Parse("completion has no choices".into()))?;

        Ok(Completion {
            content,
            model: parsed.model.unwrap_or_else(|| model.to_string()),
            usage: parsed.usage,
        })
    }

    fn name(&self) -> &str {
        "OpenRouter"
    }
}
