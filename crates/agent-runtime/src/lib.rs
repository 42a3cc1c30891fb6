//! # agent-runtime
//!
//! Runtime providers for agent services.
//!
//! ## Providers
//!
//! - **OpenRouter** (default): hosted chat completions
//! - **Brave** (default): web search for research entrypoints
//!
//! Both read their API key from the environment and are simply absent when
//! it is not set.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenRouterProvider;
//!
//! if let Some(provider) = OpenRouterProvider::from_env() {
//!     let provider = Arc::new(provider?);
//!     entrypoint = entrypoint.with_llm(provider);
//! }
//! ```

#[cfg(feature = "openrouter")]
pub mod openrouter;

#[cfg(feature = "openrouter")]
pub use openrouter::{OpenRouterConfig, OpenRouterProvider};

#[cfg(feature = "brave")]
pub mod brave;

#[cfg(feature = "brave")]
pub use brave::{BraveConfig, BraveSearch};

// Re-export core types for convenience
pub use agent_core::{AgentError, LlmProvider, Message, Result, Role, SearchHit, SearchProvider};
