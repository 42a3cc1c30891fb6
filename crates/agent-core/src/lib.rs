//! # agent-core
//!
//! Core abstractions for paid agent services: priced entrypoints, a
//! provider-agnostic LLM interface and a web-search interface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Agent Service                          │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ Entrypoint  │  │ LlmProvider │  │   SearchProvider    │  │
//! │  │  Registry   │──│ (Strategy)  │──│     (Strategy)      │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The provider traits let an entrypoint swap OpenRouter, a local model or a
//! test double without changing its logic.

pub mod entrypoint;
pub mod error;
pub mod message;
pub mod provider;
pub mod search;

pub use entrypoint::{
    Entrypoint, EntrypointCall, EntrypointManifest, EntrypointOutput, EntrypointRegistry, ParameterSchema,
};
pub use error::{AgentError, Result};
pub use message::{Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider, TokenUsage};
pub use search::{SearchHit, SearchProvider};
