//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM or search provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Entrypoint not found in registry
    #[error("Entrypoint not found: {0}")]
    EntrypointNotFound(String),

    /// Entrypoint input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Entrypoint execution failed
    #[error("Execution error: {0}")]
    Execution(String),

    /// Parse error (e.g., model output parsing)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::ProviderUnavailable(_) | AgentError::RateLimited(_) | AgentError::Io(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Provider(msg) => format!("An upstream service encountered an error: {msg}"),
            AgentError::ProviderUnavailable(_) => {
                "An upstream service is currently unavailable. Please try again.".into()
            }
            AgentError::EntrypointNotFound(key) => format!("The entrypoint '{key}' is not available."),
            AgentError::InvalidInput(msg) => format!("Invalid input: {msg}"),
            AgentError::Execution(msg) => format!("Request failed: {msg}"),
            AgentError::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AgentError::RateLimited("slow down".into()).is_retryable());
        assert!(AgentError::ProviderUnavailable("down".into()).is_retryable());
        assert!(!AgentError::InvalidInput("bad".into()).is_retryable());
    }

    #[test]
    fn test_user_message_names_entrypoint() {
        let err = AgentError::EntrypointNotFound("teleport".into());
        assert!(err.user_message().contains("teleport"));
    }
}
