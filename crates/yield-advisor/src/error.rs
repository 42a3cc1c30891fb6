//! Error Types for Yield Advisor
//!
//! Every failure the engine can report is a value of [`AdvisorError`].
//! `NoData` and `NoMatch` never overlap: the first means the
//! collaborator handed us nothing, the second means our rules filtered
//! everything out.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("No data available: {0}")]
    NoData(String),

    #[error("No match: {0}")]
    NoMatch(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Pool source error: {0}")]
    Source(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdvisorError {
    /// Short machine-readable code for response envelopes
    pub fn code(&self) -> &'static str {
        match self {
            AdvisorError::NoData(_) => "NO_DATA",
            AdvisorError::NoMatch(_) => "NO_MATCH",
            AdvisorError::InvalidRequest(_) => "INVALID_REQUEST",
            AdvisorError::Source(_) | AdvisorError::Network(_) => "SOURCE_ERROR",
            AdvisorError::Config(_) => "CONFIG_ERROR",
            AdvisorError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether retrying the same request later could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdvisorError::NoData(_) | AdvisorError::Source(_) | AdvisorError::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absence_and_no_match_are_distinct() {
        let absent = AdvisorError::NoData("empty snapshot".into());
        let none = AdvisorError::NoMatch("filters too strict".into());
        assert_ne!(absent.code(), none.code());
        assert!(absent.is_retryable());
        assert!(!none.is_retryable());
    }
}
