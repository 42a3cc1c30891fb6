//! Payment Error Types

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Malformed credit key
    #[error("Invalid credit key: {0}")]
    InvalidKey(String),

    /// No account for this key
    #[error("Credit key not found: {0}")]
    KeyNotFound(String),

    /// Account exists but was deactivated
    #[error("Credit account inactive: {0}")]
    AccountInactive(String),

    #[error("Insufficient credit: balance {balance}, price {price}")]
    InsufficientCredit { balance: Decimal, price: Decimal },

    /// Daily request limit exceeded
    #[error("Daily limit of {0} requests exceeded")]
    RateLimited(u32),

    /// Top-up or price amount out of range
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentError::Storage(_))
    }

    /// Whether the caller must pay (or pay more) before retrying
    pub fn is_payment_required(&self) -> bool {
        matches!(
            self,
            PaymentError::InvalidKey(_)
                | PaymentError::KeyNotFound(_)
                | PaymentError::AccountInactive(_)
                | PaymentError::InsufficientCredit { .. }
        )
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::InvalidKey(_) | PaymentError::KeyNotFound(_) => "Credit key not found.",
            PaymentError::AccountInactive(_) => "This credit key is no longer active.",
            PaymentError::InsufficientCredit { .. } => "Insufficient credit. Top up to continue.",
            PaymentError::RateLimited(_) => "You've exceeded your daily usage limit.",
            PaymentError::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_required_classification() {
        let err = PaymentError::InsufficientCredit {
            balance: dec!(0.10),
            price: dec!(0.25),
        };
        assert!(err.is_payment_required());
        assert_eq!(err.to_string(), "Insufficient credit: balance 0.10, price 0.25");
        assert!(!PaymentError::RateLimited(10).is_payment_required());
    }
}
