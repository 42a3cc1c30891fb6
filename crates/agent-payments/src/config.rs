//! Payments Configuration

use crate::error::{PaymentError, Result};

pub const DEFAULT_DAILY_LIMIT: u32 = 1000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentsConfig {
    /// Charge priced entrypoints against credit keys
    pub enabled: bool,

    /// HMAC secret for top-up webhooks; top-ups are refused without one
    pub webhook_secret: Option<String>,

    /// Paid requests per key per UTC day
    pub daily_limit: u32,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_secret: None,
            daily_limit: DEFAULT_DAILY_LIMIT,
        }
    }
}

impl PaymentsConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let enabled = match lookup("PAYMENTS_ENABLED") {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| PaymentError::Config(format!("PAYMENTS_ENABLED: not a boolean: {v}")))?,
            None => false,
        };

        let daily_limit = match lookup("PAYMENTS_DAILY_LIMIT") {
            Some(v) => v
                .parse()
                .map_err(|_| PaymentError::Config(format!("PAYMENTS_DAILY_LIMIT: not a number: {v}")))?,
            None => DEFAULT_DAILY_LIMIT,
        };

        let webhook_secret = lookup("PAYMENTS_WEBHOOK_SECRET").filter(|s| !s.is_empty());
        if enabled && webhook_secret.is_none() {
            tracing::warn!("Payments enabled without PAYMENTS_WEBHOOK_SECRET; top-ups will be refused");
        }

        Ok(Self {
            enabled,
            webhook_secret,
            daily_limit,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<PaymentsConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        PaymentsConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config(&[]).unwrap(), PaymentsConfig::default());
    }

    #[test]
    fn test_parses_values() {
        let cfg = config(&[
            ("PAYMENTS_ENABLED", "true"),
            ("PAYMENTS_WEBHOOK_SECRET", "whsec"),
            ("PAYMENTS_DAILY_LIMIT", "25"),
        ])
        .unwrap();
        assert!(cfg.enabled);
        assert_eq!(cfg.webhook_secret.as_deref(), Some("whsec"));
        assert_eq!(cfg.daily_limit, 25);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(config(&[("PAYMENTS_ENABLED", "maybe")]).is_err());
        assert!(config(&[("PAYMENTS_DAILY_LIMIT", "lots")]).is_err());
    }
}
