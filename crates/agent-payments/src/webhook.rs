//! Top-Up Webhook Handling
//!
//! A payment processor notifies us of purchased credit by POSTing a JSON
//! event signed with a shared secret:
//!
//! ```text
//! x-payment-signature: sha256=<hex HMAC-SHA256 of the raw body>
//!
//! {"creditKey": "AB12-CD34-EF56-7890", "amount": "10.00", "reference": "evt_123"}
//! ```
//!
//! Without `creditKey` a new account is opened and its key returned.

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{PaymentError, Result};
use crate::ledger::{CreditKey, CreditLedger};

pub const SIGNATURE_HEADER: &str = "x-payment-signature";

const SIGNATURE_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

/// Parsed top-up event
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpEvent {
    #[serde(default)]
    pub credit_key: Option<CreditKey>,
    pub amount: Decimal,

    /// Processor event ID; repeated deliveries are applied once
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpOutcome {
    pub credit_key: CreditKey,
    pub balance: Decimal,

    /// Whether this top-up opened the account
    pub created: bool,

    /// Whether the reference had already been applied
    pub duplicate: bool,
}

/// `sha256=<hex>` signature of a body
pub fn sign(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Config(e.to_string()))?;
    mac.update(body);
    Ok(format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes())))
}

/// Webhook handler
pub struct TopUpHandler<L: CreditLedger + ?Sized> {
    ledger: Arc<L>,
    secret: String,
    /// Applied references and the account each one funded
    processed: Mutex<HashMap<String, CreditKey>>,
}

impl<L: CreditLedger + ?Sized> TopUpHandler<L> {
    pub fn new(ledger: Arc<L>, secret: impl Into<String>) -> Self {
        Self {
            ledger,
            secret: secret.into(),
            processed: Mutex::new(HashMap::new()),
        }
    }

    fn lock_processed(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CreditKey>>> {
        self.processed
            .lock()
            .map_err(|_| PaymentError::Storage("webhook dedup lock poisoned".into()))
    }

    /// Record `reference` as funding `key`, or return the key it already funded
    fn claim(&self, reference: &str, key: &CreditKey) -> Result<Option<CreditKey>> {
        let mut processed = self.lock_processed()?;
        if let Some(original) = processed.get(reference) {
            return Ok(Some(original.clone()));
        }
        processed.insert(reference.to_string(), key.clone());
        Ok(None)
    }

    /// Verify the signature header against the raw body (constant time)
    pub fn verify(&self, body: &[u8], signature: &str) -> Result<()> {
        let hex_sig = signature
            .trim()
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or_else(|| PaymentError::WebhookSignature("missing sha256= prefix".into()))?;
        let expected = hex::decode(hex_sig).map_err(|e| PaymentError::WebhookSignature(e.to_string()))?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| PaymentError::Config(e.to_string()))?;
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| PaymentError::WebhookSignature("signature mismatch".into()))
    }

    /// Verify, parse and apply a top-up
    pub fn handle(&self, body: &[u8], signature: &str) -> Result<TopUpOutcome> {
        self.verify(body, signature)?;

        let event: TopUpEvent =
            serde_json::from_slice(body).map_err(|e| PaymentError::WebhookParse(e.to_string()))?;

        let (key, created) = match event.credit_key {
            Some(key) => {
                let created = self.ledger.get(&key)?.is_none();
                (key, created)
            }
            None => (CreditKey::generate(), true),
        };

        if let Some(reference) = &event.reference {
            if let Some(original) = self.claim(reference, &key)? {
                let balance = self.ledger.get(&original)?.map_or(Decimal::ZERO, |a| a.balance);
                tracing::debug!(reference = %reference, "Duplicate top-up ignored");
                return Ok(TopUpOutcome {
                    credit_key: original,
                    balance,
                    created: false,
                    duplicate: true,
                });
            }
        }

        let account = match self.ledger.credit(&key, event.amount) {
            Ok(account) => account,
            Err(e) => {
                if let Some(reference) = &event.reference {
                    self.lock_processed()?.remove(reference);
                }
                return Err(e);
            }
        };

        tracing::info!(
            credit_key = %key.masked(),
            amount = %event.amount,
            balance = %account.balance,
            created,
            "Applied credit top-up"
        );

        Ok(TopUpOutcome {
            credit_key: key,
            balance: account.balance,
            created,
            duplicate: false,
        })
    }
}
