//! Credit Ledger
//!
//! Prepaid credit accounts keyed by a credit key. Paid entrypoint calls are
//! charged against the balance; top-ups add to it.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{PaymentError, Result};

/// Credit key (formatted: XXXX-XXXX-XXXX-XXXX)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CreditKey(String);

impl CreditKey {
    /// Generate a new random key
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
        Self(format!("{}-{}-{}-{}", &hex[0..4], &hex[4..8], &hex[8..12], &hex[12..16]))
    }

    /// Parse, case-insensitively, from the dashed form
    pub fn parse(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        let groups: Vec<&str> = upper.split('-').collect();
        let well_formed = groups.len() == 4
            && groups
                .iter()
                .all(|g| g.len() == 4 && g.chars().all(|c| c.is_ascii_alphanumeric()));
        if !well_formed {
            return Err(PaymentError::InvalidKey(s.to_string()));
        }
        Ok(Self(upper))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Form safe for logs: only the last group is visible
    pub fn masked(&self) -> String {
        let tail = self.0.rsplit('-').next().unwrap_or_default();
        format!("****-****-****-{tail}")
    }
}

impl std::fmt::Display for CreditKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CreditKey {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CreditKey> for String {
    fn from(key: CreditKey) -> Self {
        key.0
    }
}

/// A prepaid credit account
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditAccount {
    pub key: CreditKey,

    /// Remaining credit in USD
    pub balance: Decimal,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,

    /// Paid requests on `usage_date`
    pub requests_today: u32,
    pub usage_date: Option<NaiveDate>,
}

impl CreditAccount {
    pub fn new(key: CreditKey) -> Self {
        Self {
            key,
            balance: Decimal::ZERO,
            active: true,
            created_at: Utc::now(),
            last_used: None,
            requests_today: 0,
            usage_date: None,
        }
    }

    /// Requests counted today, zero after the date rolls over
    pub fn requests_on(&self, today: NaiveDate) -> u32 {
        if self.usage_date == Some(today) {
            self.requests_today
        } else {
            0
        }
    }

    /// Check activity, daily limit and balance, then debit and count the request
    pub fn charge(&mut self, price: Decimal, daily_limit: u32, now: DateTime<Utc>) -> Result<ChargeReceipt> {
        if !self.active {
            return Err(PaymentError::AccountInactive(self.key.to_string()));
        }

        let today = now.date_naive();
        let used = self.requests_on(today);
        if used >= daily_limit {
            return Err(PaymentError::RateLimited(daily_limit));
        }
        if self.balance < price {
            return Err(PaymentError::InsufficientCredit {
                balance: self.balance,
                price,
            });
        }

        self.balance -= price;
        self.requests_today = used + 1;
        self.usage_date = Some(today);
        self.last_used = Some(now);

        Ok(ChargeReceipt {
            charged: price,
            balance: self.balance,
            remaining_requests: daily_limit - self.requests_today,
        })
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

/// Outcome of a successful charge
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeReceipt {
    pub charged: Decimal,
    pub balance: Decimal,
    pub remaining_requests: u32,
}

/// Credit key verification result
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditVerification {
    pub valid: bool,
    pub balance: Option<Decimal>,
    pub remaining_requests: Option<u32>,
    pub message: Option<String>,
}

impl CreditVerification {
    pub fn valid(balance: Decimal, remaining: u32) -> Self {
        Self {
            valid: true,
            balance: Some(balance),
            remaining_requests: Some(remaining),
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            balance: None,
            remaining_requests: None,
            message: Some(message.into()),
        }
    }
}

/// Credit storage trait
pub trait CreditLedger: Send + Sync {
    /// Get account by key
    fn get(&self, key: &CreditKey) -> Result<Option<CreditAccount>>;

    /// Save or replace an account
    fn save(&self, account: &CreditAccount) -> Result<()>;

    /// Add credit, opening the account on first top-up
    fn credit(&self, key: &CreditKey, amount: Decimal) -> Result<CreditAccount>;

    /// Charge one paid call (atomic check + debit)
    fn charge(&self, key: &CreditKey, price: Decimal) -> Result<ChargeReceipt>;

    /// Read-only status for a key
    fn verify(&self, key: &CreditKey) -> Result<CreditVerification>;
}

/// In-memory credit ledger (for development and single-instance deployments)
pub struct MemoryCreditLedger {
    accounts: RwLock<HashMap<CreditKey, CreditAccount>>,
    daily_limit: u32,
}

impl MemoryCreditLedger {
    pub fn new(daily_limit: u32) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            daily_limit,
        }
    }

    fn poisoned<T>(_: T) -> PaymentError {
        PaymentError::Storage("credit ledger lock poisoned".into())
    }
}

impl CreditLedger for MemoryCreditLedger {
    fn get(&self, key: &CreditKey) -> Result<Option<CreditAccount>> {
        let accounts = self.accounts.read().map_err(Self::poisoned)?;
        Ok(accounts.get(key).cloned())
    }

    fn save(&self, account: &CreditAccount) -> Result<()> {
        let mut accounts = self.accounts.write().map_err(Self::poisoned)?;
        accounts.insert(account.key.clone(), account.clone());
        Ok(())
    }

    fn credit(&self, key: &CreditKey, amount: Decimal) -> Result<CreditAccount> {
        if amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidAmount(format!("top-up must be positive, got {amount}")));
        }

        let mut accounts = self.accounts.write().map_err(Self::poisoned)?;
        let account = accounts
            .entry(key.clone())
            .or_insert_with(|| CreditAccount::new(key.clone()));
        account.balance += amount;
        Ok(account.clone())
    }

    fn charge(&self, key: &CreditKey, price: Decimal) -> Result<ChargeReceipt> {
        let mut accounts = self.accounts.write().map_err(Self::poisoned)?;
        let account = accounts
            .get_mut(key)
            .ok_or_else(|| PaymentError::KeyNotFound(key.to_string()))?;
        account.charge(price, self.daily_limit, Utc::now())
    }

    fn verify(&self, key: &CreditKey) -> Result<CreditVerification> {
        let accounts = self.accounts.read().map_err(Self::poisoned)?;
        let Some(account) = accounts.get(key) else {
            return Ok(CreditVerification::invalid("Credit key not found"));
        };
        if !account.active {
            return Ok(CreditVerification::invalid("Credit key is not active"));
        }

        let used = account.requests_on(Utc::now().date_naive());
        Ok(CreditVerification::valid(
            account.balance,
            self.daily_limit.saturating_sub(used),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_credit_key_generation() {
        let key = CreditKey::generate();
        assert_eq!(key.as_str().len(), 19); // XXXX-XXXX-XXXX-XXXX
        assert_eq!(key.as_str().matches('-').count(), 3);
        assert_eq!(CreditKey::parse(key.as_str()).unwrap(), key);
    }

    #[test]
    fn test_masked_key_hides_all_but_last_group() {
        let key = CreditKey::parse("ab12-cd34-ef56-7890").unwrap();
        assert_eq!(key.masked(), "****-****-****-7890");
    }

    #[test]
    fn test_credit_key_parse() {
        assert_eq!(CreditKey::parse("ab12-cd34-ef56-7890").unwrap().as_str(), "AB12-CD34-EF56-7890");
        assert!(CreditKey::parse("AB12-CD34-EF56").is_err());
        assert!(CreditKey::parse("AB12-CD34-EF56-78!0").is_err());
        assert!(serde_json::from_str::<CreditKey>("\"nope\"").is_err());
    }

    #[test]
    fn test_charge_debits_and_counts() {
        let mut account = CreditAccount::new(CreditKey::generate());
        account.balance = dec!(1.00);
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let receipt = account.charge(dec!(0.25), 10, now).unwrap();
        assert_eq!(receipt.balance, dec!(0.75));
        assert_eq!(receipt.remaining_requests, 9);

        let err = account.charge(dec!(0.80), 10, now).unwrap_err();
        assert!(matches!(err, PaymentError::InsufficientCredit { .. }));
        assert_eq!(account.balance, dec!(0.75));
    }

    #[test]
    fn test_daily_limit_resets_next_day() {
        let mut account = CreditAccount::new(CreditKey::generate());
        account.balance = dec!(10);
        let day1 = Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2026, 3, 2, 0, 30, 0).unwrap();

        for _ in 0..3 {
            account.charge(dec!(0.10), 3, day1).unwrap();
        }
        assert!(matches!(account.charge(dec!(0.10), 3, day1), Err(PaymentError::RateLimited(3))));
        assert!(account.charge(dec!(0.10), 3, day2).is_ok());
        assert_eq!(account.requests_today, 1);
    }

    #[test]
    fn test_inactive_account_rejected() {
        let mut account = CreditAccount::new(CreditKey::generate());
        account.balance = dec!(5);
        account.deactivate();
        assert!(matches!(
            account.charge(dec!(0.10), 10, Utc::now()),
            Err(PaymentError::AccountInactive(_))
        ));
    }

    #[test]
    fn test_memory_ledger_flow() {
        let ledger = MemoryCreditLedger::new(100);
        let key = CreditKey::generate();

        assert!(matches!(ledger.charge(&key, dec!(0.25)), Err(PaymentError::KeyNotFound(_))));
        assert!(!ledger.verify(&key).unwrap().valid);

        ledger.credit(&key, dec!(1.00)).unwrap();
        let account = ledger.credit(&key, dec!(0.50)).unwrap();
        assert_eq!(account.balance, dec!(1.50));

        let receipt = ledger.charge(&key, dec!(0.75)).unwrap();
        assert_eq!(receipt.balance, dec!(0.75));

        let status = ledger.verify(&key).unwrap();
        assert!(status.valid);
        assert_eq!(status.balance, Some(dec!(0.75)));
        assert_eq!(status.remaining_requests, Some(99));
    }

    #[test]
    fn test_non_positive_top_up_rejected() {
        let ledger = MemoryCreditLedger::new(100);
        assert!(ledger.credit(&CreditKey::generate(), Decimal::ZERO).is_err());
    }
}
