//! # agent-payments
//!
//! Per-call metering for paid agent entrypoints.
//!
//! ## Prepaid Credit Flow
//!
//! ```text
//! ┌─────────────┐  signed top-up   ┌──────────────┐
//! │  Payment    │─────────────────▶│ TopUpHandler │──┐
//! │  processor  │  (HMAC-SHA256)   └──────────────┘  │ credit
//! └─────────────┘                                    ▼
//! ┌─────────────┐  x-credit-key    ┌──────────────┐  ┌──────────────┐
//! │   Client    │─────────────────▶│  PriceTable  │─▶│ CreditLedger │
//! │             │  invoke "find"   │  find: 0.25  │  │ charge(key)  │
//! └─────────────┘                  └──────────────┘  └──────────────┘
//! ```
//!
//! A charge checks that the account is active, under its daily request
//! limit, and holds at least the call's price, then debits it in one step.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_payments::{CreditLedger, MemoryCreditLedger, PriceTable};
//!
//! let ledger = MemoryCreditLedger::new(config.daily_limit);
//! let price = prices.price("find");
//! let receipt = ledger.charge(&key, price)?;
//! ```

mod config;
mod error;
mod ledger;
mod pricing;
mod webhook;

pub use config::{PaymentsConfig, DEFAULT_DAILY_LIMIT};
pub use error::{PaymentError, Result};
pub use ledger::{ChargeReceipt, CreditAccount, CreditKey, CreditLedger, CreditVerification, MemoryCreditLedger};
pub use pricing::PriceTable;
pub use webhook::{sign, TopUpEvent, TopUpHandler, TopUpOutcome, SIGNATURE_HEADER};
