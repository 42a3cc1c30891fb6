//! # yield-advisor
//!
//! DeFi yield discovery with risk scoring, protocol comparison and
//! risk-tolerance-driven capital allocation.
//!
//! ## Philosophy
//!
//! High APY is a risk signal, not a reward:
//!
//! - **Score before ranking** - Every pool gets an additive risk score first
//! - **Two ways to fail** - An empty snapshot and an over-strict filter are different answers
//! - **Deterministic math** - Only the flavor text is random
//! - **Percentages add up** - Allocations always sum to exactly 100
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  PoolSource (DeFiLlama / mock / cached)                     │
//! │        │  Vec<RawPool>                                      │
//! │        ▼                                                    │
//! │  assess: normalize → risk score → trend → comment           │
//! │        │  Vec<Pool>                                         │
//! │        ▼                                                    │
//! │  strategy                                                   │
//! │  ├─ filter      find: filter, rank, summarize               │
//! │  ├─ comparison  compare: per-protocol stats, verdict        │
//! │  ├─ allocation  optimize: select, cap 30%, reconcile to 100 │
//! │  └─ protocol    analyze-protocol: deep-dive statistics      │
//! │        │                                                    │
//! │        ▼                                                    │
//! │  svckit: priced agent_core::Entrypoint implementations      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example: Risk Score
//!
//! ```text
//! TVL $800K      → +3  Low TVL (<$1M)
//! APY 150%       → +3  Extremely high APY (>100%)
//! IL exposure    → +1  Impermanent loss exposure
//! 7d APY -25%    → +1  APY dropped >20% in 7 days
//!                  ──
//!                   8  → high
//! ```

pub mod assess;
pub mod config;
pub mod error;
pub mod model;
pub mod source;
pub mod strategy;
pub mod svckit;

pub use config::EngineConfig;
pub use error::{AdvisorError, Result};
pub use model::{Allocation, Pool, PoolSnapshot, RawPool, RiskAssessment, RiskLevel, RiskTolerance, Trend};
pub use strategy::{AllocationPlan, ComparisonReport, FindReport, ProtocolOverview};
pub use svckit::{YieldContext, YIELD_ANALYST_PROMPT};

/// Re-export entrypoints for easy registration
pub mod entrypoints {
    pub use crate::svckit::{AnalyzeProtocolEntrypoint, CompareEntrypoint, FindEntrypoint, OptimizeEntrypoint};
}
