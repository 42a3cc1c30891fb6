//! Yield Strategies
//!
//! Ranking, allocation and comparison over annotated pools. Every function
//! here is synchronous and pure; pool data arrives as a slice.

mod allocation;
mod comparison;
mod filter;
mod protocol;

pub use allocation::{reconcile_percentages, AllocationPlan, AllocationRequest, Allocator, NO_SUITABLE_POOLS, WARNINGS};
pub use comparison::{
    Comparator, ComparisonReport, ComparisonRequest, ProtocolBreakdown, ProtocolRanking, ProtocolRiskProfile,
};
pub use filter::{filter_and_rank, FilterCriteria, FindReport, FindSummary, RiskDistribution};
pub use protocol::{ProtocolOverview, ProtocolRequest, TopPool};
