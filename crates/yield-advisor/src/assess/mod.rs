//! Pool Assessment
//!
//! Turns untrusted pool records into annotated [`Pool`](crate::model::Pool)
//! values: validation, risk scoring, trend labelling and commentary.

mod commentary;
mod normalize;
mod risk;
mod trend;

pub use commentary::{CommentCategory, CommentPicker, CommentSelector, FixedPicker, RandomPicker};
pub use normalize::{normalize_snapshot, PoolNormalizer};
pub use risk::RiskAssessor;
pub use trend::classify_trend;
