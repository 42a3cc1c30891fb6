//! Pool Sources
//!
//! Where the raw snapshot comes from. The engine never fetches on its own;
//! entrypoints ask a [`PoolSource`] and hand the result to the engine.

mod cache;
mod defillama;
mod mock;

pub use cache::CachedPoolSource;
pub use defillama::{DefiLlamaConfig, DefiLlamaSource};
pub use mock::MockPoolSource;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::RawPool;

/// Pool snapshot provider (Strategy pattern)
///
/// Implement this for each yield data provider.
#[async_trait]
pub trait PoolSource: Send + Sync {
    /// Fetch the full current snapshot
    async fn fetch_pools(&self) -> Result<Vec<RawPool>>;

    /// Source name, for attribution in responses
    fn name(&self) -> &str;
}
