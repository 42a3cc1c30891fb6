//! Mock Pool Source
//!
//! For testing and demo purposes. Serves a fixed, realistic snapshot.

use async_trait::async_trait;

use super::PoolSource;
use crate::error::Result;
use crate::model::RawPool;

/// Pool source with a static snapshot
pub struct MockPoolSource {
    pools: Vec<RawPool>,
}

impl Default for MockPoolSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPoolSource {
    /// A small cross-chain snapshot covering every risk level
    pub fn new() -> Self {
        Self::with_pools(vec![
            RawPool::new("Ethereum", "aave-v3", "USDC", 1_850_000_000.0, 4.12)
                .with_base_and_reward(4.12, 0.0)
                .with_stablecoin(true),
            RawPool::new("Ethereum", "lido", "STETH", 24_300_000_000.0, 3.05).with_change_7d(-1.4),
            RawPool::new("Ethereum", "compound-v3", "USDC", 620_000_000.0, 5.31)
                .with_base_and_reward(4.02, 1.29)
                .with_stablecoin(true),
            RawPool::new("Ethereum", "uniswap-v3", "USDC-WETH", 310_000_000.0, 18.7)
                .with_il_risk("yes")
                .with_exposure("multi")
                .with_change_7d(6.3),
            RawPool::new("Ethereum", "pendle", "PT-SUSDE", 95_000_000.0, 24.6).with_stablecoin(true),
            RawPool::new("Arbitrum", "gmx-v2", "GM-ETH-USDC", 45_000_000.0, 31.2)
                .with_base_and_reward(12.0, 19.2)
                .with_il_risk("yes")
                .with_exposure("multi"),
            RawPool::new("Base", "aerodrome-v2", "USDC-AERO", 8_600_000.0, 64.5)
                .with_base_and_reward(3.5, 61.0)
                .with_il_risk("yes")
                .with_exposure("multi")
                .with_change_7d(-24.0),
            RawPool::new("Base", "moonwell", "USDC", 140_000_000.0, 6.8)
                .with_base_and_reward(4.9, 1.9)
                .with_stablecoin(true),
            RawPool::new("Solana", "kamino-lend", "SOL", 410_000_000.0, 7.4),
            RawPool::new("BSC", "pancakeswap-amm-v3", "CAKE-WBNB", 720_000.0, 142.0)
                .with_base_and_reward(8.0, 134.0)
                .with_il_risk("yes")
                .with_exposure("multi"),
            RawPool::new("Ethereum", "curve-dex", "3CRV", 160_000_000.0, 0.0).with_stablecoin(true),
        ])
    }

    pub fn with_pools(pools: Vec<RawPool>) -> Self {
        Self { pools }
    }

    /// A source that always returns an empty snapshot
    pub fn empty() -> Self {
        Self::with_pools(Vec::new())
    }
}

#[async_trait]
impl PoolSource for MockPoolSource {
    async fn fetch_pools(&self) -> Result<Vec<RawPool>> {
        Ok(self.pools.clone())
    }

    fn name(&self) -> &str {
        "MockPools"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_snapshot() {
        let source = MockPoolSource::new();
        let pools = source.fetch_pools().await.unwrap();
        assert!(pools.len() > 5);
        assert!(pools.iter().all(|p| p.project.is_some()));
    }

    #[tokio::test]
    async fn test_empty_source() {
        let pools = MockPoolSource::empty().fetch_pools().await.unwrap();
        assert!(pools.is_empty());
    }
}
