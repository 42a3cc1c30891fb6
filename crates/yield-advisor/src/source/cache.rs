//! Snapshot Cache
//!
//! Caller-side TTL cache around any [`PoolSource`]. Empty snapshots and
//! errors are never cached.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::PoolSource;
use crate::error::Result;
use crate::model::RawPool;

struct Cached {
    fetched_at: Instant,
    pools: Vec<RawPool>,
}

pub struct CachedPoolSource<S> {
    inner: S,
    ttl: Duration,
    cached: RwLock<Option<Cached>>,
}

impl<S: PoolSource> CachedPoolSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Drop the cached snapshot so the next fetch goes upstream
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    async fn fresh(&self) -> Option<Vec<RawPool>> {
        let guard = self.cached.read().await;
        guard
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.pools.clone())
    }
}

#[async_trait]
impl<S: PoolSource> PoolSource for CachedPoolSource<S> {
    async fn fetch_pools(&self) -> Result<Vec<RawPool>> {
        if let Some(pools) = self.fresh().await {
            debug!(count = pools.len(), "Serving cached pool snapshot");
            return Ok(pools);
        }

        let pools = self.inner.fetch_pools().await?;
        if !pools.is_empty() {
            *self.cached.write().await = Some(Cached {
                fetched_at: Instant::now(),
                pools: pools.clone(),
            });
        }
        Ok(pools)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::source::MockPoolSource;

    struct CountingSource {
        inner: MockPoolSource,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PoolSource for CountingSource {
        async fn fetch_pools(&self) -> Result<Vec<RawPool>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_pools().await
        }

        fn name(&self) -> &str {
            "Counting"
        }
    }

    fn counting(inner: MockPoolSource) -> CountingSource {
        CountingSource {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_serves_from_cache_within_ttl() {
        let cached = CachedPoolSource::new(counting(MockPoolSource::new()), Duration::from_secs(300));
        let first = cached.fetch_pools().await.unwrap();
        let second = cached.fetch_pools().await.unwrap();

        assert_eq!(first.len(), second.len());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);

        cached.invalidate().await;
        cached.fetch_pools().await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let cached = CachedPoolSource::new(counting(MockPoolSource::new()), Duration::ZERO);
        cached.fetch_pools().await.unwrap();
        cached.fetch_pools().await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_snapshot_not_cached() {
        let cached = CachedPoolSource::new(counting(MockPoolSource::empty()), Duration::from_secs(300));
        cached.fetch_pools().await.unwrap();
        cached.fetch_pools().await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }
}
