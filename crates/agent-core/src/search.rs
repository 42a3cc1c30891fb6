//! Web Search Abstraction
//!
//! Entrypoints that research a topic go through [`SearchProvider`], so the
//! backing search API can be swapped or mocked.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One search result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a web search, returning at most `count` hits
    async fn search(&self, query: &str, count: u8) -> Result<Vec<SearchHit>>;

    /// Provider name
    fn name(&self) -> &str;
}
