//! Server Configuration
//!
//! Everything comes from the environment (after `.env` is loaded).

use std::path::PathBuf;

use yield_advisor::source::DefiLlamaConfig;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_POOL_CACHE_SECS: u64 = 300;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub agent_name: String,
    pub agent_version: String,
    pub agent_description: String,

    /// Snapshot cache lifetime; 0 fetches on every call
    pub pool_cache_secs: u64,
    pub defillama: DefiLlamaConfig,

    /// Directory holding `logo.jpg`
    pub public_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            agent_name: "yield-finder".into(),
            agent_version: env!("CARGO_PKG_VERSION").into(),
            agent_description: "DeFi yield aggregation with live data. Find yield, but don't pretend you're not gambling."
                .into(),
            pool_cache_secs: DEFAULT_POOL_CACHE_SECS,
            defillama: DefiLlamaConfig::default(),
            public_dir: PathBuf::from("public"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(addr) => addr,
            Err(_) => {
                let port = match std::env::var("PORT") {
                    Ok(p) => p.parse::<u16>().map_err(|e| anyhow::anyhow!("PORT: {e}"))?,
                    Err(_) => DEFAULT_PORT,
                };
                format!("0.0.0.0:{port}")
            }
        };

        let pool_cache_secs = match std::env::var("POOL_CACHE_SECS") {
            Ok(v) => v.parse().map_err(|e| anyhow::anyhow!("POOL_CACHE_SECS: {e}"))?,
            Err(_) => DEFAULT_POOL_CACHE_SECS,
        };

        Ok(Self {
            bind_addr,
            agent_name: std::env::var("AGENT_NAME").unwrap_or(defaults.agent_name),
            agent_version: std::env::var("AGENT_VERSION").unwrap_or(defaults.agent_version),
            agent_description: defaults.agent_description,
            pool_cache_secs,
            defillama: DefiLlamaConfig::from_env(),
            public_dir: std::env::var("PUBLIC_DIR").map_or(defaults.public_dir, PathBuf::from),
        })
    }
}
