//! Yield Finder HTTP Server
//!
//! Axum-based server exposing the yield-advisor entrypoints as priced,
//! credit-metered HTTP operations.

mod config;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use agent_core::{LlmProvider, SearchProvider};
use agent_payments::{MemoryCreditLedger, PaymentsConfig};
use agent_runtime::{BraveSearch, OpenRouterProvider};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yield_advisor::source::{CachedPoolSource, DefiLlamaSource, PoolSource};
use yield_advisor::YieldContext;

use crate::config::ServerConfig;
use crate::state::{yield_registry, AgentInfo, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let payments = PaymentsConfig::from_env()?;

    // Pool snapshot source
    let llama = DefiLlamaSource::from_config(config.defillama.clone())?;
    let source: Arc<dyn PoolSource> = if config.pool_cache_secs > 0 {
        tracing::info!(ttl_secs = config.pool_cache_secs, "Caching pool snapshots");
        Arc::new(CachedPoolSource::new(llama, Duration::from_secs(config.pool_cache_secs)))
    } else {
        Arc::new(llama)
    };
    tracing::info!(url = %config.defillama.base_url, "Using DeFiLlama yields");

    // Optional research providers
    let llm: Option<Arc<dyn LlmProvider>> = match OpenRouterProvider::from_env() {
        Some(provider) => {
            tracing::info!("✓ OpenRouter configured");
            Some(Arc::new(provider?))
        }
        None => {
            tracing::warn!("⚠ OPENROUTER_API_KEY not set - AI analysis disabled");
            None
        }
    };
    let search: Option<Arc<dyn SearchProvider>> = match BraveSearch::from_env() {
        Some(search) => {
            tracing::info!("✓ Brave Search configured");
            Some(Arc::new(search?))
        }
        None => {
            tracing::warn!("⚠ BRAVE_API_KEY not set - protocol research disabled");
            None
        }
    };

    let registry = yield_registry(YieldContext::new(source), search, llm);
    tracing::info!("Registered {} entrypoints:", registry.len());
    for manifest in registry.manifests() {
        tracing::info!("  • {} (${})", manifest.key, manifest.price.as_deref().unwrap_or("free"));
    }

    if payments.enabled {
        tracing::info!(daily_limit = payments.daily_limit, "✓ Credit metering enabled");
    } else {
        tracing::warn!("⚠ PAYMENTS_ENABLED not set - all entrypoints are free");
    }

    // Build application state
    let ledger = Arc::new(MemoryCreditLedger::new(payments.daily_limit));
    let state = AppState::new(
        AgentInfo {
            name: config.agent_name.clone(),
            version: config.agent_version.clone(),
            description: config.agent_description.clone(),
        },
        registry,
        &payments,
        ledger,
        config.public_dir.clone(),
    )?;

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 {} v{} running on http://{}", config.agent_name, config.agent_version, config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                    - Health check");
    tracing::info!("  GET  /entrypoints               - Entrypoint manifest");
    tracing::info!("  POST /entrypoints/{{key}}/invoke  - Invoke an entrypoint");
    tracing::info!("  POST /api/credits/verify        - Check a credit key");
    tracing::info!("  POST /webhook/credits           - Signed credit top-up");
    tracing::info!("  GET  /logo.jpg                  - Agent logo");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
