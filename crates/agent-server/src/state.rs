//! Application State

use std::path::PathBuf;
use std::sync::Arc;

use agent_core::{EntrypointRegistry, LlmProvider, SearchProvider};
use agent_payments::{CreditLedger, PaymentsConfig, PriceTable, TopUpHandler};
use yield_advisor::entrypoints::{AnalyzeProtocolEntrypoint, CompareEntrypoint, FindEntrypoint, OptimizeEntrypoint};
use yield_advisor::YieldContext;

/// Identity advertised on `/health` and `/entrypoints`
#[derive(Clone, Debug)]
pub struct AgentInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<AgentInfo>,

    /// Every paid and free entrypoint
    pub registry: Arc<EntrypointRegistry>,

    /// Per-call prices, taken from the manifests
    pub prices: Arc<PriceTable>,

    /// Charge priced entrypoints against `x-credit-key`
    pub metering: bool,

    pub ledger: Arc<dyn CreditLedger>,

    /// Top-up webhook (None without a webhook secret)
    pub top_ups: Option<Arc<TopUpHandler<dyn CreditLedger>>>,

    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(
        agent: AgentInfo,
        registry: EntrypointRegistry,
        payments: &PaymentsConfig,
        ledger: Arc<dyn CreditLedger>,
        public_dir: PathBuf,
    ) -> agent_payments::Result<Self> {
        let manifests = registry.manifests();
        let prices = PriceTable::from_listing(
            manifests
                .iter()
                .map(|m| (m.key.as_str(), m.price.as_deref())),
        )?;

        let top_ups = payments
            .webhook_secret
            .as_ref()
            .map(|secret| Arc::new(TopUpHandler::new(ledger.clone(), secret.clone())));

        Ok(Self {
            agent: Arc::new(agent),
            registry: Arc::new(registry),
            prices: Arc::new(prices),
            metering: payments.enabled,
            ledger,
            top_ups,
            public_dir,
        })
    }
}

/// The yield finder's entrypoints over one shared context
pub fn yield_registry(
    ctx: YieldContext,
    search: Option<Arc<dyn SearchProvider>>,
    llm: Option<Arc<dyn LlmProvider>>,
) -> EntrypointRegistry {
    let mut analyze = AnalyzeProtocolEntrypoint::new(ctx.clone());
    if let Some(search) = search {
        analyze = analyze.with_search(search);
    }
    if let Some(llm) = llm {
        analyze = analyze.with_llm(llm);
    }

    let mut registry = EntrypointRegistry::new();
    registry.register(FindEntrypoint::new(ctx.clone()));
    registry.register(CompareEntrypoint::new(ctx.clone()));
    registry.register(OptimizeEntrypoint::new(ctx));
    registry.register(analyze);
    registry
}
