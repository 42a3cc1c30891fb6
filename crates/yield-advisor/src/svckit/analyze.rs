//! Analyze-Protocol Entrypoint
//!
//! Premium deep dive: live pool statistics, web research on audits and
//! exploits, and an LLM risk write-up. Research and analysis are optional;
//! without providers the numbers are still returned.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use agent_core::{
    Entrypoint, EntrypointCall, EntrypointManifest, EntrypointOutput, GenerationOptions, LlmProvider, Message,
    ParameterSchema, Result as CoreResult, SearchHit, SearchProvider,
};

use super::{failure, YieldContext};
use crate::error::AdvisorError;
use crate::strategy::{ProtocolOverview, ProtocolRequest};

const KEY: &str = "analyze-protocol";

/// Hits requested per research query
const RESEARCH_RESULTS: u8 = 5;

/// Top pools quoted to the model
const PROMPT_POOLS: usize = 10;

/// TVL above which size counts as some protection
const LARGE_TVL: f64 = 100e6;

pub const YIELD_ANALYST_PROMPT: &str = "You are Ted, a sardonic DeFi analyst. You understand:
- Yield farming mechanics (LP fees, liquidity mining, real yield vs emissions)
- Risk factors (smart contract risk, IL, oracle risk, rug risk)
- Protocol sustainability (real revenue vs token printing)
- Historical DeFi exploits and what to watch for

Be direct about risks. Gambling is fine if you know you're gambling.";

const AUDIT_WARNING: &str = "No audits found - DYOR heavily";
const HACK_WARNING: &str = "Potential exploit history found - investigate before depositing";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Research {
    audits: Vec<SearchHit>,
    exploit_history: Vec<SearchHit>,
    audit_warning: Option<&'static str>,
    hack_warning: Option<&'static str>,
}

impl Research {
    fn new(audits: Vec<SearchHit>, exploit_history: Vec<SearchHit>) -> Self {
        let audit_warning = audits.is_empty().then_some(AUDIT_WARNING);
        let hack_warning = exploit_history
            .iter()
            .any(|hit| {
                let title = hit.title.to_lowercase();
                title.contains("hack") || title.contains("exploit")
            })
            .then_some(HACK_WARNING);

        Self {
            audits,
            exploit_history,
            audit_warning,
            hack_warning,
        }
    }
}

pub struct AnalyzeProtocolEntrypoint {
    ctx: YieldContext,
    search: Option<Arc<dyn SearchProvider>>,
    llm: Option<Arc<dyn LlmProvider>>,
    options: GenerationOptions,
}

impl AnalyzeProtocolEntrypoint {
    pub fn new(ctx: YieldContext) -> Self {
        Self {
            ctx,
            search: None,
            llm: None,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    async fn search(&self, query: String) -> Vec<SearchHit> {
        let Some(search) = &self.search else {
            return Vec::new();
        };
        match search.search(&query, RESEARCH_RESULTS).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(provider = search.name(), query = %query, error = %e, "Research search failed");
                Vec::new()
            }
        }
    }

    async fn research(&self, protocol: &str) -> Research {
        let (audits, hacks) = futures::join!(
            self.search(format!("{protocol} DeFi audit report security")),
            self.search(format!("{protocol} hack exploit vulnerability DeFi")),
        );
        Research::new(audits, hacks)
    }

    /// LLM verdict as a JSON object, or `None` when unavailable or unparseable
    async fn analysis(&self, overview: &ProtocolOverview, research: &Research) -> Option<Value> {
        let llm = self.llm.as_ref()?;
        let messages = [
            Message::system(YIELD_ANALYST_PROMPT),
            Message::user(analysis_prompt(overview, research)),
        ];

        let completion = match llm.complete(&messages, &self.options).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(provider = llm.name(), error = %e, "AI analysis failed");
                return None;
            }
        };

        let span = completion.json_span()?;
        match serde_json::from_str::<Value>(span) {
            Ok(value @ Value::Object(_)) => Some(value),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "AI analysis was not valid JSON");
                None
            }
        }
    }
}

fn titles(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "None found".into();
    }
    hits.iter().map(|h| h.title.as_str()).collect::<Vec<_>>().join("; ")
}

fn analysis_prompt(overview: &ProtocolOverview, research: &Research) -> String {
    let pools = overview
        .top_pools
        .iter()
        .take(PROMPT_POOLS)
        .map(|p| format!("- {} on {}: {:.2}% APY, {} TVL, {} risk", p.asset, p.chain, p.apy, p.tvl, p.risk))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze this DeFi protocol for yield farming:

Protocol: {protocol}
Total TVL: ${tvl:.2}M
Average APY: {apy:.2}%
Active Chains: {chains}
Number of Pools: {count}

Top Pools:
{pools}

Audit search results: {audits}
Hack/exploit search results: {hacks}

Provide analysis as JSON:
{{
  "overallRisk": "low|medium|high|critical",
  "sustainabilityScore": "1-10 (10 = sustainable real yield)",
  "redFlags": ["any concerns"],
  "greenFlags": ["positive indicators"],
  "yieldSource": "where the yield actually comes from",
  "bestPools": ["top 3 recommended pools with reasoning"],
  "avoid": ["pools or strategies to avoid"],
  "verdict": "sardonic but useful take"
}}"#,
        protocol = overview.protocol,
        tvl = overview.tvl_raw / 1e6,
        apy = overview.average_apy,
        chains = overview.active_chains.join(", "),
        count = overview.pool_count,
        audits = titles(&research.audits),
        hacks = titles(&research.exploit_history),
    )
}

fn closing_comment(analysed: bool, tvl: f64) -> String {
    if !analysed {
        return "Data gathered but AI analysis failed. Trust the numbers, not the narrative.".into();
    }
    let size = if tvl > LARGE_TVL {
        "Size provides some security, but remember TVL can exit fast."
    } else {
        "Low TVL = higher risk. You're early or you're wrong."
    };
    format!(
        "Protocol analysis complete. I pulled live data, searched for audits and hacks, and gave you my honest take. {size}"
    )
}

#[async_trait]
impl Entrypoint for AnalyzeProtocolEntrypoint {
    fn manifest(&self) -> EntrypointManifest {
        EntrypointManifest {
            key: KEY.into(),
            description: "PREMIUM: Deep dive into a specific protocol. Fetches all pools, researches audit history, checks for past exploits, and provides AI risk analysis.".into(),
            price: Some("0.75".into()),
            parameters: vec![
                ParameterSchema::required("protocol", "string", "Protocol name or slug fragment (e.g. 'aave')"),
                ParameterSchema::optional("chain", "string", "Exact chain name, or 'all'").with_default(json!("all")),
            ],
            category: Some("analysis".into()),
        }
    }

    async fn invoke(&self, call: &EntrypointCall) -> CoreResult<EntrypointOutput> {
        let request: ProtocolRequest = call.parse_input()?;
        request.validate()?;

        let pools = self.ctx.snapshot().await;
        let overview = match ProtocolOverview::build(&pools, &request) {
            Ok(overview) => overview,
            Err(AdvisorError::NoData(_)) => return Ok(failure(KEY, "Failed to fetch yield data", None)),
            Err(AdvisorError::NoMatch(msg)) => {
                return Ok(failure(
                    KEY,
                    &msg,
                    Some("Either this protocol doesn't exist on DeFiLlama, or you spelled it wrong. Both are red flags."),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let research = self.research(&request.protocol).await;
        let analysis = self.analysis(&overview, &research).await;
        let comment = closing_comment(analysis.is_some(), overview.tvl_raw);

        debug!(
            protocol = %overview.protocol,
            pools = overview.pool_count,
            analysed = analysis.is_some(),
            "Protocol analysed"
        );

        let output = json!({
            "success": true,
            "protocol": overview.protocol,
            "overview": {
                "totalTvl": overview.total_tvl,
                "tvlRaw": overview.tvl_raw,
                "averageApy": format!("{:.2}%", overview.average_apy),
                "poolCount": overview.pool_count,
                "activeChains": overview.active_chains,
            },
            "topPools": overview.top_pools,
            "research": research,
            "aiAnalysis": analysis.unwrap_or_else(|| json!({ "error": "AI analysis unavailable" })),
            "comment": comment,
        });
        Ok(EntrypointOutput::success(KEY, output))
    }
}
