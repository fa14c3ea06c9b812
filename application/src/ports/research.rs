//! Optional enrichment ports
//!
//! Research, decision ancestry, and risk simulation are all optional
//! inputs to a run: the workflow proceeds without them, and a failure in
//! any of them degrades to "no enrichment" rather than aborting the run.

use council_domain::DecisionSnapshot;
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("{0}")]
pub struct ResearchError(pub String);

/// What one agent wants researched.
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    pub agent_name: String,
    pub snapshot: DecisionSnapshot,
    /// Required sections the decision is missing; lets the provider focus
    /// its queries on the gaps.
    pub missing_sections: Vec<String>,
    pub max_results: usize,
}

/// One retrieved source.
#[derive(Debug, Clone)]
pub struct ResearchItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub published_date: Option<String>,
}

/// The provider's answer: the query it ran, the lens it applied, and the
/// sources it found.
#[derive(Debug, Clone)]
pub struct ResearchDigest {
    pub query: String,
    pub lens: String,
    pub items: Vec<ResearchItem>,
}

/// External research supporting one agent's review. `provider_name`
/// selects the upstream search backend.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn fetch(
        &self,
        request: &ResearchRequest,
        provider_name: &str,
    ) -> Result<Option<ResearchDigest>, ResearchError>;
}

/// Lookup request for prior related decisions.
#[derive(Debug, Clone)]
pub struct AncestryRequest {
    pub decision_id: String,
    pub decision_name: String,
    pub summary: String,
    pub body: String,
    pub top_k: usize,
}

/// How the retriever found its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMethod {
    VectorDb,
    LexicalFallback,
}

/// One prior decision judged similar to the current one.
#[derive(Debug, Clone)]
pub struct SimilarDecision {
    pub decision_id: String,
    pub name: String,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct AncestryResult {
    pub similar_decisions: Vec<SimilarDecision>,
    pub retrieval_method: RetrievalMethod,
}

/// Retrieves summaries of prior related decisions.
#[async_trait]
pub trait AncestryRetriever: Send + Sync {
    async fn retrieve(&self, request: &AncestryRequest) -> Result<AncestryResult, ResearchError>;
}

/// Whether the simulator had enough figures to estimate anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    Estimated,
    Insufficient,
}

/// Net value and ROI for one outcome band.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeBand {
    pub net_value: f64,
    pub roi: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationOutcomes {
    pub expected_case: OutcomeBand,
    pub worst_case: OutcomeBand,
    pub best_case: OutcomeBand,
    /// Fraction of samples that lost money, in [0,1].
    pub probability_of_loss: f64,
}

/// Simulation result. `outcomes` is absent when `mode` is `Insufficient`.
#[derive(Debug, Clone)]
pub struct RiskSimulation {
    pub mode: SimulationMode,
    /// Named figures the simulation was driven by.
    pub inputs: BTreeMap<String, f64>,
    pub assumptions: Vec<String>,
    pub outcomes: Option<SimulationOutcomes>,
}

/// Monte-Carlo style risk simulation over the decision's stated figures.
/// Implementations must be deterministic given the same snapshot,
/// decision id, and sample size.
#[async_trait]
pub trait RiskSimulator: Send + Sync {
    async fn run(
        &self,
        snapshot: &DecisionSnapshot,
        decision_id: &str,
        sample_size: u32,
    ) -> Result<RiskSimulation, ResearchError>;
}
