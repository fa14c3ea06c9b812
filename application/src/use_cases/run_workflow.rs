//! Run workflow use case
//!
//! Orchestrates the full decision lifecycle: load, review, critique,
//! verify, score, synthesize, gate, persist. Enrichment inputs (research,
//! ancestry, risk simulation) are optional and degrade to absence; every
//! persistence write is an independent operation so one failed artifact
//! does not lose the others.

use crate::config::RunOptions;
use crate::ports::decision_store::{DecisionStore, StoreError};
use crate::ports::observer::WorkflowObserver;
use crate::ports::provider_gateway::{CompletionRequest, GatewayError, ProviderGateway};
use crate::ports::research::{
    AncestryRequest, AncestryResult, AncestryRetriever, ResearchDigest, ResearchProvider,
    ResearchRequest, RetrievalMethod, RiskSimulation, RiskSimulator, SimulationMode,
};
use crate::use_cases::review_round::ReviewRoundUseCase;
use council_domain::{
    AgentProfile, DecisionSnapshot, DomainError, GateDecision, PromptTemplate, Synthesis,
    WorkflowState, WorkflowStatus, apply_synthesis_guardrails, build_prd, decide_gate,
    evaluate_hygiene, extract_json, open_questions, score_reviews, verify_evidence,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Sections every decision document is expected to carry, each tracked as
/// a governance checkbox on the decision record.
const REQUIRED_SECTIONS: [&str; 5] = [
    "problem_statement",
    "financial_analysis",
    "risk_register",
    "success_metrics",
    "alternatives",
];

const RESEARCH_PROVIDER_NAME: &str = "web";
const RESEARCH_MAX_RESULTS: usize = 5;
const ANCESTRY_TOP_K: usize = 3;
const SIMULATION_SAMPLE_SIZE: u32 = 10_000;

/// Errors that can occur during workflow execution
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Decision not found: {0}")]
    DecisionNotFound(String),

    #[error("Bulk run of {count} decisions exceeds the cap of {cap}")]
    BulkCapExceeded { count: usize, cap: usize },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Use case for running the full decision workflow
pub struct RunWorkflowUseCase<G: ProviderGateway + 'static, S: DecisionStore> {
    gateway: Arc<G>,
    store: Arc<S>,
    research: Option<Arc<dyn ResearchProvider>>,
    ancestry: Option<Arc<dyn AncestryRetriever>>,
    risk_simulator: Option<Arc<dyn RiskSimulator>>,
}

impl<G: ProviderGateway + 'static, S: DecisionStore> RunWorkflowUseCase<G, S> {
    pub fn new(gateway: Arc<G>, store: Arc<S>) -> Self {
        Self {
            gateway,
            store,
            research: None,
            ancestry: None,
            risk_simulator: None,
        }
    }

    pub fn with_research(mut self, research: Arc<dyn ResearchProvider>) -> Self {
        self.research = Some(research);
        self
    }

    pub fn with_ancestry(mut self, ancestry: Arc<dyn AncestryRetriever>) -> Self {
        self.ancestry = Some(ancestry);
        self
    }

    pub fn with_risk_simulator(mut self, simulator: Arc<dyn RiskSimulator>) -> Self {
        self.risk_simulator = Some(simulator);
        self
    }

    /// Execute the workflow for a single decision.
    pub async fn execute(
        &self,
        decision_id: &str,
        options: &RunOptions,
        observer: Arc<dyn WorkflowObserver>,
    ) -> Result<WorkflowState, WorkflowError> {
        let stored = self.store.get(decision_id).await.map_err(|e| match e {
            StoreError::NotFound(id) => WorkflowError::DecisionNotFound(id),
            other => WorkflowError::Store(other),
        })?;

        let mut state = WorkflowState::new(stored.id, stored.name, stored.snapshot);
        state.missing_sections = missing_sections(&state.snapshot);
        info!(
            decision = %state.decision_id,
            missing = state.missing_sections.len(),
            "starting workflow run"
        );

        let mut panel = AgentProfile::core_panel();
        if options.red_team {
            panel.extend(AgentProfile::red_team());
        }

        let enrichment = self.gather_enrichment(&state, options).await;

        state.advance_to(WorkflowStatus::Reviewing)?;
        self.store
            .update_status(&state.decision_id, WorkflowStatus::Reviewing)
            .await?;

        // Initial reviews, fanned out across the panel
        observer.on_stage(&state.decision_id, "reviews");
        let panel_use_case = ReviewRoundUseCase::new(Arc::clone(&self.gateway));
        let mut reviews = panel_use_case
            .initial_round(
                &state.decision_name,
                &state.snapshot,
                &panel,
                enrichment.as_deref(),
                options,
                Arc::clone(&observer),
            )
            .await;

        if options.rounds > 0 {
            observer.on_stage(&state.decision_id, "critique");
            state.interaction_rounds = panel_use_case
                .critique_rounds(
                    &state.decision_name,
                    &state.snapshot,
                    &panel,
                    &mut reviews,
                    options.rounds,
                    options,
                    Arc::clone(&observer),
                )
                .await;
        }
        for review in reviews.into_values() {
            if let Err(e) = self.store.upsert_review(&state.decision_id, &review).await {
                warn!(agent = %review.agent_id, error = %e, "failed to persist review");
            }
            state.put_review(review);
        }

        // Pure stages over the assembled state
        observer.on_stage(&state.decision_id, "evidence");
        state.evidence = Some(verify_evidence(&state.reviews, options.research));

        observer.on_stage(&state.decision_id, "hygiene");
        let hygiene = evaluate_hygiene(&state.snapshot, &state.missing_sections);
        state.hygiene_score = hygiene.score;
        state.hygiene_findings = hygiene.findings;

        observer.on_stage(&state.decision_id, "scoring");
        let breakdown = score_reviews(&state.reviews, state.hygiene_score);
        state.dqs = breakdown.dqs;
        state.substance_score = breakdown.substance_score;
        state.confidence_score = breakdown.confidence_score;
        state.dissent_penalty = breakdown.dissent_penalty;
        state.confidence_penalty = breakdown.confidence_penalty;

        observer.on_stage(&state.decision_id, "synthesis");
        let mut synthesis = self.synthesize(&state, options).await;
        apply_synthesis_guardrails(&mut synthesis, &state.reviews);
        state.synthesis = Some(synthesis);
        state.advance_to(WorkflowStatus::Synthesized)?;
        if let Some(synthesis) = &state.synthesis
            && let Err(e) = self
                .store
                .upsert_synthesis(&state.decision_id, synthesis)
                .await
        {
            warn!(error = %e, "failed to persist synthesis");
        }
        self.store
            .update_status(&state.decision_id, WorkflowStatus::Synthesized)
            .await?;

        observer.on_stage(&state.decision_id, "gate");
        let gate = decide_gate(&state);
        state.gate = Some(gate);
        info!(decision = %state.decision_id, gate = %gate, dqs = state.dqs, "gate decided");

        // Only an approved decision reaches Decided and earns a PRD; a
        // Challenged or Blocked run persists straight from Synthesized.
        if gate == GateDecision::Approved {
            state.advance_to(WorkflowStatus::Decided)?;
            self.store
                .update_status(&state.decision_id, WorkflowStatus::Decided)
                .await?;
            let prd = build_prd(&state);
            if let Err(e) = self.store.upsert_prd(&state.decision_id, &prd).await {
                warn!(error = %e, "failed to persist PRD");
            }
            state.prd = Some(prd);
        }

        observer.on_stage(&state.decision_id, "persist");
        let checks = aggregate_governance_checks(&state);
        if !checks.is_empty()
            && let Err(e) = self
                .store
                .upsert_governance_checks(&state.decision_id, &checks)
                .await
        {
            warn!(error = %e, "failed to persist governance checks");
        }
        self.store.record_run(&state).await?;
        state.advance_to(WorkflowStatus::Persisted)?;
        self.store
            .update_status(&state.decision_id, WorkflowStatus::Persisted)
            .await?;

        Ok(state)
    }

    /// Collect optional enrichment into a single notes block. Failures are
    /// logged and skipped; a run never aborts for missing enrichment.
    async fn gather_enrichment(&self, state: &WorkflowState, options: &RunOptions) -> Option<String> {
        let mut notes = Vec::new();

        if options.research
            && let Some(research) = &self.research
        {
            let request = ResearchRequest {
                agent_name: "panel".to_string(),
                snapshot: state.snapshot.clone(),
                missing_sections: state.missing_sections.clone(),
                max_results: RESEARCH_MAX_RESULTS,
            };
            match research.fetch(&request, RESEARCH_PROVIDER_NAME).await {
                Ok(Some(digest)) if !digest.items.is_empty() => {
                    notes.push(render_research(&digest));
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "research provider failed"),
            }
        }

        if let Some(ancestry) = &self.ancestry {
            let request = AncestryRequest {
                decision_id: state.decision_id.clone(),
                decision_name: state.decision_name.clone(),
                summary: summarize_body(&state.snapshot.body),
                body: state.snapshot.body.clone(),
                top_k: ANCESTRY_TOP_K,
            };
            match ancestry.retrieve(&request).await {
                Ok(result) if !result.similar_decisions.is_empty() => {
                    notes.push(render_ancestry(&result));
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "ancestry retrieval failed"),
            }
        }

        if let Some(simulator) = &self.risk_simulator {
            match simulator
                .run(&state.snapshot, &state.decision_id, SIMULATION_SAMPLE_SIZE)
                .await
            {
                Ok(simulation) if simulation.mode == SimulationMode::Estimated => {
                    if let Some(summary) = render_simulation(&simulation) {
                        notes.push(summary);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "risk simulation failed"),
            }
        }

        if notes.is_empty() { None } else { Some(notes.join("\n\n")) }
    }

    /// Chairperson synthesis. A gateway or parse failure falls back to a
    /// deterministic synthesis derived from the gate rules, so the run
    /// always carries one.
    async fn synthesize(&self, state: &WorkflowState, options: &RunOptions) -> Synthesis {
        let request = CompletionRequest::new(
            PromptTemplate::synthesis_system(),
            PromptTemplate::synthesis_user(&state.decision_name, &state.reviews),
            &options.chairperson_model,
        );

        match self.gateway.complete(&request).await {
            Ok(raw) => match parse_synthesis(&raw, &options.chairperson_model) {
                Some(synthesis) => synthesis,
                None => {
                    warn!("chairperson returned no usable synthesis; using fallback");
                    fallback_synthesis(state, &options.chairperson_model)
                }
            },
            Err(e) => {
                warn!(error = %e, "synthesis request failed; using fallback");
                fallback_synthesis(state, &options.chairperson_model)
            }
        }
    }
}

/// Required sections whose governance checkbox is not ticked on the
/// decision record.
fn missing_sections(snapshot: &DecisionSnapshot) -> Vec<String> {
    REQUIRED_SECTIONS
        .iter()
        .filter(|section| {
            !snapshot
                .governance_checks
                .iter()
                .any(|check| check.eq_ignore_ascii_case(section))
        })
        .map(|s| s.to_string())
        .collect()
}

/// Infer which required-section checkboxes a freshly seeded decision
/// should carry, by locating the section headings in its body.
pub fn present_sections(body: &str) -> Vec<String> {
    let lowered = body.to_lowercase();
    REQUIRED_SECTIONS
        .iter()
        .filter(|section| lowered.contains(&section.replace('_', " ")))
        .map(|s| s.to_string())
        .collect()
}

fn summarize_body(body: &str) -> String {
    body.lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default()
        .trim()
        .chars()
        .take(200)
        .collect()
}

fn render_research(digest: &ResearchDigest) -> String {
    let mut lines = vec![format!(
        "Research ({} lens, query \"{}\"):",
        digest.lens, digest.query
    )];
    for item in &digest.items {
        let dated = item
            .published_date
            .as_deref()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        lines.push(format!("- {}{}: {} <{}>", item.title, dated, item.snippet, item.url));
    }
    lines.join("\n")
}

fn render_ancestry(result: &AncestryResult) -> String {
    let method = match result.retrieval_method {
        RetrievalMethod::VectorDb => "vector-db",
        RetrievalMethod::LexicalFallback => "lexical-fallback",
    };
    let mut lines = vec![format!("Related prior decisions ({method}):")];
    for similar in &result.similar_decisions {
        lines.push(format!(
            "- {} [{}]: {}",
            similar.name, similar.decision_id, similar.summary
        ));
    }
    lines.join("\n")
}

/// Render an estimated simulation for the reviewer prompts. Returns
/// `None` when the simulator reported a mode with no outcomes attached.
fn render_simulation(simulation: &RiskSimulation) -> Option<String> {
    let outcomes = simulation.outcomes.as_ref()?;
    let mut text = format!(
        "Risk simulation: expected net value {:.0} (ROI {:.2}), worst case {:.0} (ROI {:.2}), \
         best case {:.0} (ROI {:.2}), {:.0}% probability of loss.",
        outcomes.expected_case.net_value,
        outcomes.expected_case.roi,
        outcomes.worst_case.net_value,
        outcomes.worst_case.roi,
        outcomes.best_case.net_value,
        outcomes.best_case.roi,
        outcomes.probability_of_loss * 100.0,
    );
    if !simulation.assumptions.is_empty() {
        text.push_str("\nAssumptions: ");
        text.push_str(&simulation.assumptions.join("; "));
    }
    Some(text)
}

fn parse_synthesis(raw: &str, model: &str) -> Option<Synthesis> {
    let value = extract_json(raw)?;
    let map = value.as_object()?;

    let recommendation = match map
        .get("recommendation")
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("approved") => GateDecision::Approved,
        Some("blocked") => GateDecision::Blocked,
        Some(_) => GateDecision::Challenged,
        None => return None,
    };
    let summary = map
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let required_revisions = map
        .get("required_revisions")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Synthesis {
        recommendation,
        summary,
        required_revisions,
        chairperson_model: model.to_string(),
    })
}

/// Deterministic stand-in when the chairperson model is unavailable.
fn fallback_synthesis(state: &WorkflowState, model: &str) -> Synthesis {
    Synthesis {
        recommendation: decide_gate(state),
        summary: "Chairperson synthesis unavailable; recommendation derived from gate rules."
            .to_string(),
        required_revisions: open_questions(state),
        chairperson_model: model.to_string(),
    }
}

/// A governance check passes only when every reviewer that reported it
/// marked it met. Checks nobody reported are omitted.
fn aggregate_governance_checks(state: &WorkflowState) -> BTreeMap<String, bool> {
    let mut checks = BTreeMap::new();
    for name in &state.snapshot.governance_checks {
        let mut reported = false;
        let mut all_met = true;
        for review in state.reviews.values() {
            if let Some(met) = review.governance_checks_met.get(name) {
                reported = true;
                all_met &= met;
            }
        }
        if reported {
            checks.insert(name.clone(), all_met);
        }
    }
    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::decision_store::StoredDecision;
    use crate::ports::observer::NoObserver;
    use async_trait::async_trait;
    use council_domain::{DecisionSnapshot, PrdArtifact, ReviewOutput};
    use std::sync::Mutex;

    fn healthy_body() -> String {
        "\
# Problem Statement\nChurn is rising in the mid-market segment.\n\
# Financial Analysis\nInvestment of $2M against a $3M twelve month benefit.\n\
# Risk Register\nExecution depends on two external vendors.\n\
# Success Metrics\nReduce churn by 20% within the horizon.\n\
# Alternatives\nDo nothing, or license instead of build.\n"
            .to_string()
    }

    fn healthy_snapshot() -> DecisionSnapshot {
        let mut snapshot = DecisionSnapshot::new(healthy_body());
        snapshot.governance_checks = present_sections(&snapshot.body);
        snapshot.properties.insert(
            "investment_required".to_string(),
            Value::String("$2M".to_string()),
        );
        snapshot.properties.insert(
            "benefit_12m".to_string(),
            Value::String("$3M".to_string()),
        );
        snapshot
    }

    struct InMemoryStore {
        decisions: Mutex<BTreeMap<String, StoredDecision>>,
        statuses: Mutex<Vec<WorkflowStatus>>,
        reviews: Mutex<Vec<ReviewOutput>>,
        prds: Mutex<Vec<PrdArtifact>>,
        runs: Mutex<Vec<WorkflowState>>,
    }

    impl InMemoryStore {
        fn with_decision(decision: StoredDecision) -> Self {
            let mut decisions = BTreeMap::new();
            decisions.insert(decision.id.clone(), decision);
            Self {
                decisions: Mutex::new(decisions),
                statuses: Mutex::new(Vec::new()),
                reviews: Mutex::new(Vec::new()),
                prds: Mutex::new(Vec::new()),
                runs: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DecisionStore for InMemoryStore {
        async fn get(&self, decision_id: &str) -> Result<StoredDecision, StoreError> {
            self.decisions
                .lock()
                .unwrap()
                .get(decision_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(decision_id.to_string()))
        }

        async fn list_proposed(&self) -> Result<Vec<String>, StoreError> {
            Ok(self.decisions.lock().unwrap().keys().cloned().collect())
        }

        async fn update_status(
            &self,
            _decision_id: &str,
            status: WorkflowStatus,
        ) -> Result<(), StoreError> {
            self.statuses.lock().unwrap().push(status);
            Ok(())
        }

        async fn upsert_review(
            &self,
            _decision_id: &str,
            review: &ReviewOutput,
        ) -> Result<(), StoreError> {
            self.reviews.lock().unwrap().push(review.clone());
            Ok(())
        }

        async fn upsert_synthesis(
            &self,
            _decision_id: &str,
            _synthesis: &Synthesis,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn upsert_prd(&self, _decision_id: &str, prd: &PrdArtifact) -> Result<(), StoreError> {
            self.prds.lock().unwrap().push(prd.clone());
            Ok(())
        }

        async fn upsert_governance_checks(
            &self,
            _decision_id: &str,
            _checks: &BTreeMap<String, bool>,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn record_run(&self, state: &WorkflowState) -> Result<(), StoreError> {
            self.runs.lock().unwrap().push(state.clone());
            Ok(())
        }
    }

    /// Gateway that approves everything, including the synthesis.
    struct ApprovingGateway;

    #[async_trait]
    impl ProviderGateway for ApprovingGateway {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
            if request.system.contains("chair") {
                return Ok(r#"{"recommendation": "approved",
                    "summary": "Panel aligned; proceed.",
                    "required_revisions": []}"#
                    .to_string());
            }
            Ok(r#"{"thesis": "A well-grounded assessment of the plan.",
                "score": 8, "confidence": 0.85, "blocked": false}"#
                .to_string())
        }
    }

    fn stored(id: &str) -> StoredDecision {
        StoredDecision {
            id: id.to_string(),
            name: "EMEA expansion".to_string(),
            snapshot: healthy_snapshot(),
            status: WorkflowStatus::Proposed,
        }
    }

    #[tokio::test]
    async fn test_full_run_approves_healthy_decision() {
        let store = Arc::new(InMemoryStore::with_decision(stored("d-1")));
        let use_case = RunWorkflowUseCase::new(Arc::new(ApprovingGateway), Arc::clone(&store));

        let options = RunOptions::default().with_rounds(0);
        let state = use_case
            .execute("d-1", &options, Arc::new(NoObserver))
            .await
            .unwrap();

        assert_eq!(state.gate, Some(GateDecision::Approved));
        assert_eq!(state.status, WorkflowStatus::Persisted);
        assert_eq!(state.reviews.len(), 4);
        assert!(state.dqs >= 7.0);
        assert!(state.prd.is_some());
        assert_eq!(store.reviews.lock().unwrap().len(), 4);
        assert_eq!(store.prds.lock().unwrap().len(), 1);
        assert_eq!(store.runs.lock().unwrap().len(), 1);
        assert_eq!(
            *store.statuses.lock().unwrap(),
            vec![
                WorkflowStatus::Reviewing,
                WorkflowStatus::Synthesized,
                WorkflowStatus::Decided,
                WorkflowStatus::Persisted,
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_decision_is_an_error() {
        let store = Arc::new(InMemoryStore::with_decision(stored("d-1")));
        let use_case = RunWorkflowUseCase::new(Arc::new(ApprovingGateway), store);

        let err = use_case
            .execute("d-404", &RunOptions::default(), Arc::new(NoObserver))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::DecisionNotFound(id) if id == "d-404"));
    }

    #[tokio::test]
    async fn test_incomplete_document_is_challenged() {
        let mut decision = stored("d-2");
        decision.snapshot = DecisionSnapshot::new("A one-line pitch with no sections.");
        let store = Arc::new(InMemoryStore::with_decision(decision));
        let use_case = RunWorkflowUseCase::new(Arc::new(ApprovingGateway), Arc::clone(&store));

        let options = RunOptions::default().with_rounds(0);
        let state = use_case
            .execute("d-2", &options, Arc::new(NoObserver))
            .await
            .unwrap();

        // No section checkbox is ticked, so hygiene caps out below the
        // floor and the gate challenges despite a clean panel.
        assert_eq!(state.missing_sections.len(), 5);
        assert_eq!(state.gate, Some(GateDecision::Challenged));
        assert!(state.prd.is_none());

        // A run that is not approved skips Decided entirely
        assert_eq!(state.status, WorkflowStatus::Persisted);
        assert_eq!(
            *store.statuses.lock().unwrap(),
            vec![
                WorkflowStatus::Reviewing,
                WorkflowStatus::Synthesized,
                WorkflowStatus::Persisted,
            ]
        );
    }

    #[tokio::test]
    async fn test_risk_simulation_reaches_reviewer_prompts() {
        use crate::ports::research::{
            OutcomeBand, ResearchError, SimulationOutcomes,
        };

        /// Gateway that records every user prompt it is asked to complete.
        struct RecordingGateway {
            prompts: Mutex<Vec<String>>,
        }

        #[async_trait]
        impl ProviderGateway for RecordingGateway {
            async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
                self.prompts.lock().unwrap().push(request.user.clone());
                ApprovingGateway.complete(request).await
            }
        }

        struct StubSimulator;

        #[async_trait]
        impl RiskSimulator for StubSimulator {
            async fn run(
                &self,
                _snapshot: &DecisionSnapshot,
                _decision_id: &str,
                _sample_size: u32,
            ) -> Result<RiskSimulation, ResearchError> {
                Ok(RiskSimulation {
                    mode: SimulationMode::Estimated,
                    inputs: BTreeMap::from([("investment".to_string(), 2_000_000.0)]),
                    assumptions: vec!["Benefit centered on the stated 12-month figure".to_string()],
                    outcomes: Some(SimulationOutcomes {
                        expected_case: OutcomeBand { net_value: 1_000_000.0, roi: 0.5 },
                        worst_case: OutcomeBand { net_value: -800_000.0, roi: -0.4 },
                        best_case: OutcomeBand { net_value: 2_400_000.0, roi: 1.2 },
                        probability_of_loss: 0.4,
                    }),
                })
            }
        }

        let store = Arc::new(InMemoryStore::with_decision(stored("d-1")));
        let gateway = Arc::new(RecordingGateway {
            prompts: Mutex::new(Vec::new()),
        });
        let use_case = RunWorkflowUseCase::new(Arc::clone(&gateway), store)
            .with_risk_simulator(Arc::new(StubSimulator));

        let options = RunOptions::default().with_rounds(0);
        use_case
            .execute("d-1", &options, Arc::new(NoObserver))
            .await
            .unwrap();

        let prompts = gateway.prompts.lock().unwrap();
        assert!(
            prompts
                .iter()
                .any(|p| p.contains("Risk simulation") && p.contains("40% probability of loss"))
        );
    }

    #[test]
    fn test_missing_sections_follow_governance_checks() {
        let full = DecisionSnapshot::new("irrelevant")
            .with_governance_checks(REQUIRED_SECTIONS.iter().map(|s| s.to_string()).collect());
        assert!(missing_sections(&full).is_empty());

        let partial = DecisionSnapshot::new("irrelevant")
            .with_governance_checks(vec!["problem_statement".to_string()]);
        let missing = missing_sections(&partial);
        assert_eq!(missing.len(), 4);
        assert!(missing.contains(&"financial_analysis".to_string()));
    }

    #[test]
    fn test_present_sections_finds_headings() {
        assert_eq!(present_sections(&healthy_body()).len(), 5);
        assert_eq!(
            present_sections("# Problem Statement\nOnly this."),
            vec!["problem_statement".to_string()]
        );
    }

    #[test]
    fn test_parse_synthesis_requires_recommendation() {
        assert!(parse_synthesis(r#"{"summary": "x"}"#, "m").is_none());
        let synthesis =
            parse_synthesis(r#"{"recommendation": "BLOCKED", "summary": "no"}"#, "m").unwrap();
        assert_eq!(synthesis.recommendation, GateDecision::Blocked);
    }
}
