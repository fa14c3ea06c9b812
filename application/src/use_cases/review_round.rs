//! Review round use case
//!
//! Fans the panel out concurrently for the initial reviews, then runs the
//! optional peer-critique rounds. A failed or unparseable agent never
//! aborts the panel: it degrades to a blocked placeholder review so the
//! gate sees the gap.

use crate::config::RunOptions;
use crate::ports::observer::WorkflowObserver;
use crate::ports::provider_gateway::{CompletionRequest, ProviderGateway};
use council_domain::{
    AgentProfile, DecisionSnapshot, InteractionRound, PromptTemplate, ReviewOutput, RoundEntry,
    extract_json, normalize_review,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Dispatch offset between successive agents, to avoid a burst of
/// simultaneous requests tripping provider rate limits.
const STAGGER_MS: u64 = 150;

/// Use case for running the reviewer panel
pub struct ReviewRoundUseCase<G: ProviderGateway + 'static> {
    gateway: Arc<G>,
}

impl<G: ProviderGateway + 'static> ReviewRoundUseCase<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Run the initial review round: every agent reviews the decision in
    /// parallel, with a staggered dispatch.
    pub async fn initial_round(
        &self,
        decision_name: &str,
        snapshot: &DecisionSnapshot,
        agents: &[AgentProfile],
        research_notes: Option<&str>,
        options: &RunOptions,
        observer: Arc<dyn WorkflowObserver>,
    ) -> BTreeMap<String, ReviewOutput> {
        let mut set = JoinSet::new();
        for (index, agent) in agents.iter().enumerate() {
            let agent = apply_overrides(agent.clone(), options);
            let system = PromptTemplate::review_system(&agent);
            let user = PromptTemplate::review_user(
                decision_name,
                snapshot,
                &snapshot.governance_checks,
                research_notes,
            );
            let checks = snapshot.governance_checks.clone();
            let gateway = Arc::clone(&self.gateway);
            let observer = Arc::clone(&observer);
            set.spawn(async move {
                tokio::time::sleep(Duration::from_millis(STAGGER_MS * index as u64)).await;
                let review =
                    complete_review(gateway.as_ref(), &agent, system, user, &checks, &*observer)
                        .await;
                (agent.id, review)
            });
        }
        collect_reviews(set).await
    }

    /// Run `rounds` sequential peer-critique rounds. Each round shows every
    /// agent the rest of the panel's latest verdicts and lets it revise; a
    /// failed revision keeps the agent's previous review.
    pub async fn critique_rounds(
        &self,
        decision_name: &str,
        snapshot: &DecisionSnapshot,
        agents: &[AgentProfile],
        reviews: &mut BTreeMap<String, ReviewOutput>,
        rounds: u8,
        options: &RunOptions,
        observer: Arc<dyn WorkflowObserver>,
    ) -> Vec<InteractionRound> {
        let mut summaries = Vec::new();
        for round in 1..=rounds as usize {
            debug!(round, "starting peer-critique round");
            let peers = reviews.clone();
            let mut set = JoinSet::new();
            for (index, agent) in agents.iter().enumerate() {
                let agent = apply_overrides(agent.clone(), options);
                let system = PromptTemplate::review_system(&agent);
                let user = PromptTemplate::critique_user(
                    decision_name,
                    snapshot,
                    &snapshot.governance_checks,
                    &peers,
                    &agent.id,
                );
                let checks = snapshot.governance_checks.clone();
                let gateway = Arc::clone(&self.gateway);
                let observer = Arc::clone(&observer);
                let previous = peers.get(&agent.id).cloned();
                set.spawn(async move {
                    tokio::time::sleep(Duration::from_millis(STAGGER_MS * index as u64)).await;
                    let revised = revise_review(
                        gateway.as_ref(),
                        &agent,
                        system,
                        user,
                        &checks,
                        previous,
                        &*observer,
                    )
                    .await;
                    (agent.id, revised)
                });
            }
            for (id, review) in collect_reviews(set).await {
                reviews.insert(id, review);
            }

            let entries = reviews
                .values()
                .map(|r| RoundEntry {
                    agent: r.agent_id.clone(),
                    score: r.score,
                    blocked: r.blocked,
                })
                .collect();
            summaries.push(InteractionRound::new(round, entries));
        }
        summaries
    }
}

/// Apply run-level overrides on top of an agent profile, then normalize.
fn apply_overrides(mut agent: AgentProfile, options: &RunOptions) -> AgentProfile {
    if let Some(model) = &options.model_override {
        agent.model = model.clone();
    }
    if let Some(temperature) = options.temperature {
        agent.temperature = temperature;
    }
    if let Some(max_tokens) = options.max_tokens {
        agent.max_tokens = max_tokens;
    }
    agent.normalized()
}

async fn collect_reviews(
    mut set: JoinSet<(String, ReviewOutput)>,
) -> BTreeMap<String, ReviewOutput> {
    let mut reviews = BTreeMap::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((id, review)) => {
                reviews.insert(id, review);
            }
            Err(e) => warn!("review task panicked: {e}"),
        }
    }
    reviews
}

/// One agent's review: complete, extract, normalize. Every failure path
/// produces a blocked placeholder instead of an error.
async fn complete_review<G: ProviderGateway>(
    gateway: &G,
    agent: &AgentProfile,
    system: String,
    user: String,
    allowed_checks: &[String],
    observer: &dyn WorkflowObserver,
) -> ReviewOutput {
    observer.on_agent_start(&agent.id);
    let request = CompletionRequest::new(system, user, &agent.model)
        .with_sampling(agent.temperature, agent.max_tokens)
        .with_provider(agent.provider);

    let raw = match gateway.complete(&request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(agent = %agent.id, error = %e, "review request failed");
            observer.on_agent_failed(&agent.id, &e.to_string());
            return ReviewOutput::placeholder(&agent.id, format!("provider failure: {e}"));
        }
    };

    let review = match extract_json(&raw) {
        Some(value) => match normalize_review(&value, &agent.id, allowed_checks) {
            Ok(review) => review,
            Err(e) => {
                observer.on_agent_failed(&agent.id, &e.to_string());
                ReviewOutput::placeholder(&agent.id, format!("unusable review shape: {e}"))
            }
        },
        None => {
            observer.on_agent_failed(&agent.id, "no JSON object in response");
            ReviewOutput::placeholder(&agent.id, "response contained no JSON object")
        }
    };
    observer.on_agent_finish(&agent.id, review.score, review.blocked);
    review
}

/// A critique-round revision. Unlike the initial round, a failure keeps
/// the agent's previous verdict rather than degrading it to a placeholder.
async fn revise_review<G: ProviderGateway>(
    gateway: &G,
    agent: &AgentProfile,
    system: String,
    user: String,
    allowed_checks: &[String],
    previous: Option<ReviewOutput>,
    observer: &dyn WorkflowObserver,
) -> ReviewOutput {
    observer.on_agent_start(&agent.id);
    let request = CompletionRequest::new(system, user, &agent.model)
        .with_sampling(agent.temperature, agent.max_tokens)
        .with_provider(agent.provider);

    let revised = match gateway.complete(&request).await {
        Ok(raw) => extract_json(&raw)
            .and_then(|value| normalize_review(&value, &agent.id, allowed_checks).ok()),
        Err(e) => {
            warn!(agent = %agent.id, error = %e, "critique request failed");
            None
        }
    };

    let review = match (revised, previous) {
        (Some(revised), _) => revised,
        (None, Some(previous)) => {
            observer.on_agent_failed(&agent.id, "revision failed; keeping previous review");
            previous
        }
        (None, None) => {
            observer.on_agent_failed(&agent.id, "revision failed with no previous review");
            ReviewOutput::placeholder(&agent.id, "critique round produced no usable review")
        }
    };
    observer.on_agent_finish(&agent.id, review.score, review.blocked);
    review
}
