//! Workflow state threaded through the decision pipeline
//!
//! [`WorkflowState`] is the single mutable-by-replacement record the
//! lifecycle owns. Every stage either reads it (pure stages) or replaces
//! fields on it (effectful stages). Nothing outside the lifecycle mutates it.

use crate::core::error::DomainError;
use crate::evidence::EvidenceVerification;
use crate::hygiene::HygieneFinding;
use crate::prd::PrdArtifact;
use crate::review::output::ReviewOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Point-in-time view of a decision under review.
///
/// `properties` is the structured metadata bag (investment, ROI, KPIs...),
/// `body` the free-text narrative, `governance_checks` the names of the
/// governance checkboxes already ticked on the decision record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionSnapshot {
    pub properties: BTreeMap<String, Value>,
    pub body: String,
    pub governance_checks: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl DecisionSnapshot {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_governance_checks(mut self, checks: Vec<String>) -> Self {
        self.governance_checks = checks;
        self
    }

    /// Look up a string property under any of the given keys.
    pub fn prop_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|k| self.properties.get(*k))
            .and_then(|v| v.as_str())
    }

    /// Look up a numeric property under any of the given keys.
    ///
    /// Accepts JSON numbers and numeric strings ("250000", "2.5").
    pub fn prop_f64(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| match self.properties.get(*k) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
            _ => None,
        })
    }
}

/// Lifecycle status of a workflow run.
///
/// Transitions are sequential and one-directional:
/// `Proposed → Reviewing → Synthesized → Decided → Persisted`.
/// `Decided` is only reached on an Approved gate; a Challenged or Blocked
/// run persists from `Synthesized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Proposed,
    Reviewing,
    Synthesized,
    Decided,
    Persisted,
}

impl WorkflowStatus {
    fn ordinal(&self) -> u8 {
        match self {
            WorkflowStatus::Proposed => 0,
            WorkflowStatus::Reviewing => 1,
            WorkflowStatus::Synthesized => 2,
            WorkflowStatus::Decided => 3,
            WorkflowStatus::Persisted => 4,
        }
    }

    /// Whether a transition to `next` is allowed (forward-only, never back).
    pub fn can_advance_to(&self, next: WorkflowStatus) -> bool {
        next.ordinal() > self.ordinal()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Persisted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Proposed => "proposed",
            WorkflowStatus::Reviewing => "reviewing",
            WorkflowStatus::Synthesized => "synthesized",
            WorkflowStatus::Decided => "decided",
            WorkflowStatus::Persisted => "persisted",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of the gate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateDecision {
    Approved,
    Challenged,
    Blocked,
}

impl GateDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, GateDecision::Approved)
    }
}

impl std::fmt::Display for GateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateDecision::Approved => write!(f, "Approved"),
            GateDecision::Challenged => write!(f, "Challenged"),
            GateDecision::Blocked => write!(f, "Blocked"),
        }
    }
}

/// Per-agent entry in an interaction round summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundEntry {
    pub agent: String,
    pub score: i64,
    pub blocked: bool,
}

/// Summary of one peer-critique round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRound {
    /// Round number (1-indexed)
    pub round: usize,
    pub entries: Vec<RoundEntry>,
    /// Timestamp of this round (milliseconds since epoch)
    pub timestamp: u64,
}

impl InteractionRound {
    pub fn new(round: usize, entries: Vec<RoundEntry>) -> Self {
        Self {
            round,
            entries,
            timestamp: current_timestamp(),
        }
    }

    pub fn blocked_count(&self) -> usize {
        self.entries.iter().filter(|e| e.blocked).count()
    }
}

/// Chairperson synthesis verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synthesis {
    pub recommendation: GateDecision,
    pub summary: String,
    pub required_revisions: Vec<String>,
    /// Model that produced the synthesis
    pub chairperson_model: String,
}

/// The single record threaded through the decision pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub decision_id: String,
    pub decision_name: String,
    pub snapshot: DecisionSnapshot,
    /// Agent id → latest review. Later rounds overwrite earlier entries.
    pub reviews: BTreeMap<String, ReviewOutput>,
    pub status: WorkflowStatus,
    pub gate: Option<GateDecision>,
    pub dqs: f64,
    pub substance_score: f64,
    pub confidence_score: f64,
    pub dissent_penalty: f64,
    pub confidence_penalty: f64,
    pub hygiene_score: f64,
    pub hygiene_findings: Vec<HygieneFinding>,
    pub interaction_rounds: Vec<InteractionRound>,
    pub synthesis: Option<Synthesis>,
    pub prd: Option<PrdArtifact>,
    pub evidence: Option<EvidenceVerification>,
    pub missing_sections: Vec<String>,
}

impl WorkflowState {
    pub fn new(
        decision_id: impl Into<String>,
        decision_name: impl Into<String>,
        snapshot: DecisionSnapshot,
    ) -> Self {
        Self {
            decision_id: decision_id.into(),
            decision_name: decision_name.into(),
            snapshot,
            reviews: BTreeMap::new(),
            status: WorkflowStatus::Proposed,
            gate: None,
            dqs: 0.0,
            substance_score: 0.0,
            confidence_score: 0.0,
            dissent_penalty: 0.0,
            confidence_penalty: 0.0,
            hygiene_score: 0.0,
            hygiene_findings: Vec::new(),
            interaction_rounds: Vec::new(),
            synthesis: None,
            prd: None,
            evidence: None,
            missing_sections: Vec::new(),
        }
    }

    /// Advance the lifecycle status. Backward moves are a domain error.
    pub fn advance_to(&mut self, next: WorkflowStatus) -> Result<(), DomainError> {
        if !self.status.can_advance_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Store a review, overwriting any earlier round's entry for the agent.
    pub fn put_review(&mut self, review: ReviewOutput) {
        self.reviews.insert(review.agent_id.clone(), review);
    }

    pub fn any_blocked(&self) -> bool {
        self.reviews.values().any(|r| r.blocked)
    }

    /// Invariant check: review keys must be a subset of the configured panel.
    pub fn reviews_within_panel(&self, agent_ids: &[String]) -> bool {
        self.reviews.keys().all(|id| agent_ids.contains(id))
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
