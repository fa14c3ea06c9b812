//! Normalized review verdict from one agent
//!
//! A [`ReviewOutput`] is produced once per agent per round and is immutable
//! once stored on the workflow state. Construction goes through the
//! normalizer ([`crate::review::normalize`]) or the placeholder constructor;
//! both guarantee the clamping invariants (`score` 1..=10, `confidence`
//! 0..=1, risk `severity` 1..=10).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum citations retained per review
pub const MAX_CITATIONS: usize = 8;

/// A risk the agent identified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub kind: String,
    /// 1 (minor) ..= 10 (existential)
    pub severity: i64,
    pub evidence: String,
}

/// A supporting citation. `url` is always `http(s)://`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
    pub claim: String,
}

/// The normalized verdict from one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutput {
    /// Agent slug this review belongs to
    pub agent_id: String,
    /// Display name as reported by the model (may differ from the slug)
    pub agent: String,
    pub thesis: String,
    /// 1..=10
    pub score: i64,
    /// 0.0..=1.0
    pub confidence: f64,
    pub blocked: bool,
    pub blockers: Vec<String>,
    pub required_changes: Vec<String>,
    pub approval_conditions: Vec<String>,
    pub risks: Vec<Risk>,
    pub citations: Vec<Citation>,
    /// Restricted to the caller-supplied allow-list of check names
    pub governance_checks_met: BTreeMap<String, bool>,
}

impl ReviewOutput {
    /// Clearly-marked degraded review used when an agent's output was
    /// unusable. The run must never stall because one agent failed.
    pub fn placeholder(agent_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        Self {
            agent: agent_id.clone(),
            agent_id,
            thesis: "Review unavailable: agent output could not be used".to_string(),
            score: 1,
            confidence: 0.0,
            blocked: true,
            blockers: vec![format!("Agent review failed: {}", reason.into())],
            required_changes: Vec::new(),
            approval_conditions: Vec::new(),
            risks: Vec::new(),
            citations: Vec::new(),
            governance_checks_met: BTreeMap::new(),
        }
    }

    /// Whether this is a clean approval (no block, solid score, confident).
    pub fn is_clean_approval(&self) -> bool {
        !self.blocked && self.score >= 7 && self.confidence >= 0.6
    }

    /// Score shortfall below the approval bar, if any.
    pub fn score_deficit(&self) -> f64 {
        (7.0 - self.score as f64).max(0.0)
    }
}
