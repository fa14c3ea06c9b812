//! Gate rules.
//!
//! The gate turns a fully-scored workflow state into Approved / Challenged /
//! Blocked. Rules are evaluated in a fixed order and the first match wins;
//! the order is part of the contract (a block always dominates, quality
//! shortfalls challenge rather than block).

use crate::agent::profile::AgentDiscipline;
use crate::review::output::ReviewOutput;
use crate::workflow::state::{GateDecision, Synthesis, WorkflowState};
use std::collections::BTreeMap;

const HYGIENE_FLOOR: f64 = 6.5;
const CONFIDENCE_FLOOR: f64 = 0.6;
const DISSENT_CEILING: f64 = 2.5;
const DQS_FLOOR: f64 = 7.0;

/// Evaluate the gate. Requires reviews, scoring, hygiene and evidence to be
/// populated on the state; checked in this exact order, first match wins.
pub fn decide_gate(state: &WorkflowState) -> GateDecision {
    // 1. Any hard block from any reviewer
    if state.any_blocked() {
        return GateDecision::Blocked;
    }
    // 2. Document hygiene below the floor
    if state.hygiene_score < HYGIENE_FLOOR {
        return GateDecision::Challenged;
    }
    // 3. Panel-wide or risk-weighted individual confidence below the floor
    let risk_confidence_low = state.reviews.iter().any(|(id, r)| {
        AgentDiscipline::infer(id).is_risk_weighted() && r.confidence < CONFIDENCE_FLOOR
    });
    if state.confidence_score < CONFIDENCE_FLOOR || risk_confidence_low {
        return GateDecision::Challenged;
    }
    // 4. Accumulated dissent
    if state.dissent_penalty >= DISSENT_CEILING {
        return GateDecision::Challenged;
    }
    // 5. Insufficient evidence
    if let Some(evidence) = &state.evidence
        && !evidence.verdict.is_sufficient()
    {
        return GateDecision::Challenged;
    }
    // 6. Composite quality below the bar
    if state.dqs < DQS_FLOOR {
        return GateDecision::Challenged;
    }
    GateDecision::Approved
}

/// Post-hoc guardrails over the chairperson synthesis.
///
/// The synthesis model's recommendation is advisory; a hard block from
/// compliance or the CFO forces the final recommendation to Blocked. Each
/// guardrail that fires appends a specific required-revision line instead
/// of silently overriding.
pub fn apply_synthesis_guardrails(
    synthesis: &mut Synthesis,
    reviews: &BTreeMap<String, ReviewOutput>,
) {
    for veto_holder in ["compliance", "cfo"] {
        if let Some(review) = reviews.get(veto_holder)
            && review.blocked
        {
            synthesis.recommendation = GateDecision::Blocked;
            synthesis.required_revisions.push(format!(
                "{} issued a hard block; resolve their blockers before resubmitting: {}",
                veto_holder,
                review.blockers.join("; ")
            ));
        }
    }
}
