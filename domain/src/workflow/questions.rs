//! Open-question projection.
//!
//! A derived view, never persisted: recompute the outstanding questions
//! from whatever is currently on the workflow state. The lifecycle
//! re-invokes this after every stage that changes the relevant fields.

use crate::hygiene::CheckStatus;
use crate::workflow::state::WorkflowState;

/// Project the ordered list of open questions for a decision run.
pub fn open_questions(state: &WorkflowState) -> Vec<String> {
    let mut questions = Vec::new();

    for section in &state.missing_sections {
        questions.push(format!(
            "Provide the missing \"{}\" section before resubmission.",
            section
        ));
    }

    for finding in &state.hygiene_findings {
        if finding.status == CheckStatus::Fail {
            questions.push(format!("Reconcile {}: {}", finding.check, finding.detail));
        }
    }

    for (agent_id, review) in &state.reviews {
        for blocker in &review.blockers {
            questions.push(format!("Resolve {}'s blocker: {}", agent_id, blocker));
        }
        if !review.blocked && review.confidence < 0.6 {
            questions.push(format!(
                "Clarify the inputs behind {}'s low-confidence verdict.",
                agent_id
            ));
        }
    }

    if let Some(evidence) = &state.evidence {
        for action in &evidence.required_actions {
            questions.push(format!("Supply evidence: {}", action));
        }
    }

    // Stable exact dedupe; repeated stages must not multiply questions
    let mut seen = Vec::new();
    questions.retain(|q| {
        let key = q.to_lowercase();
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
    questions
}
