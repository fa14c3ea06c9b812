//! Evidence sufficiency verification.
//!
//! Pure function over the review set: does each agent back its verdict with
//! enough substance? A thin thesis, risks without evidence, a block without
//! blockers, or a citation-requiring disposition with no citations all
//! flag the agent, and any flagged agent makes the whole run insufficient.

use crate::agent::profile::AgentDiscipline;
use crate::review::output::ReviewOutput;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum thesis length in characters
const MIN_THESIS_LEN: usize = 24;
/// Minimum per-risk evidence length in characters
const MIN_RISK_EVIDENCE_LEN: usize = 12;
/// Cap on the flattened required-actions list
const MAX_REQUIRED_ACTIONS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceVerdict {
    Sufficient,
    Insufficient,
}

impl EvidenceVerdict {
    pub fn is_sufficient(&self) -> bool {
        matches!(self, EvidenceVerdict::Sufficient)
    }
}

/// Per-agent sufficiency result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvidence {
    pub verdict: EvidenceVerdict,
    pub citation_count: usize,
    pub risk_evidence_count: usize,
    /// Ordered, human-readable gap descriptions
    pub gaps: Vec<String>,
}

/// Run-level verdict: insufficient if any agent is insufficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceVerification {
    pub verdict: EvidenceVerdict,
    pub agents: BTreeMap<String, AgentEvidence>,
    /// Flattened per-agent gaps prefixed with the agent name, capped at 8
    pub required_actions: Vec<String>,
}

/// Verify evidence sufficiency across the panel.
///
/// `research_enabled` makes citations mandatory for every agent.
pub fn verify_evidence(
    reviews: &BTreeMap<String, ReviewOutput>,
    research_enabled: bool,
) -> EvidenceVerification {
    let mut agents = BTreeMap::new();
    let mut required_actions = Vec::new();

    for (agent_id, review) in reviews {
        let evidence = verify_agent(review, research_enabled);
        for gap in &evidence.gaps {
            if required_actions.len() < MAX_REQUIRED_ACTIONS {
                required_actions.push(format!("{}: {}", agent_id, gap));
            }
        }
        agents.insert(agent_id.clone(), evidence);
    }

    let verdict = if agents.values().all(|a| a.verdict.is_sufficient()) {
        EvidenceVerdict::Sufficient
    } else {
        EvidenceVerdict::Insufficient
    };

    EvidenceVerification {
        verdict,
        agents,
        required_actions,
    }
}

fn verify_agent(review: &ReviewOutput, research_enabled: bool) -> AgentEvidence {
    let mut gaps = Vec::new();

    if review.thesis.chars().count() < MIN_THESIS_LEN {
        gaps.push("thesis is too short to substantiate the verdict".to_string());
    }

    let weak_risks: Vec<&str> = review
        .risks
        .iter()
        .filter(|r| r.evidence.chars().count() < MIN_RISK_EVIDENCE_LEN)
        .map(|r| r.kind.as_str())
        .collect();
    if !weak_risks.is_empty() {
        gaps.push(format!(
            "risks listed without supporting evidence: {}",
            weak_risks.join(", ")
        ));
    }

    if review.blocked && review.blockers.is_empty() {
        gaps.push("review blocks the decision without naming blockers".to_string());
    }

    let risk_weighted = AgentDiscipline::infer(&review.agent_id).is_risk_weighted();
    let citation_required = research_enabled
        || !review.risks.is_empty()
        || review.blocked
        || (risk_weighted && !review.required_changes.is_empty());
    if citation_required && review.citations.is_empty() {
        gaps.push("no citations back the claims made".to_string());
    }

    let risk_evidence_count = review
        .risks
        .iter()
        .filter(|r| r.evidence.chars().count() >= MIN_RISK_EVIDENCE_LEN)
        .count();

    AgentEvidence {
        verdict: if gaps.is_empty() {
            EvidenceVerdict::Sufficient
        } else {
            EvidenceVerdict::Insufficient
        },
        citation_count: review.citations.len(),
        risk_evidence_count,
        gaps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::output::{Citation, Risk};

    fn solid_review(agent_id: &str) -> ReviewOutput {
        let mut r = ReviewOutput::placeholder(agent_id, "seed");
        r.thesis = "A well-grounded assessment of the expansion plan.".to_string();
        r.score = 8;
        r.confidence = 0.8;
        r.blocked = false;
        r.blockers.clear();
        r
    }

    #[test]
    fn test_clean_panel_is_sufficient() {
        let mut reviews = BTreeMap::new();
        reviews.insert("ceo".to_string(), solid_review("ceo"));
        reviews.insert("cfo".to_string(), solid_review("cfo"));

        let result = verify_evidence(&reviews, false);
        assert_eq!(result.verdict, EvidenceVerdict::Sufficient);
        assert!(result.required_actions.is_empty());
    }

    #[test]
    fn test_short_thesis_flags_agent() {
        let mut review = solid_review("ceo");
        review.thesis = "Looks fine.".to_string();
        let mut reviews = BTreeMap::new();
        reviews.insert("ceo".to_string(), review);

        let result = verify_evidence(&reviews, false);
        assert_eq!(result.verdict, EvidenceVerdict::Insufficient);
        assert!(result.required_actions[0].starts_with("ceo: "));
    }

    #[test]
    fn test_risk_without_evidence_flags_agent() {
        let mut review = solid_review("cto");
        review.risks.push(Risk {
            kind: "delivery".to_string(),
            severity: 6,
            evidence: "vague".to_string(),
        });
        // The risk also makes citations mandatory
        review.citations.push(Citation {
            url: "https://example.com/report".to_string(),
            title: "Delivery benchmarks".to_string(),
            claim: "Median slip is 40%".to_string(),
        });
        let mut reviews = BTreeMap::new();
        reviews.insert("cto".to_string(), review);

        let result = verify_evidence(&reviews, false);
        assert_eq!(result.verdict, EvidenceVerdict::Insufficient);
        assert_eq!(result.agents["cto"].risk_evidence_count, 0);
    }

    #[test]
    fn test_block_without_blockers_flags_agent() {
        let mut review = solid_review("compliance");
        review.blocked = true;
        review.citations.push(Citation {
            url: "https://example.com/reg".to_string(),
            title: String::new(),
            claim: String::new(),
        });
        let mut reviews = BTreeMap::new();
        reviews.insert("compliance".to_string(), review);

        let result = verify_evidence(&reviews, false);
        assert_eq!(result.verdict, EvidenceVerdict::Insufficient);
        assert!(
            result.agents["compliance"]
                .gaps
                .iter()
                .any(|g| g.contains("without naming blockers"))
        );
    }

    #[test]
    fn test_research_mode_requires_citations_everywhere() {
        let mut reviews = BTreeMap::new();
        reviews.insert("ceo".to_string(), solid_review("ceo"));

        assert_eq!(verify_evidence(&reviews, false).verdict, EvidenceVerdict::Sufficient);
        assert_eq!(
            verify_evidence(&reviews, true).verdict,
            EvidenceVerdict::Insufficient
        );
    }

    #[test]
    fn test_risk_weighted_required_changes_need_citations() {
        let mut cfo = solid_review("cfo");
        cfo.required_changes.push("Re-run the cost model".to_string());
        let mut ceo = solid_review("ceo");
        ceo.required_changes.push("Tighten the narrative".to_string());

        let mut reviews = BTreeMap::new();
        reviews.insert("cfo".to_string(), cfo);
        reviews.insert("ceo".to_string(), ceo);

        let result = verify_evidence(&reviews, false);
        // Only the risk-weighted CFO is held to the citation requirement
        assert_eq!(result.agents["cfo"].verdict, EvidenceVerdict::Insufficient);
        assert_eq!(result.agents["ceo"].verdict, EvidenceVerdict::Sufficient);
    }

    #[test]
    fn test_required_actions_capped() {
        let mut reviews = BTreeMap::new();
        for i in 0..6 {
            let mut review = solid_review(&format!("agent-{i}"));
            review.thesis = "thin".to_string();
            review.blocked = true;
            review.blockers.clear();
            reviews.insert(review.agent_id.clone(), review);
        }
        let result = verify_evidence(&reviews, false);
        assert_eq!(result.required_actions.len(), 8);
    }
}
