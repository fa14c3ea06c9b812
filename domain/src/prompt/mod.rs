//! Prompt templates for reviewer agents and the chairperson.
//!
//! Pure string builders; the application layer fills them from the
//! workflow state and sends them through the provider gateway.

use crate::agent::profile::AgentProfile;
use crate::review::output::ReviewOutput;
use crate::workflow::state::DecisionSnapshot;
use std::collections::BTreeMap;

pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for a reviewer agent.
    pub fn review_system(profile: &AgentProfile) -> String {
        format!(
            "You are the {role} on a decision review council. Your mandate: {focus}.\n\
             Judge the proposal strictly from that mandate. Respond with a single JSON \
             object and nothing else, using these fields:\n\
             {{\"agent\": string, \"thesis\": string, \"score\": 1-10, \
             \"confidence\": 0.0-1.0, \"blocked\": bool, \"blockers\": [string], \
             \"required_changes\": [string], \"approval_conditions\": [string], \
             \"risks\": [{{\"type\": string, \"severity\": 1-10, \"evidence\": string}}], \
             \"citations\": [{{\"url\": string, \"title\": string, \"claim\": string}}], \
             \"governance_checks_met\": {{string: bool}}}}\n\
             Only set \"blocked\" for issues that must stop the decision outright.",
            role = profile.role,
            focus = profile.focus,
        )
    }

    /// User prompt for a first-pass review.
    pub fn review_user(
        decision_name: &str,
        snapshot: &DecisionSnapshot,
        allowed_checks: &[String],
        research_notes: Option<&str>,
    ) -> String {
        let mut prompt = format!(
            "Decision under review: {}\n\nProperties:\n{}\n\nDocument:\n{}\n",
            decision_name,
            serde_json::to_string_pretty(&snapshot.properties).unwrap_or_default(),
            snapshot.body,
        );
        if !allowed_checks.is_empty() {
            prompt.push_str(&format!(
                "\nGovernance checks to assess (use exactly these keys in \
                 governance_checks_met): {}\n",
                allowed_checks.join(", ")
            ));
        }
        if let Some(notes) = research_notes {
            prompt.push_str(&format!("\nExternal research notes:\n{}\n", notes));
        }
        prompt
    }

    /// User prompt for a peer-critique round: same decision, plus the
    /// previous round's full panel verdicts.
    pub fn critique_user(
        decision_name: &str,
        snapshot: &DecisionSnapshot,
        allowed_checks: &[String],
        peers: &BTreeMap<String, ReviewOutput>,
        own_id: &str,
    ) -> String {
        let mut prompt = Self::review_user(decision_name, snapshot, allowed_checks, None);
        prompt.push_str("\nYour fellow reviewers concluded:\n");
        for (agent_id, review) in peers {
            if agent_id == own_id {
                continue;
            }
            prompt.push_str(&format!(
                "- {} scored {}/10 ({}): {}\n",
                agent_id,
                review.score,
                if review.blocked { "BLOCKED" } else { "not blocked" },
                review.thesis,
            ));
        }
        prompt.push_str(
            "\nRe-issue your review in the same JSON shape, revising your position \
             only where a peer raised something you missed.",
        );
        prompt
    }

    /// System prompt for the chairperson synthesis.
    pub fn synthesis_system() -> &'static str {
        "You chair a decision review council. Synthesize the panel's verdicts into a \
         final recommendation. Respond with a single JSON object: \
         {\"recommendation\": \"approved\"|\"challenged\"|\"blocked\", \
         \"summary\": string, \"required_revisions\": [string]}. \
         Be specific in required_revisions; never override a reviewer's hard block."
    }

    /// User prompt for the chairperson synthesis.
    pub fn synthesis_user(decision_name: &str, reviews: &BTreeMap<String, ReviewOutput>) -> String {
        let mut prompt = format!("Decision: {}\n\nPanel verdicts:\n", decision_name);
        for (agent_id, review) in reviews {
            prompt.push_str(&format!(
                "## {} (score {}/10, confidence {:.2}{})\n{}\n",
                agent_id,
                review.score,
                review.confidence,
                if review.blocked { ", BLOCKED" } else { "" },
                review.thesis,
            ));
            for blocker in &review.blockers {
                prompt.push_str(&format!("- blocker: {}\n", blocker));
            }
            for change in &review.required_changes {
                prompt.push_str(&format!("- required change: {}\n", change));
            }
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_system_carries_role_and_shape() {
        let profile = &AgentProfile::core_panel()[1];
        let prompt = PromptTemplate::review_system(profile);
        assert!(prompt.contains("Chief Financial Officer"));
        assert!(prompt.contains("\"score\": 1-10"));
    }

    #[test]
    fn test_critique_user_excludes_own_review() {
        let snapshot = DecisionSnapshot::new("body");
        let mut peers = BTreeMap::new();
        let mut ceo = ReviewOutput::placeholder("ceo", "x");
        ceo.thesis = "Strong strategic fit".to_string();
        peers.insert("ceo".to_string(), ceo);
        peers.insert("cfo".to_string(), ReviewOutput::placeholder("cfo", "x"));

        let prompt = PromptTemplate::critique_user("D", &snapshot, &[], &peers, "cfo");
        assert!(prompt.contains("Strong strategic fit"));
        assert!(!prompt.contains("- cfo scored"));
    }
}
