//! PRD artifact synthesis.
//!
//! Builds a requirements document from the decision narrative, the panel's
//! required changes and risks, and the chairperson synthesis. Only an
//! Approved gate generates a PRD. Deduplication is two-stage: exact
//! (case-insensitive key) then semantic (LCS similarity, see
//! [`similarity`]).

pub mod similarity;

use crate::workflow::state::WorkflowState;
use serde::{Deserialize, Serialize};
use similarity::{DEFAULT_THRESHOLD, normalize, similarity_ratio};

/// Known section headings, in document order. Section extraction locates
/// these in the body and takes the span up to the next known heading.
const KNOWN_HEADINGS: [&str; 10] = [
    "Problem Statement",
    "Context",
    "Objectives",
    "Scope",
    "Success Metrics",
    "Financial Analysis",
    "Risks",
    "Alternatives Considered",
    "Timeline",
    "Stakeholders",
];

/// Bare-label lines that carry no content
const DENY_PHRASES: [&str; 6] = ["n/a", "none", "tbd", "todo", "not applicable", "-"];

/// Cap on each requirement list after deduplication
const MAX_LIST_ENTRIES: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrdSection {
    pub heading: String,
    pub content: String,
}

/// The generated requirements artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrdArtifact {
    pub title: String,
    pub overview: String,
    pub requirements: Vec<String>,
    pub open_risks: Vec<String>,
    pub approval_conditions: Vec<String>,
    pub sections: Vec<PrdSection>,
    pub markdown: String,
}

/// Build the PRD artifact from a fully-reviewed workflow state.
pub fn build_prd(state: &WorkflowState) -> PrdArtifact {
    let sections = extract_sections(&state.snapshot.body);

    let overview = state
        .synthesis
        .as_ref()
        .map(|s| s.summary.clone())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("Requirements derived from decision \"{}\".", state.decision_name));

    let mut requirements: Vec<String> = Vec::new();
    for review in state.reviews.values() {
        requirements.extend(review.required_changes.iter().cloned());
    }
    if let Some(synthesis) = &state.synthesis {
        requirements.extend(synthesis.required_revisions.iter().cloned());
    }
    let requirements = dedupe_pipeline(requirements);

    let open_risks = dedupe_pipeline(
        state
            .reviews
            .values()
            .flat_map(|r| r.risks.iter())
            .map(|risk| format!("{} (severity {}): {}", risk.kind, risk.severity, risk.evidence))
            .collect(),
    );

    let approval_conditions = dedupe_pipeline(
        state
            .reviews
            .values()
            .flat_map(|r| r.approval_conditions.iter().cloned())
            .collect(),
    );

    let title = format!("PRD: {}", state.decision_name);
    let markdown = render_markdown(
        &title,
        &overview,
        &requirements,
        &open_risks,
        &approval_conditions,
        &sections,
    );

    PrdArtifact {
        title,
        overview,
        requirements,
        open_risks,
        approval_conditions,
        sections,
        markdown,
    }
}

/// Filter label-only lines, then exact dedupe, then semantic dedupe.
fn dedupe_pipeline(lines: Vec<String>) -> Vec<String> {
    let lines: Vec<String> = lines.into_iter().filter(|l| !is_label_only(l)).collect();
    let lines = dedupe_exact(lines, MAX_LIST_ENTRIES);
    dedupe_semantic(lines, DEFAULT_THRESHOLD)
}

/// Locate known headings in the body; a heading line may be prefixed with
/// `#` markers and suffixed with a colon. Matching is case-insensitive.
pub fn extract_sections(body: &str) -> Vec<PrdSection> {
    let mut sections: Vec<PrdSection> = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in body.lines() {
        let stripped = line
            .trim()
            .trim_start_matches(['#', '*', ' '])
            .trim_end_matches(':')
            .trim();
        let heading = KNOWN_HEADINGS
            .iter()
            .find(|h| h.eq_ignore_ascii_case(stripped));
        if let Some(heading) = heading {
            if let Some((h, content)) = current.take() {
                sections.push(PrdSection {
                    heading: h,
                    content: content.trim().to_string(),
                });
            }
            current = Some((heading.to_string(), String::new()));
            continue;
        }
        if let Some((_, content)) = current.as_mut() {
            content.push_str(line);
            content.push('\n');
        }
    }
    if let Some((h, content)) = current.take() {
        sections.push(PrdSection {
            heading: h,
            content: content.trim().to_string(),
        });
    }
    sections
}

/// A line that is only a label or filler, not content.
fn is_label_only(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.chars().count() < 4 {
        return true;
    }
    if DENY_PHRASES.contains(&trimmed.to_lowercase().as_str()) {
        return true;
    }
    // Bare field names: short line ending in a colon
    trimmed.ends_with(':') && trimmed.split_whitespace().count() <= 3
}

/// Exact dedupe: case-insensitive key match, stable order, capped length.
pub fn dedupe_exact(lines: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for line in lines {
        let key = line.trim().to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(line.trim().to_string());
        if out.len() == cap {
            break;
        }
    }
    out
}

/// Semantic dedupe: drop lines whose normalized similarity to an already
/// kept line reaches `threshold`.
pub fn dedupe_semantic(lines: Vec<String>, threshold: f64) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    let mut kept_normalized: Vec<String> = Vec::new();
    for line in lines {
        let normalized = normalize(&line);
        let duplicate = kept_normalized
            .iter()
            .any(|k| similarity_ratio(k, &normalized) >= threshold);
        if !duplicate {
            kept.push(line);
            kept_normalized.push(normalized);
        }
    }
    kept
}

fn render_markdown(
    title: &str,
    overview: &str,
    requirements: &[String],
    open_risks: &[String],
    approval_conditions: &[String],
    sections: &[PrdSection],
) -> String {
    let mut doc = String::new();
    doc.push_str(&format!("# {}\n\n## Overview\n\n{}\n", title, overview));

    let lists: [(&str, &[String]); 3] = [
        ("Requirements", requirements),
        ("Open Risks", open_risks),
        ("Approval Conditions", approval_conditions),
    ];
    for (heading, entries) in lists {
        if entries.is_empty() {
            continue;
        }
        doc.push_str(&format!("\n## {}\n\n", heading));
        for entry in entries {
            doc.push_str(&format!("- {}\n", entry));
        }
    }

    for section in sections {
        if section.content.is_empty() {
            continue;
        }
        doc.push_str(&format!("\n## Source: {}\n\n{}\n", section.heading, section.content));
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::output::{ReviewOutput, Risk};
    use crate::workflow::state::{DecisionSnapshot, GateDecision, Synthesis, WorkflowState};

    #[test]
    fn test_semantic_dedupe_collapses_near_duplicates() {
        let lines = vec![
            "Build X for region A.".to_string(),
            "Build X for region A".to_string(),
            "Other line".to_string(),
        ];
        let deduped = dedupe_semantic(lines, 0.86);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0], "Build X for region A.");
        assert_eq!(deduped[1], "Other line");
    }

    #[test]
    fn test_exact_dedupe_stable_and_capped() {
        let lines = vec![
            "Alpha".to_string(),
            "  alpha ".to_string(),
            "Beta".to_string(),
            "Gamma".to_string(),
        ];
        let deduped = dedupe_exact(lines, 2);
        assert_eq!(deduped, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_label_only_lines_filtered() {
        assert!(is_label_only("TBD"));
        assert!(is_label_only("n/a"));
        assert!(is_label_only("Owner:"));
        assert!(is_label_only("Success Metrics:"));
        assert!(!is_label_only("Owner: the platform team"));
        assert!(!is_label_only("Ship the rollout plan to all region leads"));
    }

    #[test]
    fn test_extract_sections_spans() {
        let body = "\
# Problem Statement\n\
Churn is rising in the mid-market segment.\n\
\n\
## Objectives\n\
Reduce churn by 20%.\n\
Random trailing text under objectives.\n\
\n\
Unknown Heading\n\
This stays inside objectives.\n\
\n\
Risks:\n\
Execution depends on two external vendors.\n";
        let sections = extract_sections(body);
        let headings: Vec<_> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["Problem Statement", "Objectives", "Risks"]);
        assert!(sections[1].content.contains("This stays inside objectives."));
        assert!(sections[2].content.contains("external vendors"));
    }

    #[test]
    fn test_build_prd_aggregates_and_dedupes() {
        let mut state = WorkflowState::new(
            "d-1",
            "EMEA expansion",
            DecisionSnapshot::new("# Problem Statement\nChurn is rising.\n"),
        );

        let mut cfo = ReviewOutput::placeholder("cfo", "x");
        cfo.blocked = false;
        cfo.required_changes = vec![
            "Add a sensitivity analysis to the financial model".to_string(),
            "TBD".to_string(),
        ];
        cfo.risks = vec![Risk {
            kind: "financial".to_string(),
            severity: 6,
            evidence: "FX exposure is unhedged".to_string(),
        }];
        state.put_review(cfo);

        let mut cto = ReviewOutput::placeholder("cto", "x");
        cto.blocked = false;
        cto.required_changes =
            vec!["Add sensitivity analysis to financial model".to_string()];
        state.put_review(cto);

        state.synthesis = Some(Synthesis {
            recommendation: GateDecision::Approved,
            summary: "Proceed with a staged rollout.".to_string(),
            required_revisions: Vec::new(),
            chairperson_model: "claude-sonnet-4-5".to_string(),
        });

        let prd = build_prd(&state);
        assert_eq!(prd.title, "PRD: EMEA expansion");
        assert_eq!(prd.overview, "Proceed with a staged rollout.");
        // The two near-identical requirements collapse to one; TBD is filtered
        assert_eq!(prd.requirements.len(), 1);
        assert_eq!(prd.open_risks.len(), 1);
        assert!(prd.markdown.contains("# PRD: EMEA expansion"));
        assert!(prd.markdown.contains("## Source: Problem Statement"));
    }
}
