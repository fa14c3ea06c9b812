//! Document hygiene evaluation.
//!
//! Pure function over a decision snapshot: internal-consistency checks of
//! the document's quantitative and metadata claims, independent of any
//! reviewer judgment. Starts at 10.0 and subtracts a fixed penalty per
//! finding; checks are independent and additive, the final score is clamped
//! to [0, 10].
//!
//! The thresholds below are part of the contract: identical input must
//! produce identical scores across versions, since gate decisions and
//! golden tests depend on them.

pub mod money;

use crate::workflow::state::DecisionSnapshot;
use money::{TableMoney, extract_table_money, find_labeled_money, find_labeled_percent};
use serde::{Deserialize, Serialize};

// ==================== Penalty Table ====================

const MISSING_SECTION_EACH: f64 = 0.5;
const MISSING_SECTION_CAP: f64 = 4.0;
const ROI_DIVERGENCE: f64 = 1.2;
const ROI_INPUTS_ABSENT: f64 = 0.8;
const TABLE_MARKET_EXCEEDED: f64 = 2.4;
const TABLE_PARTIAL: f64 = 0.6;
const NARRATIVE_MARKET_EXCEEDED: f64 = 2.0;
const NARRATIVE_ABSENT: f64 = 0.6;
const KPI_ABSENT: f64 = 0.4;
const OBJECTIVE_ABSENT: f64 = 0.5;
const HORIZON_ABSENT: f64 = 0.6;
const REVERSIBILITY_CONFLICT: f64 = 1.0;
const REVERSIBILITY_UNMENTIONED: f64 = 0.4;
const TARGET_NOT_ABOVE_BASELINE: f64 = 1.2;
const PROBABILITY_OUT_OF_RANGE: f64 = 0.8;
const PROBABILITY_MISMATCH: f64 = 1.0;

/// Revenue may exceed market size by at most 5%
const MARKET_TOLERANCE: f64 = 1.05;
/// Metadata vs document probability may differ by at most 20 points
const PROBABILITY_TOLERANCE: f64 = 20.0;
/// Free-text money/percent proximity window, in characters
const PROXIMITY_WINDOW: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

/// One hygiene check outcome. Findings are ordered and not deduplicated;
/// each contributes independently to the summed score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HygieneFinding {
    pub check: String,
    pub status: CheckStatus,
    pub detail: String,
    pub score_impact: f64,
}

impl HygieneFinding {
    fn pass(check: &str, detail: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            status: CheckStatus::Pass,
            detail: detail.into(),
            score_impact: 0.0,
        }
    }

    fn warning(check: &str, detail: impl Into<String>, impact: f64) -> Self {
        Self {
            check: check.to_string(),
            status: CheckStatus::Warning,
            detail: detail.into(),
            score_impact: impact,
        }
    }

    fn fail(check: &str, detail: impl Into<String>, impact: f64) -> Self {
        Self {
            check: check.to_string(),
            status: CheckStatus::Fail,
            detail: detail.into(),
            score_impact: impact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HygieneReport {
    /// [0, 10]
    pub score: f64,
    pub findings: Vec<HygieneFinding>,
}

/// Evaluate document hygiene for a decision snapshot.
pub fn evaluate_hygiene(snapshot: &DecisionSnapshot, missing_sections: &[String]) -> HygieneReport {
    let mut findings = Vec::new();
    let body_lower = snapshot.body.to_lowercase();

    check_required_artifacts(missing_sections, &mut findings);
    check_roi_consistency(snapshot, &mut findings);
    let table = check_table_market(snapshot, &mut findings);
    check_narrative_market(snapshot, &table, &mut findings);
    check_metadata_presence(snapshot, &body_lower, &mut findings);
    check_reversibility(snapshot, &body_lower, &mut findings);
    check_baseline_target(snapshot, &mut findings);
    check_probability(snapshot, &body_lower, &mut findings);

    let total: f64 = findings.iter().map(|f| f.score_impact).sum();
    HygieneReport {
        score: (10.0 - total).clamp(0.0, 10.0),
        findings,
    }
}

fn check_required_artifacts(missing_sections: &[String], findings: &mut Vec<HygieneFinding>) {
    if missing_sections.is_empty() {
        findings.push(HygieneFinding::pass(
            "required_artifacts",
            "All required sections present",
        ));
        return;
    }
    let penalty = (MISSING_SECTION_EACH * missing_sections.len() as f64).min(MISSING_SECTION_CAP);
    findings.push(HygieneFinding::fail(
        "required_artifacts",
        format!("Missing required sections: {}", missing_sections.join(", ")),
        penalty,
    ));
}

fn check_roi_consistency(snapshot: &DecisionSnapshot, findings: &mut Vec<HygieneFinding>) {
    let investment = snapshot.prop_f64(&["investment_required", "investment", "capex"]);
    let benefit = snapshot.prop_f64(&[
        "benefit_12m",
        "twelve_month_benefit",
        "annual_benefit",
        "benefit",
    ]);
    let stated = snapshot.prop_f64(&["stated_roi", "roi", "expected_roi"]);

    let (Some(investment), Some(benefit), Some(stated)) = (investment, benefit, stated) else {
        findings.push(HygieneFinding::warning(
            "roi_consistency",
            "Investment, 12-month benefit or stated ROI not provided; cannot cross-check",
            ROI_INPUTS_ABSENT,
        ));
        return;
    };
    if investment <= 0.0 {
        findings.push(HygieneFinding::warning(
            "roi_consistency",
            "Investment is zero or negative; cannot cross-check ROI",
            ROI_INPUTS_ABSENT,
        ));
        return;
    }

    let implied = benefit / investment;
    let tolerance = 0.35_f64.max(0.35 * stated.abs());
    if (implied - stated).abs() > tolerance {
        findings.push(HygieneFinding::warning(
            "roi_consistency",
            format!(
                "Stated ROI {:.2}x diverges from implied {:.2}x (benefit / investment)",
                stated, implied
            ),
            ROI_DIVERGENCE,
        ));
    } else {
        findings.push(HygieneFinding::pass(
            "roi_consistency",
            format!("Stated ROI {:.2}x consistent with implied {:.2}x", stated, implied),
        ));
    }
}

/// Table/CSV extraction check. Returns the extracted figures so the
/// narrative check can decide whether it still needs to run.
fn check_table_market(
    snapshot: &DecisionSnapshot,
    findings: &mut Vec<HygieneFinding>,
) -> TableMoney {
    let table = extract_table_money(&snapshot.body);
    match (table.market_size, table.projected_revenue) {
        (Some(market), Some(revenue)) => {
            if revenue > market * MARKET_TOLERANCE {
                findings.push(HygieneFinding::fail(
                    "table_market_consistency",
                    format!(
                        "Projected revenue {:.0} exceeds market size {:.0} by more than 5%",
                        revenue, market
                    ),
                    TABLE_MARKET_EXCEEDED,
                ));
            } else {
                findings.push(HygieneFinding::pass(
                    "table_market_consistency",
                    "Projected revenue fits within stated market size",
                ));
            }
        }
        _ if table.any_extracted() => {
            findings.push(HygieneFinding::warning(
                "table_market_consistency",
                "Financial table only partially extractable; market vs revenue not comparable",
                TABLE_PARTIAL,
            ));
        }
        _ => {} // no tables at all; the narrative fallback takes over
    }
    table
}

/// Free-text fallback when the tables did not yield both figures.
fn check_narrative_market(
    snapshot: &DecisionSnapshot,
    table: &TableMoney,
    findings: &mut Vec<HygieneFinding>,
) {
    if table.market_size.is_some() && table.projected_revenue.is_some() {
        return;
    }
    let market = table.market_size.or_else(|| {
        find_labeled_money(
            &snapshot.body,
            &["market size", "tam ", "total addressable market"],
            PROXIMITY_WINDOW,
        )
    });
    let revenue = table.projected_revenue.or_else(|| {
        find_labeled_money(
            &snapshot.body,
            &["projected revenue", "expected revenue", "gross benefit"],
            PROXIMITY_WINDOW,
        )
    });
    match (market, revenue) {
        (Some(market), Some(revenue)) => {
            if revenue > market * MARKET_TOLERANCE {
                findings.push(HygieneFinding::fail(
                    "narrative_market_consistency",
                    format!(
                        "Narrative revenue {:.0} exceeds narrative market size {:.0} by more than 5%",
                        revenue, market
                    ),
                    NARRATIVE_MARKET_EXCEEDED,
                ));
            } else {
                findings.push(HygieneFinding::pass(
                    "narrative_market_consistency",
                    "Narrative revenue claims fit within the stated market",
                ));
            }
        }
        _ => {
            findings.push(HygieneFinding::warning(
                "narrative_market_consistency",
                "Market size and projected revenue not both extractable from the document",
                NARRATIVE_ABSENT,
            ));
        }
    }
}

fn check_metadata_presence(
    snapshot: &DecisionSnapshot,
    body_lower: &str,
    findings: &mut Vec<HygieneFinding>,
) {
    let checks: [(&str, &[&str], f64); 3] = [
        ("kpi_presence", &["primary_kpi", "kpi"], KPI_ABSENT),
        (
            "objective_presence",
            &["strategic_objective", "objective"],
            OBJECTIVE_ABSENT,
        ),
        ("horizon_presence", &["time_horizon", "horizon"], HORIZON_ABSENT),
    ];
    for (check, keys, penalty) in checks {
        let Some(value) = snapshot.prop_str(keys) else {
            continue;
        };
        if tokens_present(body_lower, value) {
            findings.push(HygieneFinding::pass(
                check,
                format!("\"{}\" is reflected in the narrative", value),
            ));
        } else {
            findings.push(HygieneFinding::warning(
                check,
                format!("\"{}\" never appears in the narrative body", value),
                penalty,
            ));
        }
    }
}

fn check_reversibility(
    snapshot: &DecisionSnapshot,
    body_lower: &str,
    findings: &mut Vec<HygieneFinding>,
) {
    let Some(meta) = snapshot.prop_str(&["decision_type", "reversibility"]) else {
        return;
    };
    let Some(meta_irreversible) = reversibility_stance(&meta.to_lowercase()) else {
        return;
    };
    match reversibility_stance(body_lower) {
        Some(body_irreversible) if body_irreversible == meta_irreversible => {
            findings.push(HygieneFinding::pass(
                "reversibility_alignment",
                "Narrative agrees with the decision-type metadata",
            ));
        }
        Some(_) => {
            findings.push(HygieneFinding::fail(
                "reversibility_alignment",
                format!(
                    "Metadata says {} but the narrative says the opposite",
                    if meta_irreversible { "irreversible" } else { "reversible" }
                ),
                REVERSIBILITY_CONFLICT,
            ));
        }
        None => {
            findings.push(HygieneFinding::warning(
                "reversibility_alignment",
                "Narrative never discusses reversibility",
                REVERSIBILITY_UNMENTIONED,
            ));
        }
    }
}

/// `Some(true)` = irreversible, `Some(false)` = reversible, `None` = silent.
/// "irreversible" must be checked first since it contains "reversible".
fn reversibility_stance(text: &str) -> Option<bool> {
    if text.contains("irreversible") {
        Some(true)
    } else if text.contains("reversible") {
        Some(false)
    } else {
        None
    }
}

fn check_baseline_target(snapshot: &DecisionSnapshot, findings: &mut Vec<HygieneFinding>) {
    let baseline = snapshot.prop_f64(&["baseline", "baseline_value"]);
    let target = snapshot.prop_f64(&["target", "target_value"]);
    let (Some(baseline), Some(target)) = (baseline, target) else {
        return;
    };
    if target <= baseline {
        findings.push(HygieneFinding::fail(
            "baseline_target_direction",
            format!("Target {} does not improve on baseline {}", target, baseline),
            TARGET_NOT_ABOVE_BASELINE,
        ));
    } else {
        findings.push(HygieneFinding::pass(
            "baseline_target_direction",
            "Target improves on baseline",
        ));
    }
}

fn check_probability(
    snapshot: &DecisionSnapshot,
    body_lower: &str,
    findings: &mut Vec<HygieneFinding>,
) {
    let Some(meta) = snapshot.prop_f64(&["probability_of_success", "success_probability"]) else {
        return;
    };
    if !(0.0..=100.0).contains(&meta) {
        findings.push(HygieneFinding::warning(
            "probability_bounds",
            format!("Probability of success {} is outside 0-100%", meta),
            PROBABILITY_OUT_OF_RANGE,
        ));
    } else {
        findings.push(HygieneFinding::pass(
            "probability_bounds",
            "Probability of success within 0-100%",
        ));
    }

    let document = find_labeled_percent(
        body_lower,
        &["probability of success", "probability", "likelihood", "odds"],
        PROXIMITY_WINDOW,
    );
    if let Some(document) = document {
        if (meta - document).abs() > PROBABILITY_TOLERANCE {
            findings.push(HygieneFinding::warning(
                "probability_alignment",
                format!(
                    "Metadata probability {}% differs from document's {}% by more than 20 points",
                    meta, document
                ),
                PROBABILITY_MISMATCH,
            ));
        } else {
            findings.push(HygieneFinding::pass(
                "probability_alignment",
                "Metadata and document probabilities agree",
            ));
        }
    }
}

/// Token-level presence: any token of `value` with ≥3 characters appears in
/// the (lowercased) body. Values with no checkable tokens count as present.
fn tokens_present(body_lower: &str, value: &str) -> bool {
    let mut had_token = false;
    for token in value
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= 3)
    {
        had_token = true;
        if body_lower.contains(token) {
            return true;
        }
    }
    !had_token
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn healthy_snapshot() -> DecisionSnapshot {
        let body = "\
We will expand into the DACH region to lift customer retention.\n\
This decision is reversible: the pilot can be unwound within a quarter.\n\
We put the probability of success at 70% based on pilot data.\n\
The rollout runs over the next 18 months.\n\
\n\
| Market size | $2.5b |\n\
| Projected revenue | $40m |\n\
| Investment required | $5m |\n";
        DecisionSnapshot::new(body)
            .with_property("investment_required", json!(100000))
            .with_property("benefit_12m", json!(250000))
            .with_property("stated_roi", json!(2.5))
            .with_property("primary_kpi", json!("customer retention"))
            .with_property("strategic_objective", json!("expand into the DACH region"))
            .with_property("time_horizon", json!("18 months"))
            .with_property("decision_type", json!("reversible"))
            .with_property("baseline", json!(12))
            .with_property("target", json!(20))
            .with_property("probability_of_success", json!(70))
    }

    #[test]
    fn test_consistent_document_scores_high() {
        let report = evaluate_hygiene(&healthy_snapshot(), &[]);
        assert!(report.score > 8.0, "score was {}", report.score);
        assert!(
            report.findings.iter().all(|f| f.status != CheckStatus::Fail),
            "unexpected fail findings: {:?}",
            report.findings
        );
    }

    #[test]
    fn test_inconsistent_roi_and_missing_sections() {
        let snapshot = DecisionSnapshot::new("A thin proposal without figures.")
            .with_property("investment_required", json!(100000))
            .with_property("benefit_12m", json!(50000))
            .with_property("stated_roi", json!(5));
        let missing = vec!["financial_analysis".to_string(), "risk_register".to_string()];

        let report = evaluate_hygiene(&snapshot, &missing);
        assert!(report.score < 8.0, "score was {}", report.score);

        let artifacts = report
            .findings
            .iter()
            .find(|f| f.check == "required_artifacts")
            .unwrap();
        assert_eq!(artifacts.status, CheckStatus::Fail);

        let roi = report
            .findings
            .iter()
            .find(|f| f.check == "roi_consistency")
            .unwrap();
        assert_eq!(roi.status, CheckStatus::Warning);
    }

    #[test]
    fn test_missing_section_penalty_capped() {
        let missing: Vec<String> = (0..20).map(|i| format!("section_{i}")).collect();
        let report = evaluate_hygiene(&DecisionSnapshot::default(), &missing);
        let artifacts = &report.findings[0];
        assert_eq!(artifacts.score_impact, 4.0);
    }

    #[test]
    fn test_revenue_exceeding_market_fails() {
        let body = "| Market size | $10m |\n| Projected revenue | $12m |\n";
        let report = evaluate_hygiene(&DecisionSnapshot::new(body), &[]);
        let finding = report
            .findings
            .iter()
            .find(|f| f.check == "table_market_consistency")
            .unwrap();
        assert_eq!(finding.status, CheckStatus::Fail);
        assert_eq!(finding.score_impact, 2.4);
    }

    #[test]
    fn test_revenue_within_5_percent_passes() {
        let body = "| Market size | $10m |\n| Projected revenue | $10.4m |\n";
        let report = evaluate_hygiene(&DecisionSnapshot::new(body), &[]);
        let finding = report
            .findings
            .iter()
            .find(|f| f.check == "table_market_consistency")
            .unwrap();
        assert_eq!(finding.status, CheckStatus::Pass);
    }

    #[test]
    fn test_narrative_fallback_fires_without_tables() {
        let body = "The market size is roughly $10m while projected revenue is $20m.";
        let report = evaluate_hygiene(&DecisionSnapshot::new(body), &[]);
        let finding = report
            .findings
            .iter()
            .find(|f| f.check == "narrative_market_consistency")
            .unwrap();
        assert_eq!(finding.status, CheckStatus::Fail);
        assert_eq!(finding.score_impact, 2.0);
    }

    #[test]
    fn test_reversibility_conflict_fails() {
        let snapshot = DecisionSnapshot::new("This commitment is irreversible once signed.")
            .with_property("decision_type", json!("reversible"));
        let report = evaluate_hygiene(&snapshot, &[]);
        let finding = report
            .findings
            .iter()
            .find(|f| f.check == "reversibility_alignment")
            .unwrap();
        assert_eq!(finding.status, CheckStatus::Fail);
    }

    #[test]
    fn test_target_below_baseline_fails() {
        let snapshot = DecisionSnapshot::new("body")
            .with_property("baseline", json!(50))
            .with_property("target", json!(40));
        let report = evaluate_hygiene(&snapshot, &[]);
        let finding = report
            .findings
            .iter()
            .find(|f| f.check == "baseline_target_direction")
            .unwrap();
        assert_eq!(finding.status, CheckStatus::Fail);
    }

    #[test]
    fn test_probability_out_of_range_warns() {
        let snapshot =
            DecisionSnapshot::new("body").with_property("probability_of_success", json!(140));
        let report = evaluate_hygiene(&snapshot, &[]);
        let finding = report
            .findings
            .iter()
            .find(|f| f.check == "probability_bounds")
            .unwrap();
        assert_eq!(finding.status, CheckStatus::Warning);
    }

    #[test]
    fn test_probability_mismatch_warns() {
        let snapshot =
            DecisionSnapshot::new("We estimate the probability of success at 30% today.")
                .with_property("probability_of_success", json!(80));
        let report = evaluate_hygiene(&snapshot, &[]);
        let finding = report
            .findings
            .iter()
            .find(|f| f.check == "probability_alignment")
            .unwrap();
        assert_eq!(finding.status, CheckStatus::Warning);
        assert_eq!(finding.score_impact, 1.0);
    }

    #[test]
    fn test_score_never_negative() {
        // Pile on enough failures that the raw sum would go below zero
        let body = "| Market size | $1m |\n| Projected revenue | $900m |\nirreversible";
        let snapshot = DecisionSnapshot::new(body)
            .with_property("decision_type", json!("reversible"))
            .with_property("baseline", json!(10))
            .with_property("target", json!(5))
            .with_property("probability_of_success", json!(500))
            .with_property("stated_roi", json!(9));
        let missing: Vec<String> = (0..10).map(|i| format!("s{i}")).collect();
        let report = evaluate_hygiene(&snapshot, &missing);
        assert!(report.score >= 0.0);
    }
}
