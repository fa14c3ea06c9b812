//! Composite scoring of the review panel.
//!
//! Pure function: reviews + hygiene score → Decision Quality Score (DQS).
//! Every intermediate value is retained on the breakdown so a persisted run
//! can be audited and the algorithm unit-tested stage by stage.
//!
//! The weighting is deliberately asymmetric: risk-oriented reviewers gain
//! influence when they dissent, growth-oriented reviewers lose a little
//! when they wave a decision through.

use crate::agent::profile::AgentDiscipline;
use crate::review::output::ReviewOutput;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight multiplier for a dissenting risk-weighted agent
const RISK_DISSENT_BOOST: f64 = 1.35;
/// Weight multiplier for a cleanly-approving growth-weighted agent
const GROWTH_APPROVAL_DAMP: f64 = 0.85;
/// Substance vs hygiene split in the final DQS
const SUBSTANCE_SHARE: f64 = 0.75;
const HYGIENE_SHARE: f64 = 0.25;

/// All intermediate scoring values, retained for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Weighted mean of raw scores, before penalties
    pub weighted_mean: f64,
    /// Weighted mean minus penalties, clamped to [0, 10]
    pub substance_score: f64,
    /// Mean confidence across all reviews
    pub confidence_score: f64,
    pub dissent_penalty: f64,
    pub confidence_penalty: f64,
    /// clamp(0.75 × substance + 0.25 × hygiene, 0, 10)
    pub dqs: f64,
}

/// Base weight of an agent's vote, before disposition adjustment.
fn base_weight(agent_id: &str) -> f64 {
    match agent_id {
        "ceo" => 0.30,
        "cfo" | "cto" => 0.25,
        "compliance" => 0.20,
        _ => 0.20,
    }
}

/// Disposition-adjusted weight.
fn adjusted_weight(agent_id: &str, review: &ReviewOutput) -> f64 {
    let weight = base_weight(agent_id);
    match AgentDiscipline::infer(agent_id) {
        AgentDiscipline::RiskWeighted if !review.is_clean_approval() => {
            weight * RISK_DISSENT_BOOST
        }
        AgentDiscipline::GrowthWeighted if review.is_clean_approval() => {
            weight * GROWTH_APPROVAL_DAMP
        }
        _ => weight,
    }
}

/// Dissent contribution of one agent, scaled by max(0.8, weight).
fn dissent_contribution(agent_id: &str, review: &ReviewOutput, weight: f64) -> f64 {
    let raw = if review.blocked {
        match agent_id {
            "cfo" | "compliance" => 2.0,
            "cto" => 1.4,
            _ => 1.0,
        }
    } else {
        let rate = match agent_id {
            "cfo" | "compliance" => 0.35,
            "cto" => 0.25,
            _ => 0.12,
        };
        review.score_deficit() * rate
    };
    raw * weight.max(0.8)
}

/// Compute the composite score over the current review set.
pub fn score_reviews(
    reviews: &BTreeMap<String, ReviewOutput>,
    hygiene_score: f64,
) -> ScoreBreakdown {
    if reviews.is_empty() {
        return ScoreBreakdown {
            weighted_mean: 0.0,
            substance_score: 0.0,
            confidence_score: 0.0,
            dissent_penalty: 0.0,
            confidence_penalty: 0.0,
            dqs: (HYGIENE_SHARE * hygiene_score.clamp(0.0, 10.0)).clamp(0.0, 10.0),
        };
    }

    let mut weight_sum = 0.0;
    let mut score_sum = 0.0;
    let mut dissent_penalty = 0.0;
    let mut risk_confidences = Vec::new();

    for (agent_id, review) in reviews {
        let weight = adjusted_weight(agent_id, review);
        weight_sum += weight;
        score_sum += weight * review.score as f64;
        dissent_penalty += dissent_contribution(agent_id, review, weight);
        if AgentDiscipline::infer(agent_id).is_risk_weighted() {
            risk_confidences.push(review.confidence);
        }
    }

    let weighted_mean = score_sum / weight_sum;
    let confidence_score =
        reviews.values().map(|r| r.confidence).sum::<f64>() / reviews.len() as f64;

    let confidence_penalty = if risk_confidences.is_empty() {
        0.0
    } else {
        let mean = risk_confidences.iter().sum::<f64>() / risk_confidences.len() as f64;
        (0.6 - mean).max(0.0) * 2.5
    };

    let substance_score = (weighted_mean - dissent_penalty - confidence_penalty).clamp(0.0, 10.0);
    let dqs = (SUBSTANCE_SHARE * substance_score + HYGIENE_SHARE * hygiene_score.clamp(0.0, 10.0))
        .clamp(0.0, 10.0);

    ScoreBreakdown {
        weighted_mean,
        substance_score,
        confidence_score,
        dissent_penalty,
        confidence_penalty,
        dqs,
    }
}
