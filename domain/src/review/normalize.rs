//! Review normalization: untyped parsed output → strict [`ReviewOutput`].
//!
//! Several generations of review prompts produced differently-shaped
//! objects (`score` vs `rating`, `blockers` vs `blocking_issues`, 1-100
//! confidence scales, ...). Normalization resolves every field through an
//! ordered alias table so all historical shapes land on the same record,
//! instead of branching in callers.

use crate::review::output::{Citation, MAX_CITATIONS, Risk, ReviewOutput};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Maximum length of citation titles and claims
const CITATION_TEXT_MAX: usize = 200;

#[derive(Error, Debug, PartialEq)]
pub enum NormalizeError {
    #[error("No usable object root in agent output")]
    NoObjectRoot,
}

/// Coerce an arbitrary parsed value into a well-formed [`ReviewOutput`].
///
/// Accepts a bare object or a one-element array containing an object.
/// `allowed_checks` restricts `governance_checks_met` keys. Callers fall
/// back to [`ReviewOutput::placeholder`] on error.
pub fn normalize_review(
    value: &Value,
    agent_id: &str,
    allowed_checks: &[String],
) -> Result<ReviewOutput, NormalizeError> {
    let map = object_root(value).ok_or(NormalizeError::NoObjectRoot)?;

    let agent = field(map, &["agent", "name", "role"])
        .and_then(coerce_string)
        .unwrap_or_else(|| agent_id.to_string());

    let thesis = field(map, &["thesis", "summary", "assessment", "verdict"])
        .and_then(coerce_string)
        .unwrap_or_default();

    let score = field(map, &["score", "rating", "final_score"])
        .and_then(coerce_f64)
        .map(|s| s.round().clamp(1.0, 10.0) as i64)
        .unwrap_or(5);

    let confidence = field(map, &["confidence", "confidence_score", "certainty"])
        .and_then(coerce_f64)
        .map(|c| {
            // Legacy prompts reported confidence on a 1-100 scale
            let c = if c > 1.0 { c / 100.0 } else { c };
            c.clamp(0.0, 1.0)
        })
        .unwrap_or(0.5);

    let blockers = field(map, &["blockers", "blocking_issues", "blocking_concerns"])
        .map(coerce_string_list)
        .unwrap_or_default();

    let blocked = field(map, &["blocked", "is_blocked", "veto", "hard_block"])
        .and_then(coerce_bool)
        .unwrap_or(!blockers.is_empty());

    let required_changes = field(
        map,
        &["required_changes", "required_revisions", "changes_required"],
    )
    .map(coerce_string_list)
    .unwrap_or_default();

    let approval_conditions = field(
        map,
        &["approval_conditions", "conditions", "conditions_for_approval"],
    )
    .map(coerce_string_list)
    .unwrap_or_default();

    let risks = field(map, &["risks", "risk_register", "identified_risks"])
        .map(coerce_risks)
        .unwrap_or_default();

    let citations = field(map, &["citations", "sources", "references"])
        .map(coerce_citations)
        .unwrap_or_default();

    let governance_checks_met = field(
        map,
        &["governance_checks_met", "checks_met", "governance_checks"],
    )
    .map(|v| coerce_checks(v, allowed_checks))
    .unwrap_or_default();

    Ok(ReviewOutput {
        agent_id: agent_id.to_string(),
        agent,
        thesis,
        score,
        confidence,
        blocked,
        blockers,
        required_changes,
        approval_conditions,
        risks,
        citations,
        governance_checks_met,
    })
}

/// Accept a bare object, or a one-element array wrapping an object.
fn object_root(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        Value::Array(items) => match items.as_slice() {
            [Value::Object(map)] => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Resolve a field through its ordered alias list.
fn field<'a>(map: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|alias| map.get(*alias))
        .filter(|v| !v.is_null())
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        _ => None,
    }
}

fn coerce_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(coerce_string).collect(),
        Value::String(_) => coerce_string(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn coerce_risks(value: &Value) -> Vec<Risk> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let map = item.as_object()?;
            let kind = field(map, &["type", "kind", "category"])
                .and_then(coerce_string)
                .unwrap_or_else(|| "general".to_string());
            let severity = field(map, &["severity", "impact"])
                .and_then(coerce_f64)
                .map(|s| s.round().clamp(1.0, 10.0) as i64)
                .unwrap_or(5);
            let evidence = field(map, &["evidence", "rationale", "details"])
                .and_then(coerce_string)
                .unwrap_or_default();
            Some(Risk {
                kind,
                severity,
                evidence,
            })
        })
        .collect()
}

fn coerce_citations(value: &Value) -> Vec<Citation> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    let mut citations: Vec<Citation> = Vec::new();
    for item in items {
        let Some(map) = item.as_object() else {
            continue;
        };
        let Some(url) = field(map, &["url", "link", "source"]).and_then(coerce_string) else {
            continue;
        };
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            continue;
        }
        if citations.iter().any(|c| c.url == url) {
            continue;
        }
        let title = field(map, &["title"])
            .and_then(coerce_string)
            .map(|s| truncate(&s, CITATION_TEXT_MAX))
            .unwrap_or_default();
        let claim = field(map, &["claim", "quote", "summary"])
            .and_then(coerce_string)
            .map(|s| truncate(&s, CITATION_TEXT_MAX))
            .unwrap_or_default();
        citations.push(Citation { url, title, claim });
        if citations.len() == MAX_CITATIONS {
            break;
        }
    }
    citations
}

fn coerce_checks(value: &Value, allowed: &[String]) -> BTreeMap<String, bool> {
    let Value::Object(map) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter(|(key, _)| allowed.iter().any(|a| a == *key))
        .filter_map(|(key, v)| coerce_bool(v).map(|b| (key.clone(), b)))
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
