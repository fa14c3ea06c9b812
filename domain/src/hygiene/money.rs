//! Money and percentage extraction from decision documents.
//!
//! Deterministic scanners used by the hygiene checks. These are heuristics
//! over messy human text, not a grammar: a money token is a number with an
//! optional `$` prefix and an optional scale word (`b`/`m`/`k`,
//! `billion`/`million`/`thousand`). To keep bare counters ("year 1",
//! "12-month") out, an unscaled, unprefixed number only counts as money
//! when it is at least 1,000.

/// Canonical financial quantities the table scanner looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyLabel {
    MarketSize,
    ProjectedRevenue,
    Investment,
}

/// Money figures recovered from table/CSV-style rows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TableMoney {
    pub market_size: Option<f64>,
    pub projected_revenue: Option<f64>,
    pub investment: Option<f64>,
}

impl TableMoney {
    pub fn any_extracted(&self) -> bool {
        self.market_size.is_some() || self.projected_revenue.is_some() || self.investment.is_some()
    }

    pub fn all_extracted(&self) -> bool {
        self.market_size.is_some() && self.projected_revenue.is_some() && self.investment.is_some()
    }
}

const REVENUE_PHRASES: [&str; 3] = ["projected revenue", "gross benefit", "expected revenue"];
const INVESTMENT_PHRASES: [&str; 3] =
    ["investment required", "required investment", "investment"];

/// Normalize a row label against the known financial vocabulary.
pub fn normalize_label(label: &str) -> Option<MoneyLabel> {
    let label = label.to_lowercase();
    // Whole-word match for the acronyms so "sample" does not hit "sam"
    let words: Vec<&str> = label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if label.contains("market size") || words.iter().any(|w| ["tam", "sam", "som"].contains(w)) {
        return Some(MoneyLabel::MarketSize);
    }
    if REVENUE_PHRASES.iter().any(|p| label.contains(p)) {
        return Some(MoneyLabel::ProjectedRevenue);
    }
    if INVESTMENT_PHRASES.iter().any(|p| label.contains(p)) {
        return Some(MoneyLabel::Investment);
    }
    None
}

/// Scan table/CSV-style rows (`|` or `,` separated, label first) for the
/// known financial quantities. First hit per label wins.
pub fn extract_table_money(body: &str) -> TableMoney {
    let mut result = TableMoney::default();
    for line in body.lines() {
        let cells: Vec<&str> = if line.contains('|') {
            line.split('|').map(str::trim).filter(|c| !c.is_empty()).collect()
        } else if line.contains(',') {
            line.split(',').map(str::trim).filter(|c| !c.is_empty()).collect()
        } else {
            continue;
        };
        if cells.len() < 2 {
            continue;
        }
        let Some(label) = normalize_label(cells[0]) else {
            continue;
        };
        let Some(value) = cells[1..].iter().find_map(|cell| parse_money(cell)) else {
            continue;
        };
        let slot = match label {
            MoneyLabel::MarketSize => &mut result.market_size,
            MoneyLabel::ProjectedRevenue => &mut result.projected_revenue,
            MoneyLabel::Investment => &mut result.investment,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
    result
}

/// Free-text fallback: find any of `labels` in the body and return the
/// first money token within the next `window` characters.
pub fn find_labeled_money(body: &str, labels: &[&str], window: usize) -> Option<f64> {
    let lower = body.to_lowercase();
    for label in labels {
        let mut search_from = 0;
        while let Some(pos) = lower[search_from..].find(label) {
            let start = search_from + pos + label.len();
            let end = (start + window).min(lower.len());
            // Clamp to a char boundary for safety with non-ASCII bodies
            let end = (start..=end).rev().find(|i| lower.is_char_boundary(*i)).unwrap_or(start);
            if let Some(value) = parse_money(&lower[start..end]) {
                return Some(value);
            }
            search_from = start;
        }
    }
    None
}

/// Find a percentage within `window` chars after any of `keywords`.
pub fn find_labeled_percent(body: &str, keywords: &[&str], window: usize) -> Option<f64> {
    let lower = body.to_lowercase();
    for keyword in keywords {
        if let Some(pos) = lower.find(keyword) {
            let start = pos + keyword.len();
            let end = (start + window).min(lower.len());
            let end = (start..=end).rev().find(|i| lower.is_char_boundary(*i)).unwrap_or(start);
            if let Some(value) = first_percent(&lower[start..end]) {
                return Some(value);
            }
        }
    }
    None
}

/// Parse the first money token in `text`, applying scale suffixes.
pub fn parse_money(text: &str) -> Option<f64> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let has_dollar = chars[..i]
            .iter()
            .rev()
            .find(|c| !c.is_whitespace())
            .is_some_and(|c| *c == '$');
        let start = i;
        let mut j = i;
        while j < chars.len() && (chars[j].is_ascii_digit() || chars[j] == ',' || chars[j] == '.') {
            j += 1;
        }
        let raw: String = chars[start..j]
            .iter()
            .collect::<String>()
            .trim_end_matches(['.', ','])
            .replace(',', "");
        let Ok(value) = raw.parse::<f64>() else {
            i = j;
            continue;
        };
        // Percentages are not money
        if chars.get(j).copied() == Some('%') {
            i = j + 1;
            continue;
        }
        let suffix = following_word(&chars, j);
        let scale = match suffix.as_str() {
            "b" | "bn" | "billion" => Some(1e9),
            "m" | "mm" | "million" => Some(1e6),
            "k" | "thousand" => Some(1e3),
            _ => None,
        };
        match scale {
            Some(scale) => return Some(value * scale),
            None if has_dollar || value >= 1000.0 => return Some(value),
            None => i = j,
        }
    }
    None
}

/// Parse the first `NN%` token in `text`.
fn first_percent(text: &str) -> Option<f64> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        let mut j = i;
        while j < chars.len() && (chars[j].is_ascii_digit() || chars[j] == '.') {
            j += 1;
        }
        let mut k = j;
        while k < chars.len() && chars[k] == ' ' {
            k += 1;
        }
        if chars.get(k).copied() == Some('%') {
            let raw: String = chars[start..j].iter().collect();
            return raw.parse::<f64>().ok();
        }
        i = j;
    }
    None
}

/// The alphabetic word immediately following position `from` (skipping
/// whitespace), lowercased. Used for scale suffix detection.
fn following_word(chars: &[char], from: usize) -> String {
    let mut i = from;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    let mut word = String::new();
    while i < chars.len() && chars[i].is_ascii_alphabetic() {
        word.push(chars[i]);
        i += 1;
    }
    word
}
