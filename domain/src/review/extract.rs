//! Structured output extraction from unreliable model text.
//!
//! Models are asked for JSON but routinely wrap it in prose, markdown
//! fences, or Python-flavored literals. [`extract_json`] recovers a
//! JSON value on a best-effort basis and never errors; unusable text
//! simply yields `None` and the caller degrades to a placeholder review.
//!
//! Candidate order (first structurally-valid parse wins):
//! 1. the trimmed raw text;
//! 2. every fenced code block body;
//! 3. the first `{` to its matching `}` (string- and escape-aware);
//! each candidate is tried strict first, then through a lenient rewrite
//! (`True`/`False`/`None` → JSON literals, single → double quotes,
//! trailing commas stripped).

use serde_json::Value;

/// Recover a JSON value from free-form model output. Never errors.
pub fn extract_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut candidates: Vec<String> = Vec::new();
    push_candidate(&mut candidates, trimmed.to_string());
    for block in fenced_blocks(raw) {
        push_candidate(&mut candidates, block.trim().to_string());
    }
    if let Some(span) = first_object_span(raw) {
        push_candidate(&mut candidates, span.to_string());
    }

    for candidate in &candidates {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            return Some(value);
        }
        let lenient = lenient_rewrite(candidate);
        if lenient != *candidate
            && let Ok(value) = serde_json::from_str::<Value>(&lenient)
        {
            return Some(value);
        }
    }

    None
}

/// Deduplicate candidates by exact text, preserving order.
fn push_candidate(candidates: &mut Vec<String>, candidate: String) {
    if !candidate.is_empty() && !candidates.contains(&candidate) {
        candidates.push(candidate);
    }
}

/// Extract the bodies of all fenced code blocks (``` with optional language).
fn fenced_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            match current.take() {
                Some(body) => blocks.push(body),
                None => current = Some(String::new()),
            }
            continue;
        }
        if let Some(body) = current.as_mut() {
            body.push_str(line);
            body.push('\n');
        }
    }

    blocks
}

/// Substring from the first `{` to its matching `}` at depth zero,
/// tracking string-literal state and escape sequences.
fn first_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Rewrite Python-flavored pseudo-JSON into strict JSON:
/// bare `True`/`False`/`None` tokens, single-quoted strings, and
/// trailing commas before `]`/`}`.
fn lenient_rewrite(candidate: &str) -> String {
    let mut out = String::with_capacity(candidate.len());
    let mut chars = candidate.chars().peekable();
    let mut in_double = false;
    let mut in_single = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_double {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_double = false;
            }
            continue;
        }
        if in_single {
            if escaped {
                escaped = false;
                // \' has no meaning in JSON; emit the bare character
                if c == '\'' {
                    out.push('\'');
                } else {
                    out.push('\\');
                    out.push(c);
                }
            } else if c == '\\' {
                escaped = true;
            } else if c == '\'' {
                out.push('"');
                in_single = false;
            } else if c == '"' {
                out.push_str("\\\"");
            } else {
                out.push(c);
            }
            continue;
        }
        match c {
            '"' => {
                in_double = true;
                out.push(c);
            }
            '\'' => {
                in_single = true;
                out.push('"');
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::new();
                word.push(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    "None" => out.push_str("null"),
                    _ => out.push_str(&word),
                }
            }
            _ => out.push(c),
        }
    }

    strip_trailing_commas(&out)
}

/// Remove `,` when the next non-whitespace character closes an array or
/// object. Assumes double-quoted strings (runs after the quote rewrite).
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
            out.push(c);
            continue;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some(']') | Some('}')) {
                continue;
            }
        }
        out.push(c);
    }

    out
}
