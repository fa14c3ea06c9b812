//! Near-duplicate detection via sequence similarity.
//!
//! Two lines count as duplicates when the ratio
//! `2 × LCS(a, b) / (len(a) + len(b))` over their normalized forms reaches
//! the threshold (0.86 by default). Normalization lowercases, strips
//! punctuation, and removes a fixed stop-word list. The LCS is computed
//! with classic dynamic programming over characters; golden-output tests
//! depend on this exact computation, so do not "optimize" it into a
//! different similarity measure.

/// Default duplicate threshold
pub const DEFAULT_THRESHOLD: f64 = 0.86;

const STOP_WORDS: [&str; 18] = [
    "the", "a", "an", "and", "or", "of", "to", "for", "in", "on", "with", "is", "are", "be",
    "that", "this", "will", "it",
];

/// Lowercase, strip punctuation, drop stop words, collapse whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Longest common subsequence length, O(len(a) × len(b)) DP with a rolling row.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Similarity ratio of two normalized strings: `2·LCS / (|a| + |b|)`.
///
/// Two empty strings are identical (ratio 1.0).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    2.0 * lcs_len(&a, &b) as f64 / (a.len() + b.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_noise() {
        assert_eq!(
            normalize("Build X for region A."),
            normalize("Build X for region A")
        );
        assert_eq!(normalize("The plan, and the budget!"), "plan budget");
    }

    #[test]
    fn test_identical_after_normalization() {
        let a = normalize("Build X for region A.");
        let b = normalize("Build X for region A");
        assert_eq!(similarity_ratio(&a, &b), 1.0);
    }

    #[test]
    fn test_dissimilar_lines_score_low() {
        let a = normalize("Hire a compliance officer for the Berlin office");
        let b = normalize("Deprecate the legacy billing system");
        assert!(similarity_ratio(&a, &b) < DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_small_edits_stay_above_threshold() {
        let a = normalize("Add a sensitivity analysis to the financial model");
        let b = normalize("Add sensitivity analysis to financial model");
        assert!(similarity_ratio(&a, &b) >= DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("abc", ""), 0.0);
    }
}
