//! Title normalization and the cheap fuzzy-match primitive behind duplicate
//! detection.

use std::collections::HashSet;

/// Canonical form used for every title comparison.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Tokens worth prefiltering on: longer than 3 chars, so "the"/"and"/"with"
/// never select candidates.
pub fn significant_tokens(normalized_title: &str) -> Vec<&str> {
    normalized_title
        .split_whitespace()
        .filter(|t| t.len() > 3)
        .collect()
}

/// Jaccard similarity over whitespace-tokenized word sets:
/// |A ∩ B| / |A ∪ B|. Inputs are expected to be normalized already.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / union as f64
}
