//! String normalization and similarity primitives used by the scorer.

use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

/// Normalize for comparison: lowercase, NFD-decompose and strip combining
/// marks, keep Unicode letters/digits/whitespace, collapse runs of spaces.
#[must_use]
pub fn normalize(s: &str) -> String {
    let stripped: String = s
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    let kept: String = stripped
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else {
                ' '
            }
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_combining_mark(c: char) -> bool {
    // Combining Diacritical Marks and their extensions/supplements.
    matches!(u32::from(c),
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Normalized token set.
#[must_use]
pub fn token_set(s: &str) -> BTreeSet<String> {
    normalize(s)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Token Jaccard similarity over normalized tokens.
#[must_use]
pub fn token_jaccard(a: &str, b: &str) -> f64 {
    let set_a = token_set(a);
    let set_b = token_set(b);
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

/// Name similarity: token Jaccard plus first-name and last-name bonuses,
/// capped at 1.0. This is the raw similarity the contradiction detector
/// also thresholds on.
#[must_use]
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize(a);
    let norm_b = normalize(b);
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }
    let tokens_a: Vec<&str> = norm_a.split_whitespace().collect();
    let tokens_b: Vec<&str> = norm_b.split_whitespace().collect();

    let mut similarity = token_jaccard(&norm_a, &norm_b);
    if tokens_a.first() == tokens_b.first() {
        similarity += 0.10;
    }
    if tokens_a.last() == tokens_b.last() {
        similarity += 0.10;
    }
    similarity.min(1.0)
}
