//! Per-column similarity functions
//!
//! All functions return a similarity in [0.0, 1.0] where 1.0 means identical.
//! Missing inputs score 0.0: they count as maximal difference, not as absent.

use ahash::AHashSet;

/// Lower-cased, trimmed tokens of a multi-value cell
pub type TokenSet = AHashSet<String>;

/// Numeric similarity of two values already scaled to [0, 1]
#[inline]
pub fn numeric_similarity(a: Option<f64>, b: Option<f64>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => 1.0 - (a - b).abs(),
        _ => 0.0,
    }
}

/// Split a comma separated cell into a token set.
/// Tokens are trimmed and lower-cased; empty tokens are dropped.
pub fn tokenize(value: &str) -> TokenSet {
    value
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Adjusted Jaccard: `|A ∩ B| / sqrt(|A| * |B|)`.
///
/// Divides by the geometric mean of the set sizes rather than the union.
/// An empty set on either side gives 0.0.
pub fn adjusted_jaccard(a: &TokenSet, b: &TokenSet) -> f64 {
    let denominator = ((a.len() * b.len()) as f64).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|t| large.contains(*t)).count();

    intersection as f64 / denominator
}

/// Multi-value similarity; missing cells on either side score 0.0
#[inline]
pub fn multi_value_similarity(a: Option<&TokenSet>, b: Option<&TokenSet>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => adjusted_jaccard(a, b),
        _ => 0.0,
    }
}
