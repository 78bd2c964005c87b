//! Explainability for pairwise feature scores
//!
//! Shows how much each column contributed to a pair's score.

use crate::features::FeatureKind;
use serde::Serialize;
use studysim_core::RecordId;

/// Contribution of a single column to a pair's score
#[derive(Debug, Clone, Serialize)]
pub struct ColumnContribution {
    pub column: String,
    pub kind: FeatureKind,
    /// Unweighted similarity of this column in [0, 1]
    pub contribution: f64,
    /// At least one side had no usable value
    pub missing: bool,
}

/// A pair's score with its per-column breakdown
#[derive(Debug, Clone, Serialize)]
pub struct PairExplanation {
    pub a: RecordId,
    pub b: RecordId,
    pub score: f64,
    pub contributions: Vec<ColumnContribution>,
}

impl PairExplanation {
    /// Column with the largest contribution, if any
    pub fn top_contributing_column(&self) -> Option<&str> {
        self.contributions
            .iter()
            .max_by(|x, y| {
                x.contribution
                    .partial_cmp(&y.contribution)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .filter(|c| c.contribution > 0.0)
            .map(|c| c.column.as_str())
    }

    /// Number of columns where a value was missing on either side
    pub fn missing_count(&self) -> usize {
        self.contributions.iter().filter(|c| c.missing).count()
    }
}
