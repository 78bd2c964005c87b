//! Pairwise Feature Scorer
//!
//! Averages per-column similarities over every scored column. Missing values
//! contribute 0.0 but still count toward the denominator.

use crate::distance::{multi_value_similarity, numeric_similarity};
use crate::explain::{ColumnContribution, PairExplanation};
use crate::features::{FeatureKind, FeatureLayout, TransformedRecord};

/// Stateless scorer over a fixed column layout
#[derive(Debug, Clone)]
pub struct PairwiseScorer {
    layout: FeatureLayout,
}

impl PairwiseScorer {
    pub fn new(layout: FeatureLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Similarity of two transformed records in [0.0, 1.0]
    pub fn score(&self, a: &TransformedRecord, b: &TransformedRecord) -> f64 {
        let mut sum = 0.0;
        let mut total_features = 0usize;
        self.for_each_contribution(a, b, |_, _, contribution, _| {
            sum += contribution;
            total_features += 1;
        });
        average(sum, total_features)
    }

    /// Score plus the per-column breakdown
    pub fn explain(&self, a: &TransformedRecord, b: &TransformedRecord) -> PairExplanation {
        let mut contributions = Vec::with_capacity(self.layout.total_features());
        let mut sum = 0.0;
        self.for_each_contribution(a, b, |column, kind, contribution, missing| {
            sum += contribution;
            contributions.push(ColumnContribution {
                column: column.to_string(),
                kind,
                contribution,
                missing,
            });
        });

        PairExplanation {
            a: a.id,
            b: b.id,
            score: average(sum, contributions.len()),
            contributions,
        }
    }

    fn for_each_contribution<F>(&self, a: &TransformedRecord, b: &TransformedRecord, mut f: F)
    where
        F: FnMut(&str, FeatureKind, f64, bool),
    {
        for (k, column) in self.layout.numeric.iter().enumerate() {
            let (va, vb) = (value_at(&a.numeric, k), value_at(&b.numeric, k));
            let missing = va.is_none() || vb.is_none();
            f(column, FeatureKind::Numeric, numeric_similarity(va, vb), missing);
        }

        for (k, column) in self.layout.multi_value.iter().enumerate() {
            let va = a.multi_value.get(k).and_then(Option::as_ref);
            let vb = b.multi_value.get(k).and_then(Option::as_ref);
            let missing = va.is_none() || vb.is_none();
            f(column, FeatureKind::MultiValue, multi_value_similarity(va, vb), missing);
        }
    }
}

#[inline]
fn value_at(values: &[Option<f64>], k: usize) -> Option<f64> {
    values.get(k).copied().flatten()
}

#[inline]
fn average(sum: f64, total_features: usize) -> f64 {
    if total_features == 0 {
        0.0
    } else {
        sum / total_features as f64
    }
}
