//! Z-score standardization of similarity matrices
//!
//! Statistics are taken over present off-diagonal entries only. The output
//! diagonal is always missing.

use crate::SimilarityMatrix;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What to do when the off-diagonal entries have no spread
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZeroVariancePolicy {
    /// Every present off-diagonal entry becomes 0.0 (all values equal the mean)
    #[default]
    Center,
    /// Keep the raw values
    Unchanged,
}

/// Population statistics used for standardization
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Moments {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl Moments {
    pub fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let collected: Vec<f64> = values.collect();
        let count = collected.len();
        if count == 0 {
            return Self { mean: 0.0, std_dev: 0.0, count };
        }

        // two-pass for numerical stability
        let mean = collected.iter().sum::<f64>() / count as f64;
        let sum_sq: f64 = collected.iter().map(|v| (v - mean) * (v - mean)).sum();

        Self {
            mean,
            std_dev: (sum_sq / count as f64).sqrt(),
            count,
        }
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.count == 0 || !self.std_dev.is_finite() || self.std_dev == 0.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Standardizer {
    policy: ZeroVariancePolicy,
}

impl Standardizer {
    pub fn new(policy: ZeroVariancePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ZeroVariancePolicy {
        self.policy
    }

    /// Standardize `matrix`, returning the new matrix and the statistics used
    pub fn standardize(&self, matrix: &SimilarityMatrix) -> (SimilarityMatrix, Moments) {
        let moments = Moments::from_values(matrix.off_diagonal_values());
        let mut result = matrix.clone();

        if moments.is_degenerate() {
            warn!(
                count = moments.count,
                std_dev = moments.std_dev,
                policy = ?self.policy,
                "Off-diagonal similarities have zero variance"
            );
            if self.policy == ZeroVariancePolicy::Center {
                result.map_off_diagonal(|_| 0.0);
            }
        } else {
            let Moments { mean, std_dev, .. } = moments;
            result.map_off_diagonal(|x| (x - mean) / std_dev);
        }

        result.set_diagonal(None);
        (result, moments)
    }
}
