use serde::{Deserialize, Serialize};

/// A dense embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Compute cosine similarity with another vector.
    /// Returns 0.0 for mismatched dimensions or zero-norm vectors.
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> f64 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let dot = dot_product(&self.data, &other.data);
        let norm_a = self.norm();
        let norm_b = other.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        dot_product(&self.data, &self.data).sqrt()
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}

/// Dot product accumulated in f64 with two accumulators for better pipelining
#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f64 {
    let mut sum0 = 0.0f64;
    let mut sum1 = 0.0f64;

    let chunks_a = a.chunks_exact(2);
    let chunks_b = b.chunks_exact(2);
    let rem_a = chunks_a.remainder();
    let rem_b = chunks_b.remainder();

    for (x, y) in chunks_a.zip(chunks_b) {
        sum0 += f64::from(x[0]) * f64::from(y[0]);
        sum1 += f64::from(x[1]) * f64::from(y[1]);
    }
    for (x, y) in rem_a.iter().zip(rem_b) {
        sum0 += f64::from(*x) * f64::from(*y);
    }

    sum0 + sum1
}
