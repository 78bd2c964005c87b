//! Square similarity matrix keyed by record id on both axes
//!
//! Entries are `Option<f64>`; `None` is the missing marker used for the
//! diagonal after standardization. Every write goes through
//! [`SimilarityMatrix::set_pair`], which updates `(i, j)` and `(j, i)` together.

use crate::{Error, RecordId, Result};
use ahash::AHashMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    ids: Vec<RecordId>,
    index: AHashMap<RecordId, usize>,
    values: Vec<Option<f64>>,
}

/// An unordered pair above a threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Link {
    pub source: RecordId,
    pub target: RecordId,
    pub value: f64,
}

impl SimilarityMatrix {
    /// Create an all-zero matrix over `ids`
    pub fn zeros(ids: Vec<RecordId>) -> Result<Self> {
        let mut index = AHashMap::with_capacity(ids.len());
        for (pos, id) in ids.iter().enumerate() {
            if index.insert(*id, pos).is_some() {
                return Err(Error::DuplicateId(id.get()));
            }
        }
        let n = ids.len();
        Ok(Self {
            ids,
            index,
            values: vec![Some(0.0); n * n],
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    #[inline]
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Entry at row `i`, column `j` (positions, not ids)
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values[i * self.len() + j]
    }

    pub fn get_by_id(&self, a: RecordId, b: RecordId) -> Option<f64> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        self.get(i, j)
    }

    /// Write `value` to both `(i, j)` and `(j, i)`
    #[inline]
    pub fn set_pair(&mut self, i: usize, j: usize, value: Option<f64>) {
        let n = self.len();
        self.values[i * n + j] = value;
        self.values[j * n + i] = value;
    }

    pub fn set_diagonal(&mut self, value: Option<f64>) {
        let n = self.len();
        for i in 0..n {
            self.values[i * n + i] = value;
        }
    }

    pub fn row(&self, i: usize) -> &[Option<f64>] {
        let n = self.len();
        &self.values[i * n..(i + 1) * n]
    }

    /// Present entries with `i != j`, row-major
    pub fn off_diagonal_values(&self) -> impl Iterator<Item = f64> + '_ {
        let n = self.len();
        self.values
            .iter()
            .enumerate()
            .filter(move |(k, _)| k / n != k % n)
            .filter_map(|(_, v)| *v)
    }

    /// Apply `f` to every present off-diagonal entry
    pub fn map_off_diagonal(&mut self, f: impl Fn(f64) -> f64) {
        let n = self.len();
        for (k, v) in self.values.iter_mut().enumerate() {
            if k / n != k % n {
                *v = v.map(&f);
            }
        }
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| {
            (i + 1..n).all(|j| match (self.get(i, j), self.get(j, i)) {
                (Some(a), Some(b)) => a == b || (a.is_nan() && b.is_nan()),
                (None, None) => true,
                _ => false,
            })
        })
    }

    /// Most similar records to `id`, descending, skipping the diagonal and
    /// missing entries. `threshold` drops values below it.
    pub fn neighbors(
        &self,
        id: RecordId,
        k: usize,
        threshold: Option<f64>,
    ) -> Result<Vec<(RecordId, f64)>> {
        let i = self.position(id).ok_or(Error::RecordNotFound(id.get()))?;
        let mut result: Vec<(RecordId, f64)> = self
            .row(i)
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .filter_map(|(j, v)| v.map(|v| (self.ids[j], v)))
            .filter(|(_, v)| threshold.map_or(true, |t| *v >= t))
            .collect();

        result.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        result.truncate(k);
        Ok(result)
    }

    /// Every unordered pair `i < j` whose value is at least `threshold`
    pub fn links(&self, threshold: f64) -> Vec<Link> {
        let n = self.len();
        let mut links = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                if let Some(value) = self.get(i, j) {
                    if value >= threshold {
                        links.push(Link {
                            source: self.ids[i],
                            target: self.ids[j],
                            value,
                        });
                    }
                }
            }
        }
        links
    }
}
