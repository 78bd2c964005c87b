//! Embedding Similarity Builder
//!
//! Cosine similarity over every cached abstract embedding, diagonal nulled,
//! then standardized with the same [`Standardizer`] as the feature matrix.

use rayon::prelude::*;
use studysim_core::{Error, Moments, RecordId, Result, SimilarityMatrix, Standardizer, Vector};
use tracing::info;

/// Pairwise cosine similarity; the diagonal is missing
pub fn cosine_matrix(entries: &[(RecordId, &Vector)]) -> Result<SimilarityMatrix> {
    if let Some((_, first)) = entries.first() {
        let expected = first.dim();
        if let Some((_, bad)) = entries.iter().find(|(_, v)| v.dim() != expected) {
            return Err(Error::InvalidDimension {
                expected,
                actual: bad.dim(),
            });
        }
    }

    let mut matrix = SimilarityMatrix::zeros(entries.iter().map(|(id, _)| *id).collect())?;
    let n = entries.len();
    let sims: Vec<(usize, usize, f64)> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            (i + 1..n).map(move |j| (i, j, entries[i].1.cosine_similarity(entries[j].1)))
        })
        .collect();

    for (i, j, sim) in sims {
        matrix.set_pair(i, j, Some(sim));
    }
    matrix.set_diagonal(None);

    Ok(matrix)
}

/// Raw cosine and standardized abstract-similarity matrices
#[derive(Debug, Clone)]
pub struct AbstractSimilarity {
    pub raw: SimilarityMatrix,
    pub standardized: SimilarityMatrix,
    pub moments: Moments,
}

pub fn build_abstract_similarity(
    entries: &[(RecordId, &Vector)],
    standardizer: &Standardizer,
) -> Result<AbstractSimilarity> {
    let raw = cosine_matrix(entries)?;
    let (standardized, moments) = standardizer.standardize(&raw);

    info!(
        records = raw.len(),
        mean = moments.mean,
        std_dev = moments.std_dev,
        "Abstract similarity matrix computed"
    );

    Ok(AbstractSimilarity {
        raw,
        standardized,
        moments,
    })
}
