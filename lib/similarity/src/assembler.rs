//! Matrix Assembler
//!
//! Builds the raw feature-similarity matrix: diagonal 1.0, each unordered
//! pair scored once and mirrored. Rows of the upper triangle are scored in
//! parallel; all writes happen afterwards on the owning thread.

use crate::features::FeatureTable;
use crate::schema::ColumnSchema;
use crate::scorer::PairwiseScorer;
use rayon::prelude::*;
use studysim_core::{Moments, Record, Result, SimilarityMatrix, Standardizer};
use tracing::info;

/// Score every unordered pair of `table` into a symmetric matrix
pub fn assemble(table: &FeatureTable, scorer: &PairwiseScorer) -> Result<SimilarityMatrix> {
    let mut matrix = SimilarityMatrix::zeros(table.ids())?;
    matrix.set_diagonal(Some(1.0));

    let records = table.records();
    let n = records.len();
    let scores: Vec<(usize, usize, f64)> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            (i + 1..n).map(move |j| (i, j, scorer.score(&records[i], &records[j])))
        })
        .collect();

    for (i, j, score) in scores {
        matrix.set_pair(i, j, Some(score));
    }

    Ok(matrix)
}

/// Raw and standardized feature-similarity matrices
#[derive(Debug, Clone)]
pub struct FeatureSimilarity {
    pub raw: SimilarityMatrix,
    pub standardized: SimilarityMatrix,
    pub moments: Moments,
    pub scorer: PairwiseScorer,
}

/// Transform, score, assemble and standardize in one pass
pub fn build_feature_similarity(
    records: &[Record],
    schema: &ColumnSchema,
    standardizer: &Standardizer,
) -> Result<FeatureSimilarity> {
    let table = FeatureTable::from_records(records, schema);
    let scorer = PairwiseScorer::new(table.layout().clone());
    let raw = assemble(&table, &scorer)?;
    let (standardized, moments) = standardizer.standardize(&raw);

    info!(
        records = raw.len(),
        features = scorer.layout().total_features(),
        mean = moments.mean,
        std_dev = moments.std_dev,
        "Feature similarity matrix computed"
    );

    Ok(FeatureSimilarity {
        raw,
        standardized,
        moments,
        scorer,
    })
}
