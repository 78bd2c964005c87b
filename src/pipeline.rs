//! Pipeline orchestration: load, compute, persist.

use crate::config::PipelineConfig;
use anyhow::Context;
use studysim_core::{Error, Record, RecordId};
use studysim_embedding::{CacheUpdater, EmbeddingProvider, UpdateReport};
use studysim_similarity::{
    build_abstract_similarity, build_feature_similarity, AbstractSimilarity, FeatureSimilarity,
    FeatureTable, PairExplanation, PairwiseScorer,
};
use studysim_storage::{load_dataset, write_matrix, DatasetOptions, EmbeddingStore};
use tracing::{info, warn};

pub fn load_records(config: &PipelineConfig) -> anyhow::Result<Vec<Record>> {
    load_records_with(config, &config.dataset_options())
}

fn load_records_with(
    config: &PipelineConfig,
    options: &DatasetOptions,
) -> anyhow::Result<Vec<Record>> {
    load_dataset(&config.dataset, options)
        .with_context(|| format!("loading dataset {}", config.dataset.display()))
}

/// Compute the standardized feature-similarity matrix and write it out
pub fn run_features(config: &PipelineConfig) -> anyhow::Result<FeatureSimilarity> {
    let records = load_records(config)?;
    let result = build_feature_similarity(&records, &config.schema, &config.standardizer())
        .context("computing feature similarity")?;

    write_matrix(&config.feature_matrix, &result.standardized).with_context(|| {
        format!("writing feature matrix {}", config.feature_matrix.display())
    })?;
    info!(path = %config.feature_matrix.display(), "Feature similarity saved");

    Ok(result)
}

#[derive(Debug)]
pub struct AbstractOutcome {
    pub report: UpdateReport,
    pub similarity: AbstractSimilarity,
}

/// Bring the embedding store up to date, then compute and write the
/// abstract-similarity matrices. With `init_store` a missing store file is
/// created empty instead of failing.
pub async fn run_abstracts<P: EmbeddingProvider>(
    config: &PipelineConfig,
    updater: &CacheUpdater<P>,
    init_store: bool,
) -> anyhow::Result<AbstractOutcome> {
    let options = DatasetOptions {
        require_abstract: true,
        ..config.dataset_options()
    };
    let records = load_records_with(config, &options)?;

    let store_path = &config.embedding_store;
    let column = &config.embedding.embedding_column;
    let mut store = if init_store {
        EmbeddingStore::create(store_path, column)
    } else {
        EmbeddingStore::open(store_path, column)
    }
    .with_context(|| format!("opening embedding store {}", store_path.display()))?;

    let report = updater
        .update(&records, &mut store)
        .await
        .context("updating embedding store")?;
    if !report.is_complete() {
        let failed: Vec<RecordId> = report.failed.iter().map(|(id, _)| *id).collect();
        warn!(?failed, "Some abstracts could not be embedded");
    }

    let similarity = build_abstract_similarity(&store.vectors(), &config.standardizer())
        .context("computing abstract similarity")?;

    write_matrix(&config.abstract_matrix, &similarity.standardized).with_context(|| {
        format!("writing abstract matrix {}", config.abstract_matrix.display())
    })?;
    if let Some(raw_path) = &config.abstract_raw_matrix {
        write_matrix(raw_path, &similarity.raw)
            .with_context(|| format!("writing raw abstract matrix {}", raw_path.display()))?;
    }
    info!(path = %config.abstract_matrix.display(), "Abstract similarity saved");

    Ok(AbstractOutcome { report, similarity })
}

/// Per-column breakdown of the raw feature score of one pair
pub fn explain_pair(
    config: &PipelineConfig,
    a: RecordId,
    b: RecordId,
) -> anyhow::Result<PairExplanation> {
    let records = load_records(config)?;
    let table = FeatureTable::from_records(&records, &config.schema);
    let scorer = PairwiseScorer::new(table.layout().clone());

    let left = table.get(a).ok_or(Error::RecordNotFound(a.get()))?;
    let right = table.get(b).ok_or(Error::RecordNotFound(b.get()))?;
    Ok(scorer.explain(left, right))
}
