//! # studysim
//!
//! Batch pipeline that keeps two similarity matrices over a research-study
//! dataset up to date:
//!
//! - a **feature-similarity** matrix built from tabular columns (ordinal
//!   tokens, exact-match values, log-scaled counts, comma separated sets)
//! - an **abstract-similarity** matrix built from cached text embeddings
//!
//! Both are z-score standardized over their off-diagonal entries and written
//! as labelled CSV files.
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! studysim --config pipeline.json run
//! studysim similar --matrix feature_similarity_standardized.csv --id 12 --top 5
//! ```
//!
//! ## Crate Structure
//!
//! - `studysim-core` - records, vectors, similarity matrices, standardization
//! - `studysim-similarity` - column schema, value transforms, pairwise scoring
//! - `studysim-storage` - dataset loading, embedding store, matrix files
//! - `studysim-embedding` - embedding providers and the cache updater

pub mod config;
pub mod pipeline;

pub use config::{EmbeddingConfig, PipelineConfig, StandardizeConfig};
pub use pipeline::{explain_pair, load_records, run_abstracts, run_features, AbstractOutcome};

pub use studysim_core::{
    Error, Link, Moments, Record, RecordId, Result, SimilarityMatrix, Standardizer, Vector,
    ZeroVariancePolicy,
};
pub use studysim_embedding::{
    CacheUpdater, EmbeddingError, EmbeddingProvider, GeminiClient, TaskType, UpdateReport,
};
pub use studysim_similarity::{ColumnSchema, FeatureSimilarity, PairExplanation, PairwiseScorer};
pub use studysim_storage::{load_dataset, read_matrix, write_matrix, EmbeddingStore};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CacheUpdater, ColumnSchema, EmbeddingProvider, EmbeddingStore, PipelineConfig, Record,
        RecordId, SimilarityMatrix, Standardizer, Vector,
    };
}
