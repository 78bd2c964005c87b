//! Pipeline configuration
//!
//! Loaded from an optional JSON file; every field has a default so an empty
//! object (or no file at all) yields the earable-study setup.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use studysim_core::{Standardizer, ZeroVariancePolicy};
use studysim_embedding::{GeminiConfig, UpdaterConfig};
use studysim_similarity::ColumnSchema;
use studysim_storage::{default_missing_markers, DatasetOptions, DEFAULT_EMBEDDING_COLUMN};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub dataset: PathBuf,
    pub embedding_store: PathBuf,
    pub feature_matrix: PathBuf,
    pub abstract_matrix: PathBuf,
    /// Unstandardized cosine matrix, written only when set
    pub abstract_raw_matrix: Option<PathBuf>,
    pub missing_markers: Vec<String>,
    pub schema: ColumnSchema,
    pub standardize: StandardizeConfig,
    pub embedding: EmbeddingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data.csv"),
            embedding_store: PathBuf::from("abstract_embeddings.csv"),
            feature_matrix: PathBuf::from("feature_similarity_standardized.csv"),
            abstract_matrix: PathBuf::from("abstract_similarity_standardized.csv"),
            abstract_raw_matrix: Some(PathBuf::from("abstract_similarity.csv")),
            missing_markers: default_missing_markers(),
            schema: ColumnSchema::default(),
            standardize: StandardizeConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StandardizeConfig {
    pub zero_variance: ZeroVariancePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    #[serde(flatten)]
    pub provider: GeminiConfig,
    #[serde(flatten)]
    pub updater: UpdaterConfig,
    /// Header of the vector column in the embedding store
    pub embedding_column: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: GeminiConfig::default(),
            updater: UpdaterConfig::default(),
            embedding_column: DEFAULT_EMBEDDING_COLUMN.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Read `path` if given, otherwise use the defaults. The result is validated.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.schema.validate().context("invalid column schema")?;
        if self.embedding.updater.concurrency == 0 {
            bail!("embedding.concurrency must be at least 1");
        }
        if self.embedding.updater.timeout_secs == 0 {
            bail!("embedding.timeout_secs must be at least 1");
        }
        if self.embedding.embedding_column.trim().is_empty() {
            bail!("embedding.embedding_column must not be empty");
        }
        Ok(())
    }

    pub fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            id_column: self.schema.id_column.clone(),
            abstract_column: self.schema.abstract_column.clone(),
            missing_markers: self.missing_markers.clone(),
            require_abstract: false,
        }
    }

    pub fn standardizer(&self) -> Standardizer {
        Standardizer::new(self.standardize.zero_variance)
    }
}
