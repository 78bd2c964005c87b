use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use studysim_core::Vector;

/// Hint sent with each request describing how the vector will be used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    #[default]
    Clustering,
    SemanticSimilarity,
    Classification,
    RetrievalDocument,
    RetrievalQuery,
}

/// Source of text embeddings.
///
/// Implementations must be shareable across the in-flight requests of one
/// batch; the updater never calls `embed` concurrently for the same record.
pub trait EmbeddingProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    fn embed(
        &self,
        text: &str,
        task: TaskType,
    ) -> impl Future<Output = Result<Vector, EmbeddingError>> + Send;
}
