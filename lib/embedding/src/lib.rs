//! # studysim Embedding
//!
//! Abstract embeddings for the study dataset: the [`EmbeddingProvider`]
//! seam, a Gemini REST implementation and the [`CacheUpdater`] that keeps
//! the append-only embedding store in sync with the dataset.

pub mod error;
pub mod gemini;
pub mod provider;
pub mod updater;

pub use error::EmbeddingError;
pub use gemini::{GeminiClient, GeminiConfig};
pub use provider::{EmbeddingProvider, TaskType};
pub use updater::{CacheUpdater, UpdateReport, UpdaterConfig};
