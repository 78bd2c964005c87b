//! File-backed inputs and outputs: the study table, the embedding cache and
//! the similarity matrices. Every write goes through a temporary file that is
//! renamed into place, so readers never see a half-written CSV.

pub mod dataset;
pub mod embedding_store;
pub mod matrix_io;

pub use dataset::{default_missing_markers, load_dataset, DatasetOptions};
pub use embedding_store::{EmbeddingStore, StoredEmbedding, DEFAULT_EMBEDDING_COLUMN};
pub use matrix_io::{read_matrix, write_matrix};

use atomicwrites::{AtomicFile, OverwriteBehavior};
use std::fs::File;
use std::path::Path;
use studysim_core::{Error, Result};

pub(crate) fn csv_error(e: csv::Error) -> Error {
    Error::Csv(e.to_string())
}

/// Write a CSV file atomically, creating parent directories as needed
pub(crate) fn atomic_write<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut csv::Writer<&mut File>) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|file| {
            let mut writer = csv::WriterBuilder::new().from_writer(file);
            fill(&mut writer)?;
            writer.flush()?;
            Ok(())
        })
        .map_err(|e| match e {
            atomicwrites::Error::Internal(io) => Error::Io(io),
            atomicwrites::Error::User(e) => e,
        })
}
