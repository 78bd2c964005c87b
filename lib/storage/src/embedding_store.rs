use crate::{atomic_write, csv_error};
use ahash::AHashSet;
use std::path::{Path, PathBuf};
use studysim_core::{Error, Record, RecordId, Result, Vector};
use tracing::{debug, info, warn};

pub const DEFAULT_EMBEDDING_COLUMN: &str = "Embedding";
const ID_COLUMN: &str = "ID";
const ABSTRACT_COLUMN: &str = "Abstract";

/// One cached row
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEmbedding {
    pub id: RecordId,
    pub abstract_text: String,
    pub embedding: Vector,
}

/// Append-only cache of abstract embeddings backed by a CSV file.
///
/// Rows already present are never replaced. New rows live in memory until
/// [`EmbeddingStore::persist`] rewrites the whole file atomically.
#[derive(Debug)]
pub struct EmbeddingStore {
    path: PathBuf,
    embedding_column: String,
    entries: Vec<StoredEmbedding>,
    ids: AHashSet<RecordId>,
    dirty: bool,
}

impl EmbeddingStore {
    /// Open an existing store. A missing or zero-byte file is fatal.
    pub fn open<P: AsRef<Path>>(path: P, embedding_column: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(Error::NotFound(path));
        }
        if std::fs::metadata(&path)?.len() == 0 {
            return Err(Error::EmptyFile(path));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .map_err(csv_error)?;
        let headers = reader.headers().map_err(csv_error)?.clone();
        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| Error::MissingColumn {
                    column: name.to_string(),
                    path: path.clone(),
                })
        };
        let id_index = column(ID_COLUMN)?;
        let embedding_index = column(embedding_column)?;
        let abstract_index = headers.iter().position(|h| h == ABSTRACT_COLUMN);

        let mut store = Self {
            path: path.clone(),
            embedding_column: embedding_column.to_string(),
            entries: Vec::new(),
            ids: AHashSet::new(),
            dirty: false,
        };

        for row in reader.records() {
            let row = row.map_err(csv_error)?;
            let line = row.position().map_or(0, |p| p.line());

            let raw_id = row.get(id_index).unwrap_or_default();
            let id: RecordId = raw_id.parse().map_err(|_| Error::InvalidId {
                line,
                value: raw_id.to_string(),
            })?;
            let embedding = parse_embedding(row.get(embedding_index).unwrap_or_default())
                .ok_or_else(|| {
                    Error::Serialization(format!("line {line}: unreadable embedding for id {id}"))
                })?;

            if store.ids.contains(&id) {
                warn!(%id, line, "Duplicate id in embedding store, keeping the first row");
                continue;
            }
            if let Some(dim) = store.dim() {
                if embedding.dim() != dim {
                    return Err(Error::InvalidDimension {
                        expected: dim,
                        actual: embedding.dim(),
                    });
                }
            }

            store.ids.insert(id);
            store.entries.push(StoredEmbedding {
                id,
                abstract_text: abstract_index
                    .and_then(|i| row.get(i))
                    .unwrap_or_default()
                    .to_string(),
                embedding,
            });
        }

        info!(path = %path.display(), embeddings = store.len(), "Embedding store loaded");
        Ok(store)
    }

    /// Write an empty store (header only) if the file is missing or zero-byte, then open it
    pub fn create<P: AsRef<Path>>(path: P, embedding_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let blank = match std::fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if blank {
            let mut empty = Self {
                path: path.to_path_buf(),
                embedding_column: embedding_column.to_string(),
                entries: Vec::new(),
                ids: AHashSet::new(),
                dirty: true,
            };
            empty.persist()?;
            info!(path = %path.display(), "Created empty embedding store");
        }
        Self::open(path, embedding_column)
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Embedding dimension of the stored rows, if any
    pub fn dim(&self) -> Option<usize> {
        self.entries.first().map(|e| e.embedding.dim())
    }

    pub fn entries(&self) -> &[StoredEmbedding] {
        &self.entries
    }

    /// `(id, vector)` pairs in store order
    pub fn vectors(&self) -> Vec<(RecordId, &Vector)> {
        self.entries.iter().map(|e| (e.id, &e.embedding)).collect()
    }

    /// Ids of `records` that have no cached embedding, in dataset order
    pub fn missing_ids(&self, records: &[Record]) -> Vec<RecordId> {
        records
            .iter()
            .map(|r| r.id)
            .filter(|id| !self.contains(*id))
            .collect()
    }

    /// Append a new row. Returns `false` (and changes nothing) if the id is
    /// already cached; a vector of the wrong dimension is an error.
    pub fn append(&mut self, entry: StoredEmbedding) -> Result<bool> {
        if self.contains(entry.id) {
            return Ok(false);
        }
        if entry.embedding.is_empty() {
            return Err(Error::InvalidDimension {
                expected: self.dim().unwrap_or(1),
                actual: 0,
            });
        }
        if let Some(dim) = self.dim() {
            if entry.embedding.dim() != dim {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    actual: entry.embedding.dim(),
                });
            }
        }

        debug!(id = %entry.id, dim = entry.embedding.dim(), "Appending embedding");
        self.ids.insert(entry.id);
        self.entries.push(entry);
        self.dirty = true;
        Ok(true)
    }

    /// Rewrite the whole file atomically. No-op when nothing changed.
    pub fn persist(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let header = [ID_COLUMN, ABSTRACT_COLUMN, self.embedding_column.as_str()];
        let entries = &self.entries;
        atomic_write(&self.path, |writer| {
            writer.write_record(header).map_err(csv_error)?;
            for entry in entries {
                let embedding = serde_json::to_string(&entry.embedding)?;
                writer
                    .write_record([
                        entry.id.to_string().as_str(),
                        entry.abstract_text.as_str(),
                        embedding.as_str(),
                    ])
                    .map_err(csv_error)?;
            }
            Ok(())
        })?;

        self.dirty = false;
        info!(path = %self.path.display(), embeddings = self.len(), "Embedding store persisted");
        Ok(())
    }
}

/// Parse a stored vector: a JSON array, or bracketed whitespace-separated floats
fn parse_embedding(cell: &str) -> Option<Vector> {
    let cell = cell.trim();
    if let Ok(values) = serde_json::from_str::<Vec<f32>>(cell) {
        return Some(Vector::new(values)).filter(|v| !v.is_empty());
    }

    let inner = cell.strip_prefix('[')?.strip_suffix(']')?;
    inner
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<f32>().ok())
        .collect::<Option<Vec<f32>>>()
        .map(Vector::new)
        .filter(|v| !v.is_empty())
}
