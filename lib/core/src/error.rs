use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("File is empty: {0}")]
    EmptyFile(PathBuf),

    #[error("Missing column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Invalid record id {value:?} on line {line}")]
    InvalidId { line: u64, value: String },

    #[error("Duplicate record id: {0}")]
    DuplicateId(u64),

    #[error("Record not found: {0}")]
    RecordNotFound(u64),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Matrix shape mismatch: {0}")]
    Shape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
