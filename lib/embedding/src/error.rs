use thiserror::Error;

/// Failure of a single embedding request
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Provider returned an empty embedding")]
    EmptyEmbedding,

    #[error("Environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl EmbeddingError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::Http(e) => !e.is_decode() && !e.is_builder(),
            EmbeddingError::Status { status, .. } => *status == 429 || *status >= 500,
            EmbeddingError::Timeout(_) => true,
            EmbeddingError::EmptyEmbedding
            | EmbeddingError::MissingApiKey(_)
            | EmbeddingError::Provider(_) => false,
        }
    }
}
