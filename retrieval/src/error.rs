use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The initial nearest-neighbor lookup failed; no candidates can exist
    /// without it, so the whole search call is unavailable.
    #[error("Seed vector query failed, search unavailable: {0}")]
    SeedQuery(String),

    #[error("Query too short: minimum {min} characters, got {actual}")]
    QueryTooShort { min: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] codescout_embeddings::EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] codescout_vector_index::IndexError),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
