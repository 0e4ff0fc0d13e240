use thiserror::Error;

/// Errors that can occur during vector index operations
#[derive(Debug, Error)]
pub enum IndexError {
    /// Failed to initialize the index
    #[error("Failed to initialize index: {0}")]
    Initialization(String),

    /// Failed to add records to the index
    #[error("Failed to add records: {0}")]
    AdditionFailed(String),

    /// Failed to run a nearest-neighbor query
    #[error("Failed to query index: {0}")]
    QueryFailed(String),

    /// Query vector dimension does not match the index
    #[error("Dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
