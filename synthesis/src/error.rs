use thiserror::Error;

/// Errors from the answer synthesis backend.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// HTTP transport failure talking to the model server
    #[error("Model request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The model server returned an error payload
    #[error("Model backend error: {0}")]
    Backend(String),

    /// The model produced no usable text
    #[error("Model returned an empty response")]
    EmptyResponse,
}
