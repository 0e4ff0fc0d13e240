use async_trait::async_trait;
use thiserror::Error;

/// Errors from a query-rewriting backend.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Rewrite model unavailable: {0}")]
    Unavailable(String),

    #[error("Rewrite request failed: {0}")]
    Request(String),
}

/// Turns a conversational question into a retrieval-friendly query.
///
/// Rewriting is best-effort: when a call fails or returns an empty string,
/// the engine retrieves with the original query instead of failing.
#[async_trait]
pub trait QueryRewriter: Send + Sync {
    /// Rewrite `query` for retrieval.
    async fn rewrite(&self, query: &str) -> Result<String, RewriteError>;
}
