use async_trait::async_trait;
use codescout_vector_index::CodeChunk;
use thiserror::Error;

/// Errors from a cross-encoder re-ranking backend.
#[derive(Debug, Error)]
pub enum RerankError {
    #[error("Rerank model unavailable: {0}")]
    Unavailable(String),

    #[error("Rerank scoring failed: {0}")]
    Scoring(String),
}

/// Cross-encoder scorer over (query, chunk) pairs.
///
/// Re-ranking is an optional refinement: when a call fails, the engine logs
/// it and falls back to base-score ordering instead of failing the search.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// One raw relevance score per chunk, in input order.
    async fn score(&self, query: &str, chunks: &[CodeChunk]) -> Result<Vec<f32>, RerankError>;
}

/// Lightweight contextual scorer standing in for a model-backed
/// cross-encoder: scores each chunk by how many query tokens its symbol
/// name, path and content cover, with symbol hits weighted highest.
pub struct ContextualReranker;

impl ContextualReranker {
    /// Create a contextual reranker
    pub fn new() -> Self {
        Self
    }

    fn score_one(query_tokens: &[String], chunk: &CodeChunk) -> f32 {
        if query_tokens.is_empty() {
            return 0.0;
        }

        let name = chunk.name.to_lowercase();
        let qualified = chunk
            .qualified_name
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        let path = chunk.path.to_lowercase();
        let content = chunk.content.to_lowercase();

        let mut score = 0.0;
        for token in query_tokens {
            if name.contains(token.as_str()) || qualified.contains(token.as_str()) {
                score += 3.0;
            } else if path.contains(token.as_str()) {
                score += 2.0;
            } else if content.contains(token.as_str()) {
                score += 1.0;
            }
        }
        score / query_tokens.len() as f32
    }
}

impl Default for ContextualReranker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reranker for ContextualReranker {
    async fn score(&self, query: &str, chunks: &[CodeChunk]) -> Result<Vec<f32>, RerankError> {
        let query_tokens = crate::lexical::tokenize(query);
        Ok(chunks
            .iter()
            .map(|chunk| Self::score_one(&query_tokens, chunk))
            .collect())
    }
}
