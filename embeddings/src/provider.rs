use crate::error::EmbeddingError;
use async_trait::async_trait;

/// Abstract text-to-vector collaborator injected into the retrieval core.
///
/// Implementations must be deterministic for a given input and must accept
/// single-element batches; the call-graph expander embeds bare symbol names
/// one at a time.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate one embedding per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Dimension of the vectors produced by this provider.
    fn dimension(&self) -> usize;
}
