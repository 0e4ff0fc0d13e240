use crate::client::OllamaClient;
use crate::error::SynthesisError;
use crate::prompt::{NOT_FOUND_ANSWER, build_answer_prompt};
use async_trait::async_trait;
use codescout_retrieval::RankedChunk;
use log::info;

/// Produces a grounded natural-language answer from ranked chunks.
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    /// Answer `question` using only the given chunks.
    async fn synthesize(
        &self,
        question: &str,
        results: &[RankedChunk],
    ) -> Result<String, SynthesisError>;
}

/// Answer synthesizer backed by a local model through Ollama.
pub struct OllamaSynthesizer {
    client: OllamaClient,
}

impl OllamaSynthesizer {
    /// Create a synthesizer over the given client.
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnswerSynthesizer for OllamaSynthesizer {
    async fn synthesize(
        &self,
        question: &str,
        results: &[RankedChunk],
    ) -> Result<String, SynthesisError> {
        // No retrieved code means nothing to ground an answer in; don't ask
        // the model to make one up.
        if results.is_empty() {
            return Ok(NOT_FOUND_ANSWER.to_string());
        }

        info!(
            "Synthesizing answer from {} chunks with model '{}'",
            results.len(),
            self.client.model()
        );
        let prompt = build_answer_prompt(question, results);
        self.client.generate(&prompt).await
    }
}
