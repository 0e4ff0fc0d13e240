use crate::client::OllamaClient;
use crate::error::SynthesisError;
use crate::prompt::build_rewrite_prompt;
use async_trait::async_trait;
use codescout_retrieval::{QueryRewriter, RewriteError};
use log::debug;

/// Query rewriter backed by a local code model through Ollama.
pub struct OllamaRewriter {
    client: OllamaClient,
}

impl OllamaRewriter {
    /// Create a rewriter over the given client.
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

/// Models occasionally echo quotes or a label around the refined query;
/// keep only the first non-empty line, stripped of decoration.
fn clean_rewrite(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| {
            line.trim_start_matches("Refined:")
                .trim()
                .trim_matches('"')
                .to_string()
        })
        .unwrap_or_default()
}

#[async_trait]
impl QueryRewriter for OllamaRewriter {
    async fn rewrite(&self, query: &str) -> Result<String, RewriteError> {
        let prompt = build_rewrite_prompt(query);
        let raw = self.client.generate(&prompt).await.map_err(|err| match err {
            SynthesisError::Http(err) => RewriteError::Unavailable(err.to_string()),
            other => RewriteError::Request(other.to_string()),
        })?;

        let refined = clean_rewrite(&raw);
        debug!("Rewrote '{query}' -> '{refined}'");
        Ok(refined)
    }
}
