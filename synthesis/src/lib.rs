/*!
# CodeScout Synthesis

Answer synthesis and query rewriting over local models served by Ollama.

Two roles share one thin `/api/generate` client:
- **Query rewriting** turns conversational questions into retrieval-friendly
  queries before the search runs.
- **Answer synthesis** produces a strictly grounded, citation-bearing answer
  from the ranked chunks a search returned.

Both roles are best-effort from the search engine's point of view: rewriting
degrades to the original query, and synthesis is an optional layer on top of
the ranked results.
*/

pub mod client;
pub mod error;
pub mod prompt;
pub mod rewrite;
pub mod synthesize;

pub use client::{OllamaClient, OllamaConfig};
pub use error::SynthesisError;
pub use prompt::{NOT_FOUND_ANSWER, build_answer_prompt, build_rewrite_prompt, format_chunks};
pub use rewrite::OllamaRewriter;
pub use synthesize::{AnswerSynthesizer, OllamaSynthesizer};
