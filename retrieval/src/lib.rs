/*!
# CodeScout Retrieval

Hybrid retrieval and ranking engine for semantic code search combining:
- **Dense retrieval** via vector embeddings for conceptual similarity
- **Lexical scoring** via Okapi BM25 over the candidate set
- **Call-graph expansion** that follows call sites to pull in callees
- **Structural and path boosts** for definition-shaped results
- **Optional cross-encoder re-ranking** blended into the final score

## Architecture

```text
Query
  └─> Rewrite (optional, best-effort)
        └─> Dense seed query (k * multiplier candidates)
              └─> Repo/path filter (falls back to raw seeds if empty)
                    └─> Call-graph BFS expansion (bounded depth + fan-out)
                          └─> Fusion (dense + BM25 + boosts)
                                └─> Reranking (optional, best-effort)
                                      └─> Top-k selection
```

## Example

```rust,no_run
use codescout_embeddings::EmbeddingService;
use codescout_retrieval::{RetrievalConfig, SearchEngine, SearchRequest};
use codescout_vector_index::JsonVectorIndex;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let embedder = Arc::new(EmbeddingService::new().await?);
    let index = Arc::new(JsonVectorIndex::open(Path::new("index.json")).await?);

    let engine = SearchEngine::new(embedder, index, RetrievalConfig::default())?;
    let outcome = engine
        .search(&SearchRequest::new("how are request headers prepared", 8))
        .await?;

    for result in outcome.top(5) {
        println!("{}. {} ({:.2})", result.rank + 1, result.chunk.path, result.scores.final_score);
    }

    Ok(())
}
```
*/

pub mod config;
pub mod engine;
pub mod error;
pub mod expand;
pub mod filter;
pub mod fusion;
pub mod lexical;
pub mod rerank;
pub mod result;
pub mod rewrite;
pub mod select;
pub mod symbols;

pub use config::{DomainBoost, KindBoosts, RetrievalConfig};
pub use engine::{SearchEngine, SearchRequest};
pub use error::{Result, RetrievalError};
pub use expand::{CallGraphExpander, ExpansionOutcome, matches_symbol};
pub use filter::CandidateFilter;
pub use fusion::{Candidate, FusionEngine};
pub use rerank::{ContextualReranker, RerankError, Reranker};
pub use result::{RankedChunk, ScoreBreakdown, SearchOutcome, SearchStats};
pub use rewrite::{QueryRewriter, RewriteError};
pub use symbols::{CallSiteExtractor, SymbolExtractor};
