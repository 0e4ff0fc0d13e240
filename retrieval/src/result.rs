use codescout_vector_index::CodeChunk;
use serde::{Deserialize, Serialize};

/// Per-candidate score provenance, kept alongside every returned chunk so
/// callers can see how the final ordering came about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Raw index distance (lower = closer)
    pub dense_distance: f32,

    /// Min-max normalized dense similarity in [0, 1]
    pub dense_similarity: f32,

    /// Raw BM25 score over the expanded candidate corpus
    pub lexical_raw: f32,

    /// BM25 score normalized by the batch maximum, in [0, 1]
    pub lexical_norm: f32,

    /// Structural boost from the chunk kind table
    pub kind_boost: f32,

    /// Sum of matching path-substring boosts
    pub domain_boost: f32,

    /// Min-max normalized base score, in [0, 1]
    pub base_norm: f32,

    /// Normalized cross-encoder score, when re-ranking ran
    pub rerank_norm: Option<f32>,

    /// The score the final ordering is based on
    pub final_score: f32,
}

/// A chunk in the final ranked output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedChunk {
    /// The retrieved chunk
    pub chunk: CodeChunk,

    /// Rank in the result list (0 = best)
    pub rank: usize,

    /// Score provenance
    pub scores: ScoreBreakdown,
}

/// Result of one search call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Query as submitted by the caller
    pub query: String,

    /// Query actually used for retrieval (after rewriting, if any)
    pub refined_query: String,

    /// Ranked chunks, best first, at most `k`
    pub results: Vec<RankedChunk>,

    /// True when the candidate filter rejected everything and the raw
    /// seed top-k was returned instead
    pub filter_bypassed: bool,

    /// Search statistics
    pub stats: SearchStats,
}

impl SearchOutcome {
    /// Get top N results
    pub fn top(&self, n: usize) -> &[RankedChunk] {
        &self.results[..n.min(self.results.len())]
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.results.len()
    }
}

/// Search performance statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Total search time in milliseconds
    pub total_time_ms: u64,

    /// Call-graph expansion time in milliseconds
    pub expand_time_ms: u64,

    /// BM25 + fusion time in milliseconds
    pub fusion_time_ms: u64,

    /// Reranking time in milliseconds
    pub rerank_time_ms: u64,

    /// Candidates returned by the seed query
    pub seed_count: usize,

    /// Candidates surviving the repo/path filter
    pub filtered_count: usize,

    /// Size of the expanded candidate set (seeds + discovered)
    pub expanded_count: usize,

    /// Chunks discovered by call-graph expansion
    pub discovered_count: usize,

    /// Symbol lookups skipped due to failures, timeouts or cancellation
    pub symbols_skipped: usize,

    /// Whether the rewriter produced the refined query
    pub rewrite_applied: bool,

    /// Whether cross-encoder scores made it into the final blend
    pub rerank_applied: bool,

    /// Whether expansion stopped early due to cancellation
    pub cancelled: bool,
}
