use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};
use crate::expand::CallGraphExpander;
use crate::filter::CandidateFilter;
use crate::fusion::{FusionEngine, invert_min_max};
use crate::rerank::Reranker;
use crate::result::{RankedChunk, ScoreBreakdown, SearchOutcome, SearchStats};
use crate::rewrite::QueryRewriter;
use crate::select::top_k;
use crate::symbols::{CallSiteExtractor, SymbolExtractor};
use codescout_embeddings::EmbeddingProvider;
use codescout_vector_index::{ScoredChunk, VectorIndex};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// One search call's parameters.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// The question or search phrase as the caller typed it
    pub query: String,

    /// Number of results to return
    pub k: usize,

    /// Restrict candidates to one repository
    pub repo: Option<String>,

    /// Whether the engine's reranker (if attached) should run for this call
    pub use_reranker: bool,
}

impl SearchRequest {
    /// Create a request for the top `k` chunks matching `query`.
    pub fn new(query: impl Into<String>, k: usize) -> Self {
        Self {
            query: query.into(),
            k,
            repo: None,
            use_reranker: true,
        }
    }

    /// Scope the request to a single repository.
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    /// Keep base-score ordering even when the engine has a reranker.
    pub fn without_rerank(mut self) -> Self {
        self.use_reranker = false;
        self
    }
}

/// Hybrid retrieval and ranking engine.
///
/// Pipeline: optional query rewrite, dense seed query, repo/path filtering,
/// call-graph expansion, score fusion, optional cross-encoder re-ranking,
/// top-k selection. Only the seed query is allowed to fail a search; every
/// other stage degrades and reports itself through [`SearchStats`].
pub struct SearchEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    rewriter: Option<Arc<dyn QueryRewriter>>,
    reranker: Option<Arc<dyn Reranker>>,
    filter: CandidateFilter,
    expander: CallGraphExpander,
    fusion: FusionEngine,
    config: RetrievalConfig,
}

impl SearchEngine {
    /// Create an engine over the given embedder and index.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: RetrievalConfig,
    ) -> Result<Self> {
        config.validate().map_err(RetrievalError::InvalidConfig)?;

        let extractor: Arc<dyn SymbolExtractor> = Arc::new(CallSiteExtractor::new());
        Ok(Self {
            filter: CandidateFilter::new(&config),
            expander: CallGraphExpander::new(
                Arc::clone(&embedder),
                Arc::clone(&index),
                extractor,
                config.clone(),
            ),
            fusion: FusionEngine::new(config.clone()),
            embedder,
            index,
            rewriter: None,
            reranker: None,
            config,
        })
    }

    /// Attach a query rewriter.
    pub fn with_rewriter(mut self, rewriter: Arc<dyn QueryRewriter>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    /// Attach a cross-encoder reranker.
    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Replace the call-site extractor used during expansion.
    pub fn with_extractor(mut self, extractor: Arc<dyn SymbolExtractor>) -> Self {
        self.expander = CallGraphExpander::new(
            Arc::clone(&self.embedder),
            Arc::clone(&self.index),
            extractor,
            self.config.clone(),
        );
        self
    }

    /// Run a search to completion.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        self.search_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Run a search, stopping expansion early when `cancel` fires.
    ///
    /// Cancellation mid-expansion is not an error: whatever candidates exist
    /// at that point are ranked and returned, with `stats.cancelled` set.
    pub async fn search_with_cancel(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        let started = Instant::now();
        let mut stats = SearchStats::default();

        let query = request.query.trim();
        if query.chars().count() < self.config.min_query_length {
            return Err(RetrievalError::QueryTooShort {
                min: self.config.min_query_length,
                actual: query.chars().count(),
            });
        }

        let refined_query = self.refine_query(query, &mut stats).await;
        info!("Searching for '{refined_query}' (k={})", request.k);

        // Seed retrieval. This is the one stage that can fail the search:
        // without seeds there is nothing to rank.
        let seed_limit = (request.k * self.config.candidate_multiplier).max(request.k + 10);
        let query_vector = self
            .embedder
            .embed(&[refined_query.clone()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RetrievalError::SeedQuery("embedder returned no query vector".to_string())
            })?;
        let raw_seeds = self
            .index
            .query(&query_vector, seed_limit, request.repo.as_deref())
            .await
            .map_err(|err| RetrievalError::SeedQuery(err.to_string()))?;
        stats.seed_count = raw_seeds.len();

        let filtered = self
            .filter
            .apply(&raw_seeds, request.repo.as_deref(), &refined_query);
        stats.filtered_count = filtered.len();

        if filtered.is_empty() {
            if raw_seeds.is_empty() {
                stats.total_time_ms = started.elapsed().as_millis() as u64;
                return Ok(SearchOutcome {
                    query: request.query.clone(),
                    refined_query,
                    results: Vec::new(),
                    filter_bypassed: false,
                    stats,
                });
            }

            // The filter rejected everything; raw seeds beat an empty answer.
            warn!(
                "Candidate filter rejected all {} seeds, returning raw top-{}",
                raw_seeds.len(),
                request.k
            );
            stats.total_time_ms = started.elapsed().as_millis() as u64;
            return Ok(SearchOutcome {
                query: request.query.clone(),
                refined_query,
                results: rank_by_distance(raw_seeds, request.k),
                filter_bypassed: true,
                stats,
            });
        }

        // Expansion is seeded with the closest k filtered candidates; the
        // wider seed pool exists only to survive filtering.
        let mut seeds = filtered;
        seeds.truncate(request.k);

        let expand_started = Instant::now();
        let expansion = self
            .expander
            .expand(seeds, request.repo.as_deref(), cancel)
            .await?;
        stats.expand_time_ms = expand_started.elapsed().as_millis() as u64;
        stats.expanded_count = expansion.candidates.len();
        stats.discovered_count = expansion.discovered;
        stats.symbols_skipped = expansion.symbols_skipped;
        stats.cancelled = expansion.cancelled;

        let fusion_started = Instant::now();
        let mut candidates = self.fusion.fuse(&expansion.candidates, &refined_query);
        stats.fusion_time_ms = fusion_started.elapsed().as_millis() as u64;

        if let Some(reranker) = self.reranker.as_ref().filter(|_| request.use_reranker) {
            let rerank_started = Instant::now();
            let chunks: Vec<_> = candidates.iter().map(|c| c.chunk.clone()).collect();
            let timeout = Duration::from_millis(self.config.lookup_timeout_ms);

            match tokio::time::timeout(timeout, reranker.score(&refined_query, &chunks)).await {
                Ok(Ok(scores)) if scores.len() == candidates.len() => {
                    self.fusion.apply_rerank(&mut candidates, &scores);
                    stats.rerank_applied = true;
                }
                Ok(Ok(scores)) => {
                    warn!(
                        "Reranker returned {} scores for {} candidates, keeping base order",
                        scores.len(),
                        candidates.len()
                    );
                }
                Ok(Err(err)) => {
                    warn!("Reranking failed, keeping base order: {err}");
                }
                Err(_) => {
                    warn!("Reranking timed out, keeping base order");
                }
            }
            stats.rerank_time_ms = rerank_started.elapsed().as_millis() as u64;
        }

        let results = top_k(candidates, request.k);
        stats.total_time_ms = started.elapsed().as_millis() as u64;
        debug!(
            "Search done: {} results from {} candidates in {}ms",
            results.len(),
            stats.expanded_count,
            stats.total_time_ms
        );

        Ok(SearchOutcome {
            query: request.query.clone(),
            refined_query,
            results,
            filter_bypassed: false,
            stats,
        })
    }

    async fn refine_query(&self, query: &str, stats: &mut SearchStats) -> String {
        let Some(rewriter) = &self.rewriter else {
            return query.to_string();
        };

        let timeout = Duration::from_millis(self.config.lookup_timeout_ms);
        match tokio::time::timeout(timeout, rewriter.rewrite(query)).await {
            Ok(Ok(rewritten)) => {
                let rewritten = rewritten.trim();
                if rewritten.is_empty() {
                    warn!("Query rewriter returned empty output, keeping original query");
                    query.to_string()
                } else {
                    debug!("Query rewritten: '{query}' -> '{rewritten}'");
                    stats.rewrite_applied = true;
                    rewritten.to_string()
                }
            }
            Ok(Err(err)) => {
                warn!("Query rewrite failed, keeping original query: {err}");
                query.to_string()
            }
            Err(_) => {
                warn!("Query rewrite timed out, keeping original query");
                query.to_string()
            }
        }
    }
}

/// Rank raw seeds by their index distance alone.
///
/// Used on the filter-bypass path, where no fusion has run; the breakdown
/// carries dense provenance only.
fn rank_by_distance(raw_seeds: Vec<ScoredChunk>, k: usize) -> Vec<RankedChunk> {
    let distances: Vec<f32> = raw_seeds.iter().map(|s| s.distance).collect();
    let similarities = invert_min_max(&distances);

    raw_seeds
        .into_iter()
        .zip(similarities)
        .take(k)
        .enumerate()
        .map(|(rank, (seed, similarity))| RankedChunk {
            chunk: seed.chunk,
            rank,
            scores: ScoreBreakdown {
                dense_distance: seed.distance,
                dense_similarity: similarity,
                final_score: similarity,
                ..Default::default()
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codescout_embeddings::EmbeddingError;
    use codescout_vector_index::IndexError;
    use pretty_assertions::assert_eq;

    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    struct FailingIndex;

    #[async_trait]
    impl VectorIndex for FailingIndex {
        async fn query(
            &self,
            _vector: &[f32],
            _limit: usize,
            _repo_hint: Option<&str>,
        ) -> std::result::Result<Vec<ScoredChunk>, IndexError> {
            Err(IndexError::QueryFailed("backend offline".to_string()))
        }

        async fn len(&self) -> usize {
            0
        }
    }

    struct EmptyIndex;

    #[async_trait]
    impl VectorIndex for EmptyIndex {
        async fn query(
            &self,
            _vector: &[f32],
            _limit: usize,
            _repo_hint: Option<&str>,
        ) -> std::result::Result<Vec<ScoredChunk>, IndexError> {
            Ok(Vec::new())
        }

        async fn len(&self) -> usize {
            0
        }
    }

    fn engine(index: Arc<dyn VectorIndex>) -> SearchEngine {
        SearchEngine::new(Arc::new(StubEmbedder), index, RetrievalConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RetrievalConfig {
            dense_weight: 0.9,
            lexical_weight: 0.9,
            ..Default::default()
        };
        let result = SearchEngine::new(Arc::new(StubEmbedder), Arc::new(EmptyIndex), config);
        assert!(matches!(result, Err(RetrievalError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_short_query_rejected() {
        let err = engine(Arc::new(EmptyIndex))
            .search(&SearchRequest::new("a", 5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::QueryTooShort { min: 2, actual: 1 }
        ));
    }

    #[tokio::test]
    async fn test_whitespace_query_rejected() {
        let err = engine(Arc::new(EmptyIndex))
            .search(&SearchRequest::new("  x  ", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::QueryTooShort { .. }));
    }

    #[tokio::test]
    async fn test_seed_query_failure_is_fatal() {
        let err = engine(Arc::new(FailingIndex))
            .search(&SearchRequest::new("how does routing work", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::SeedQuery(_)));
    }

    #[tokio::test]
    async fn test_empty_index_yields_empty_outcome() {
        let outcome = engine(Arc::new(EmptyIndex))
            .search(&SearchRequest::new("how does routing work", 5))
            .await
            .unwrap();
        assert!(outcome.is_empty());
        assert!(!outcome.filter_bypassed);
        assert_eq!(outcome.stats.seed_count, 0);
    }

    #[test]
    fn test_rank_by_distance_orders_and_truncates() {
        use codescout_vector_index::{ChunkKind, CodeChunk, content_hash};

        let seed = |name: &str, distance: f32| ScoredChunk {
            chunk: CodeChunk {
                id: format!("demo:src/app.py:{name}:0"),
                path: "src/app.py".to_string(),
                kind: ChunkKind::Function,
                name: name.to_string(),
                qualified_name: None,
                enclosing_class: None,
                start_line: Some(1),
                end_line: Some(1),
                content: format!("def {name}(): pass"),
                repo: "demo".to_string(),
                content_hash: content_hash(name),
            },
            distance,
        };

        // Raw seeds arrive closest-first from the index.
        let ranked = rank_by_distance(vec![seed("a", 0.1), seed("b", 0.5), seed("c", 0.9)], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].chunk.name, "a");
        assert_eq!(ranked[0].scores.dense_similarity, 1.0);
        assert_eq!(ranked[0].rank, 0);
        assert!(ranked[0].scores.rerank_norm.is_none());
    }
}
