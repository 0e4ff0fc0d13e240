use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::symbols::SymbolExtractor;
use codescout_embeddings::EmbeddingProvider;
use codescout_vector_index::{ChunkKey, CodeChunk, ScoredChunk, VectorIndex};
use log::{debug, warn};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of call-graph expansion over one seed set.
#[derive(Debug)]
pub struct ExpansionOutcome {
    /// Seeds plus discovered chunks, de-duplicated, in discovery order
    pub candidates: Vec<ScoredChunk>,

    /// Chunks discovered beyond the seeds
    pub discovered: usize,

    /// Symbol lookups skipped due to failures or timeouts
    pub symbols_skipped: usize,

    /// Whether expansion stopped early on cancellation
    pub cancelled: bool,
}

/// Why a symbol lookup produced no candidates.
#[derive(Debug)]
enum SkipReason {
    Embedding(String),
    Index(String),
    Timeout,
}

enum LookupOutcome {
    Hits(Vec<ScoredChunk>),
    Skipped(SkipReason),
}

/// Level-bounded BFS over the implicit call graph.
///
/// Each level scans the frontier's callable chunks for call sites, then
/// resolves every distinct symbol through an embedding lookup against the
/// index. Lookups within a level run concurrently under a semaphore and are
/// merged in a fixed order, so expansion output is deterministic for a given
/// index state.
pub struct CallGraphExpander {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    extractor: Arc<dyn SymbolExtractor>,
    config: RetrievalConfig,
}

impl CallGraphExpander {
    /// Create a new expander
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        extractor: Arc<dyn SymbolExtractor>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            extractor,
            config,
        }
    }

    /// Expand the seed candidates through up to `max_depth` BFS levels.
    ///
    /// Individual lookup failures are logged and skipped; only the caller's
    /// seed query is allowed to fail a search.
    pub async fn expand(
        &self,
        seeds: Vec<ScoredChunk>,
        repo_hint: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ExpansionOutcome> {
        let mut visited: HashSet<ChunkKey> = HashSet::new();
        let mut candidates: Vec<ScoredChunk> = Vec::with_capacity(seeds.len());
        for seed in seeds {
            if visited.insert(seed.chunk.key()) {
                candidates.push(seed);
            }
        }

        let mut frontier: Vec<CodeChunk> =
            candidates.iter().map(|c| c.chunk.clone()).collect();
        let mut seen_symbols: HashSet<String> = HashSet::new();
        let mut discovered = 0;
        let mut symbols_skipped = 0;
        let mut cancelled = false;

        'levels: for depth in 1..=self.config.max_depth {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let symbols = self.frontier_symbols(&frontier, &mut seen_symbols);
            if symbols.is_empty() {
                break;
            }
            debug!(
                "Expansion level {depth}: {} symbols from {} frontier chunks",
                symbols.len(),
                frontier.len()
            );

            let handles = self.spawn_lookups(&symbols, repo_hint, cancel);
            let mut next_frontier: Vec<CodeChunk> = Vec::new();

            // Merge in spawn order so the expanded set is deterministic.
            for (symbol, mut handle) in symbols.iter().zip(handles) {
                if cancelled {
                    handle.abort();
                    continue;
                }

                let outcome = tokio::select! {
                    _ = cancel.cancelled() => {
                        handle.abort();
                        cancelled = true;
                        continue;
                    }
                    joined = &mut handle => joined,
                };

                match outcome {
                    Ok(LookupOutcome::Hits(hits)) => {
                        for hit in hits {
                            if !visited.insert(hit.chunk.key()) {
                                continue;
                            }
                            next_frontier.push(hit.chunk.clone());
                            candidates.push(hit);
                            discovered += 1;
                        }
                    }
                    Ok(LookupOutcome::Skipped(reason)) => {
                        warn!("Skipping symbol '{symbol}' at level {depth}: {reason:?}");
                        symbols_skipped += 1;
                    }
                    Err(join_error) => {
                        warn!("Lookup task for '{symbol}' failed: {join_error}");
                        symbols_skipped += 1;
                    }
                }
            }

            if cancelled {
                break 'levels;
            }
            frontier = next_frontier;
        }

        Ok(ExpansionOutcome {
            candidates,
            discovered,
            symbols_skipped,
            cancelled,
        })
    }

    /// Distinct, sorted call-site symbols of the frontier's callable chunks,
    /// minus anything already looked up at an earlier level.
    fn frontier_symbols(
        &self,
        frontier: &[CodeChunk],
        seen_symbols: &mut HashSet<String>,
    ) -> Vec<String> {
        let mut level: BTreeSet<String> = BTreeSet::new();
        for chunk in frontier {
            if !chunk.kind.is_callable() {
                continue;
            }
            for symbol in self.extractor.extract(&chunk.content) {
                if seen_symbols.insert(symbol.clone()) {
                    level.insert(symbol);
                }
            }
        }
        level.into_iter().collect()
    }

    fn spawn_lookups(
        &self,
        symbols: &[String],
        repo_hint: Option<&str>,
        cancel: &CancellationToken,
    ) -> Vec<JoinHandle<LookupOutcome>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_lookups));
        let timeout = Duration::from_millis(self.config.lookup_timeout_ms);
        let limit = self.config.per_symbol_limit;

        symbols
            .iter()
            .map(|symbol| {
                let symbol = symbol.clone();
                let embedder = Arc::clone(&self.embedder);
                let index = Arc::clone(&self.index);
                let semaphore = Arc::clone(&semaphore);
                let repo_hint = repo_hint.map(str::to_string);
                let cancel = cancel.clone();

                tokio::spawn(async move {
                    let Ok(_permit) = semaphore.acquire().await else {
                        return LookupOutcome::Skipped(SkipReason::Index(
                            "lookup semaphore closed".to_string(),
                        ));
                    };

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            LookupOutcome::Skipped(SkipReason::Timeout)
                        }
                        outcome = lookup_symbol(
                            embedder,
                            index,
                            &symbol,
                            repo_hint.as_deref(),
                            limit,
                            timeout,
                        ) => outcome,
                    }
                })
            })
            .collect()
    }
}

async fn lookup_symbol(
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    symbol: &str,
    repo_hint: Option<&str>,
    limit: usize,
    timeout: Duration,
) -> LookupOutcome {
    let texts = vec![symbol.to_string()];
    let embedded = match tokio::time::timeout(timeout, embedder.embed(&texts)).await {
        Ok(Ok(vectors)) => vectors,
        Ok(Err(err)) => return LookupOutcome::Skipped(SkipReason::Embedding(err.to_string())),
        Err(_) => return LookupOutcome::Skipped(SkipReason::Timeout),
    };
    let Some(vector) = embedded.first() else {
        return LookupOutcome::Skipped(SkipReason::Embedding(
            "embedder returned no vectors".to_string(),
        ));
    };

    let hits = match tokio::time::timeout(timeout, index.query(vector, limit, repo_hint)).await {
        Ok(Ok(hits)) => hits,
        Ok(Err(err)) => return LookupOutcome::Skipped(SkipReason::Index(err.to_string())),
        Err(_) => return LookupOutcome::Skipped(SkipReason::Timeout),
    };

    // The repo check is part of acceptance, not just the index pre-filter;
    // an index that treats the hint loosely must not leak foreign chunks.
    let accepted: Vec<ScoredChunk> = hits
        .into_iter()
        .filter(|hit| repo_hint.is_none_or(|repo| hit.chunk.repo == repo))
        .filter(|hit| matches_symbol(&hit.chunk, symbol))
        .collect();
    LookupOutcome::Hits(accepted)
}

/// Whether a chunk actually defines the symbol a lookup was for.
///
/// Nearest-neighbor hits are only acceptances when the name lines up, so a
/// lookup for `parse` keeps `Parser.parse` but drops `parseInt`.
pub fn matches_symbol(chunk: &CodeChunk, symbol: &str) -> bool {
    if chunk.name == symbol {
        return true;
    }
    match chunk.qualified_name.as_deref() {
        Some(qualified) => qualified == symbol || chunk.qualified_tail() == Some(symbol),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::CallSiteExtractor;
    use async_trait::async_trait;
    use codescout_embeddings::EmbeddingError;
    use codescout_vector_index::{ChunkKind, JsonVectorIndex, content_hash};
    use pretty_assertions::assert_eq;

    const DIM: usize = 16;

    /// Deterministic embedder: identical text always maps to the identical
    /// vector, so looking up a symbol by name finds the chunk embedded under
    /// that name at distance zero.
    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|text| stub_vector(text)).collect())
        }

        fn dimension(&self) -> usize {
            DIM
        }
    }

    fn stub_vector(text: &str) -> Vec<f32> {
        let seed: u32 = text.bytes().map(u32::from).sum();
        (0..DIM)
            .map(|i| ((seed.wrapping_mul(31).wrapping_add(i as u32 * 7)) % 101) as f32 + 1.0)
            .collect()
    }

    fn chunk(name: &str, qualified: Option<&str>, kind: ChunkKind, content: &str) -> CodeChunk {
        CodeChunk {
            id: format!("demo:src/app.py:{name}:0"),
            path: "src/app.py".to_string(),
            kind,
            name: name.to_string(),
            qualified_name: qualified.map(str::to_string),
            enclosing_class: qualified
                .and_then(|q| q.rsplit_once('.'))
                .map(|(class, _)| class.to_string()),
            start_line: Some(1),
            end_line: Some(20),
            content: content.to_string(),
            repo: "demo".to_string(),
            content_hash: content_hash(content),
        }
    }

    async fn index_with(chunks: Vec<CodeChunk>) -> (Arc<JsonVectorIndex>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let index = JsonVectorIndex::open(&dir.path().join("index.json"))
            .await
            .unwrap();
        let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| stub_vector(&c.name)).collect();
        index.add(chunks, vectors).await.unwrap();
        (Arc::new(index), dir)
    }

    fn expander(index: Arc<JsonVectorIndex>, config: RetrievalConfig) -> CallGraphExpander {
        CallGraphExpander::new(
            Arc::new(StubEmbedder),
            index,
            Arc::new(CallSiteExtractor::new()),
            config,
        )
    }

    fn seed(chunk: CodeChunk) -> ScoredChunk {
        ScoredChunk {
            chunk,
            distance: 0.1,
        }
    }

    #[test]
    fn test_matches_symbol_acceptance() {
        let method = chunk("parse", Some("Parser.parse"), ChunkKind::Method, "def parse(): ...");
        assert!(matches_symbol(&method, "parse"));
        assert!(matches_symbol(&method, "Parser.parse"));
        assert!(!matches_symbol(&method, "parseInt"));

        let near_miss = chunk("parseInt", None, ChunkKind::Function, "def parseInt(): ...");
        assert!(!matches_symbol(&near_miss, "parse"));
    }

    #[tokio::test]
    async fn test_depth_zero_returns_seeds_unchanged() {
        let callee = chunk("helper", None, ChunkKind::Function, "def helper(): pass");
        let (index, _tmp) = index_with(vec![callee]).await;
        let config = RetrievalConfig {
            max_depth: 0,
            ..Default::default()
        };

        let seeds = vec![seed(chunk(
            "main",
            None,
            ChunkKind::Function,
            "def main(): helper()",
        ))];
        let outcome = expander(index, config)
            .expand(seeds, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].chunk.name, "main");
        assert_eq!(outcome.discovered, 0);
        assert!(!outcome.cancelled);
    }

    #[tokio::test]
    async fn test_expansion_discovers_called_symbols() {
        let prepare = chunk(
            "prepare_request",
            Some("Session.prepare_request"),
            ChunkKind::Method,
            "def prepare_request(self, url): return encode_headers(url)",
        );
        let encode = chunk(
            "encode_headers",
            None,
            ChunkKind::Function,
            "def encode_headers(url): pass",
        );
        let (index, _tmp) = index_with(vec![prepare, encode]).await;

        let seeds = vec![seed(chunk(
            "send",
            Some("Session.send"),
            ChunkKind::Method,
            "def send(self, url): return self.prepare_request(url)",
        ))];
        let outcome = expander(index, RetrievalConfig::default())
            .expand(seeds, None, &CancellationToken::new())
            .await
            .unwrap();

        let names: Vec<&str> = outcome
            .candidates
            .iter()
            .map(|c| c.chunk.name.as_str())
            .collect();
        assert!(names.contains(&"send"));
        assert!(names.contains(&"prepare_request"));
        // Level 2 follows prepare_request's own call site.
        assert!(names.contains(&"encode_headers"));
        assert_eq!(outcome.discovered, 2);
        assert_eq!(outcome.symbols_skipped, 0);
    }

    #[tokio::test]
    async fn test_depth_limit_stops_expansion() {
        let prepare = chunk(
            "prepare_request",
            None,
            ChunkKind::Function,
            "def prepare_request(url): return encode_headers(url)",
        );
        let encode = chunk(
            "encode_headers",
            None,
            ChunkKind::Function,
            "def encode_headers(url): pass",
        );
        let (index, _tmp) = index_with(vec![prepare, encode]).await;
        let config = RetrievalConfig {
            max_depth: 1,
            ..Default::default()
        };

        let seeds = vec![seed(chunk(
            "send",
            None,
            ChunkKind::Function,
            "def send(url): return prepare_request(url)",
        ))];
        let outcome = expander(index, config)
            .expand(seeds, None, &CancellationToken::new())
            .await
            .unwrap();

        let names: Vec<&str> = outcome
            .candidates
            .iter()
            .map(|c| c.chunk.name.as_str())
            .collect();
        assert!(names.contains(&"prepare_request"));
        assert!(!names.contains(&"encode_headers"));
    }

    #[tokio::test]
    async fn test_duplicate_seeds_and_rediscoveries_collapse() {
        let helper = chunk("helper", None, ChunkKind::Function, "def helper(): pass");
        let (index, _tmp) = index_with(vec![helper]).await;

        let caller_a = chunk("a", None, ChunkKind::Function, "def a(): helper()");
        let caller_b = chunk("b", None, ChunkKind::Function, "def b(): helper()");
        let seeds = vec![seed(caller_a.clone()), seed(caller_a), seed(caller_b)];

        let outcome = expander(index, RetrievalConfig::default())
            .expand(seeds, None, &CancellationToken::new())
            .await
            .unwrap();

        // Duplicate seed collapsed, helper discovered exactly once.
        assert_eq!(outcome.candidates.len(), 3);
        assert_eq!(outcome.discovered, 1);
    }

    #[tokio::test]
    async fn test_non_callable_chunks_not_scanned() {
        let helper = chunk("helper", None, ChunkKind::Function, "def helper(): pass");
        let (index, _tmp) = index_with(vec![helper]).await;

        let seeds = vec![seed(chunk(
            "readme",
            None,
            ChunkKind::File,
            "call helper() to get started",
        ))];
        let outcome = expander(index, RetrievalConfig::default())
            .expand(seeds, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.discovered, 0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_returns_seeds() {
        let helper = chunk("helper", None, ChunkKind::Function, "def helper(): pass");
        let (index, _tmp) = index_with(vec![helper]).await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let seeds = vec![seed(chunk(
            "main",
            None,
            ChunkKind::Function,
            "def main(): helper()",
        ))];
        let outcome = expander(index, RetrievalConfig::default())
            .expand(seeds, None, &cancel)
            .await
            .unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.discovered, 0);
    }

    /// Serves every stored record no matter what repo hint it is given.
    struct HintIgnoringIndex {
        hits: Vec<ScoredChunk>,
    }

    #[async_trait]
    impl VectorIndex for HintIgnoringIndex {
        async fn query(
            &self,
            _vector: &[f32],
            _limit: usize,
            _repo_hint: Option<&str>,
        ) -> std::result::Result<Vec<ScoredChunk>, codescout_vector_index::IndexError> {
            Ok(self.hits.clone())
        }

        async fn len(&self) -> usize {
            self.hits.len()
        }
    }

    #[tokio::test]
    async fn test_foreign_repo_hits_rejected_even_if_index_ignores_hint() {
        let mut foreign = chunk("helper", None, ChunkKind::Function, "def helper(): pass");
        foreign.repo = "other".to_string();
        foreign.id = "other:src/app.py:helper:0".to_string();
        let index = Arc::new(HintIgnoringIndex {
            hits: vec![ScoredChunk {
                chunk: foreign,
                distance: 0.0,
            }],
        });

        let expander = CallGraphExpander::new(
            Arc::new(StubEmbedder),
            index,
            Arc::new(CallSiteExtractor::new()),
            RetrievalConfig::default(),
        );
        let seeds = vec![seed(chunk(
            "main",
            None,
            ChunkKind::Function,
            "def main(): helper()",
        ))];
        let outcome = expander
            .expand(seeds, Some("demo"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.discovered, 0);
        assert_eq!(outcome.candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_repo_hint_scopes_lookups() {
        let ours = chunk("helper", None, ChunkKind::Function, "def helper(): pass");
        let mut theirs = chunk("helper", None, ChunkKind::Function, "def helper(): pass");
        theirs.repo = "other".to_string();
        theirs.id = "other:src/app.py:helper:0".to_string();
        let (index, _tmp) = index_with(vec![ours, theirs]).await;

        let seeds = vec![seed(chunk(
            "main",
            None,
            ChunkKind::Function,
            "def main(): helper()",
        ))];
        let outcome = expander(index, RetrievalConfig::default())
            .expand(seeds, Some("demo"), &CancellationToken::new())
            .await
            .unwrap();

        let discovered: Vec<&ScoredChunk> = outcome
            .candidates
            .iter()
            .filter(|c| c.chunk.name == "helper")
            .collect();
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].chunk.repo, "demo");
    }
}
