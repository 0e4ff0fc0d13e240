use crate::config::RetrievalConfig;
use codescout_vector_index::ScoredChunk;
use log::debug;

/// Repo-scope and path-blocklist policy applied to raw seed candidates.
///
/// When the filter rejects every candidate the caller falls back to the
/// unfiltered raw top-k; an empty filtered list is policy, not an error.
pub struct CandidateFilter {
    blocked_folders: Vec<String>,
}

impl CandidateFilter {
    /// Create a filter from the configured blocklist
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            blocked_folders: config.blocked_folders.clone(),
        }
    }

    /// Whether a path is allowed for the given query.
    ///
    /// Explicit user intent overrides the blocklist: a query mentioning
    /// "test" or "docs" keeps test/doc paths in play.
    pub fn allows(&self, path: &str, query: &str) -> bool {
        let query_lower = query.to_lowercase();
        if query_lower.contains("test") || query_lower.contains("docs") {
            return true;
        }

        let path_lower = path.to_lowercase();
        !self
            .blocked_folders
            .iter()
            .any(|marker| path_lower.contains(marker.as_str()))
    }

    /// Apply repo and path policy to the raw seed candidates.
    pub fn apply(
        &self,
        raw: &[ScoredChunk],
        repo: Option<&str>,
        query: &str,
    ) -> Vec<ScoredChunk> {
        let filtered: Vec<ScoredChunk> = raw
            .iter()
            .filter(|candidate| match repo {
                Some(repo) => candidate.chunk.repo == repo,
                None => true,
            })
            .filter(|candidate| self.allows(&candidate.chunk.path, query))
            .cloned()
            .collect();

        debug!(
            "Candidate filter kept {} of {} seed candidates",
            filtered.len(),
            raw.len()
        );
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codescout_vector_index::{ChunkKind, CodeChunk, content_hash};
    use pretty_assertions::assert_eq;

    fn scored(path: &str, repo: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: CodeChunk {
                id: format!("{repo}:{path}:x:0"),
                path: path.to_string(),
                kind: ChunkKind::Function,
                name: "x".to_string(),
                qualified_name: None,
                enclosing_class: None,
                start_line: Some(1),
                end_line: Some(3),
                content: "fn x() {}".to_string(),
                repo: repo.to_string(),
                content_hash: content_hash("fn x() {}"),
            },
            distance: 0.5,
        }
    }

    fn filter() -> CandidateFilter {
        CandidateFilter::new(&RetrievalConfig::default())
    }

    #[test]
    fn test_blocked_folders_dropped() {
        let raw = vec![
            scored("src/routing.py", "demo"),
            scored("tests/test_routing.py", "demo"),
            scored("docs/guide.md", "demo"),
        ];

        let kept = filter().apply(&raw, None, "how does routing work");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].chunk.path, "src/routing.py");
    }

    #[test]
    fn test_query_intent_overrides_blocklist() {
        let raw = vec![scored("tests/test_routing.py", "demo")];

        let kept = filter().apply(&raw, None, "show me the tests for routing");
        assert_eq!(kept.len(), 1);

        let kept = filter().apply(&raw, None, "where are the docs built");
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_repo_scope() {
        let raw = vec![scored("src/a.py", "alpha"), scored("src/b.py", "beta")];

        let kept = filter().apply(&raw, Some("alpha"), "query");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].chunk.repo, "alpha");

        let kept = filter().apply(&raw, None, "query");
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_everything_rejected_yields_empty() {
        let raw = vec![scored("examples/demo.py", "demo")];
        let kept = filter().apply(&raw, None, "how does it work");
        assert!(kept.is_empty());
    }
}
