use regex_lite::Regex;
use std::collections::BTreeSet;

/// Extracts callee symbol names from chunk text.
///
/// Kept behind a trait so the regex heuristic can later be swapped for a
/// per-language AST walker without touching the expander's BFS logic.
pub trait SymbolExtractor: Send + Sync {
    /// Distinct symbols that appear to be invoked in `content`, sorted.
    fn extract(&self, content: &str) -> Vec<String>;
}

/// Best-effort, language-agnostic call-site scanner.
///
/// Matches an identifier (optionally dotted, e.g. `a.b.c`) immediately
/// followed by an opening parenthesis and keeps only the last dotted
/// segment, so `self.prepare_request(` yields `prepare_request`.
pub struct CallSiteExtractor {
    call_pattern: Regex,
}

/// Control-flow keywords that match the call pattern but are never callable
/// definitions.
const STOPLIST: &[&str] = &[
    "if", "for", "while", "return", "class", "with", "match", "async", "await",
];

impl CallSiteExtractor {
    /// Create a new call-site extractor
    pub fn new() -> Self {
        Self {
            call_pattern: Regex::new(
                r"\b([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*\(",
            )
            .expect("Valid regex"),
        }
    }
}

impl Default for CallSiteExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolExtractor for CallSiteExtractor {
    fn extract(&self, content: &str) -> Vec<String> {
        let mut found = BTreeSet::new();

        for captures in self.call_pattern.captures_iter(content) {
            let Some(dotted) = captures.get(1) else {
                continue;
            };
            let Some(symbol) = dotted.as_str().rsplit('.').next() else {
                continue;
            };
            if symbol.is_empty() || STOPLIST.contains(&symbol) {
                continue;
            }
            found.insert(symbol.to_string());
        }

        found.into_iter().collect()
    }
}
