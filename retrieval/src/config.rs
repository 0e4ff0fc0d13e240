use codescout_vector_index::ChunkKind;
use serde::{Deserialize, Serialize};

/// Structural boost per chunk kind, added to the fused base score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindBoosts {
    #[serde(default = "default_function_boost")]
    pub function: f32,
    #[serde(default = "default_method_boost")]
    pub method: f32,
    #[serde(default = "default_class_boost")]
    pub class: f32,
    #[serde(default = "default_import_boost")]
    pub import: f32,
    #[serde(default)]
    pub file: f32,
    #[serde(default)]
    pub config: f32,
}

fn default_function_boost() -> f32 {
    0.20
}

fn default_method_boost() -> f32 {
    0.18
}

fn default_class_boost() -> f32 {
    0.10
}

fn default_import_boost() -> f32 {
    0.02
}

impl Default for KindBoosts {
    fn default() -> Self {
        Self {
            function: default_function_boost(),
            method: default_method_boost(),
            class: default_class_boost(),
            import: default_import_boost(),
            file: 0.0,
            config: 0.0,
        }
    }
}

impl KindBoosts {
    /// Boost for a given chunk kind.
    pub fn boost_for(&self, kind: ChunkKind) -> f32 {
        match kind {
            ChunkKind::Function => self.function,
            ChunkKind::Method => self.method,
            ChunkKind::Class => self.class,
            ChunkKind::Import => self.import,
            ChunkKind::File => self.file,
            ChunkKind::Config => self.config,
        }
    }

    fn values(&self) -> [f32; 6] {
        [
            self.function,
            self.method,
            self.class,
            self.import,
            self.file,
            self.config,
        ]
    }
}

/// Additive path-substring heuristic.
///
/// These are tuning defaults, not derived constants; callers with different
/// codebases are expected to replace them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainBoost {
    /// Substring the lowercased path must contain
    pub path_contains: String,

    /// Optional suffix the path must additionally end with
    #[serde(default)]
    pub path_suffix: Option<String>,

    /// Boost added to the base score when the rule matches
    pub boost: f32,
}

impl DomainBoost {
    /// Whether this rule matches the given (lowercased) path.
    pub fn matches(&self, path: &str) -> bool {
        if !path.contains(&self.path_contains) {
            return false;
        }
        match &self.path_suffix {
            Some(suffix) => path.ends_with(suffix.as_str()),
            None => true,
        }
    }
}

/// Configuration for the hybrid retrieval and ranking engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Weight of normalized dense similarity in the base score
    #[serde(default = "default_dense_weight")]
    pub dense_weight: f32,

    /// Weight of normalized BM25 score in the base score
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f32,

    /// Weight of the normalized cross-encoder score in the final blend
    #[serde(default = "default_rerank_weight")]
    pub rerank_weight: f32,

    /// Weight of the normalized base score in the final blend
    #[serde(default = "default_base_weight")]
    pub base_weight: f32,

    /// Structural boosts by chunk kind
    #[serde(default)]
    pub kind_boosts: KindBoosts,

    /// Additive path-substring boosts
    #[serde(default = "default_domain_boosts")]
    pub domain_boosts: Vec<DomainBoost>,

    /// Seed query size is `max(k * candidate_multiplier, k + 10)`
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,

    /// Maximum call-graph expansion depth (0 disables expansion)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Nearest-neighbor results requested per extracted symbol
    #[serde(default = "default_per_symbol_limit")]
    pub per_symbol_limit: usize,

    /// Upper bound on concurrent symbol lookups within one BFS level
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,

    /// Timeout for each embedding call and each index query, in milliseconds
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    /// BM25 term-frequency saturation parameter
    #[serde(default = "default_bm25_k1")]
    pub bm25_k1: f32,

    /// BM25 length-normalization parameter
    #[serde(default = "default_bm25_b")]
    pub bm25_b: f32,

    /// Path markers excluded from candidates unless the query asks for them
    #[serde(default = "default_blocked_folders")]
    pub blocked_folders: Vec<String>,

    /// Minimum query length in characters
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,
}

fn default_dense_weight() -> f32 {
    0.6
}

fn default_lexical_weight() -> f32 {
    0.4
}

fn default_rerank_weight() -> f32 {
    0.75
}

fn default_base_weight() -> f32 {
    0.25
}

fn default_domain_boosts() -> Vec<DomainBoost> {
    vec![
        DomainBoost {
            path_contains: "routing".to_string(),
            path_suffix: None,
            boost: 0.12,
        },
        DomainBoost {
            path_contains: "applications".to_string(),
            path_suffix: None,
            boost: 0.10,
        },
        DomainBoost {
            path_contains: "request".to_string(),
            path_suffix: Some(".py".to_string()),
            boost: 0.08,
        },
    ]
}

fn default_candidate_multiplier() -> usize {
    12
}

fn default_max_depth() -> usize {
    2
}

fn default_per_symbol_limit() -> usize {
    6
}

fn default_max_concurrent_lookups() -> usize {
    8
}

fn default_lookup_timeout_ms() -> u64 {
    2_000
}

fn default_bm25_k1() -> f32 {
    1.2
}

fn default_bm25_b() -> f32 {
    0.75
}

fn default_blocked_folders() -> Vec<String> {
    [
        "tests/",
        "test/",
        "docs/",
        "docs_src/",
        "examples/",
        "example/",
        "tutorial/",
        "tutorials/",
        "benchmarks/",
        "scripts/",
        "migrations/",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_min_query_length() -> usize {
    2
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            dense_weight: default_dense_weight(),
            lexical_weight: default_lexical_weight(),
            rerank_weight: default_rerank_weight(),
            base_weight: default_base_weight(),
            kind_boosts: KindBoosts::default(),
            domain_boosts: default_domain_boosts(),
            candidate_multiplier: default_candidate_multiplier(),
            max_depth: default_max_depth(),
            per_symbol_limit: default_per_symbol_limit(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            bm25_k1: default_bm25_k1(),
            bm25_b: default_bm25_b(),
            blocked_folders: default_blocked_folders(),
            min_query_length: default_min_query_length(),
        }
    }
}

impl RetrievalConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("dense_weight", self.dense_weight),
            ("lexical_weight", self.lexical_weight),
            ("rerank_weight", self.rerank_weight),
            ("base_weight", self.base_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be in [0.0, 1.0], got {value}"));
            }
        }

        let base_total = self.dense_weight + self.lexical_weight;
        if (base_total - 1.0).abs() > 0.01 {
            return Err(format!(
                "dense_weight + lexical_weight must sum to 1.0, got {base_total}"
            ));
        }

        let blend_total = self.rerank_weight + self.base_weight;
        if (blend_total - 1.0).abs() > 0.01 {
            return Err(format!(
                "rerank_weight + base_weight must sum to 1.0, got {blend_total}"
            ));
        }

        for boost in self.kind_boosts.values() {
            if boost < 0.0 {
                return Err(format!("kind boosts must be non-negative, got {boost}"));
            }
        }

        for rule in &self.domain_boosts {
            if rule.boost < 0.0 {
                return Err(format!(
                    "domain boost for '{}' must be non-negative, got {}",
                    rule.path_contains, rule.boost
                ));
            }
        }

        if self.candidate_multiplier == 0 {
            return Err("candidate_multiplier must be > 0".to_string());
        }

        if self.per_symbol_limit == 0 {
            return Err("per_symbol_limit must be > 0".to_string());
        }

        if self.max_concurrent_lookups == 0 {
            return Err("max_concurrent_lookups must be > 0".to_string());
        }

        if self.bm25_k1 <= 0.0 {
            return Err(format!("bm25_k1 must be > 0, got {}", self.bm25_k1));
        }

        if !(0.0..=1.0).contains(&self.bm25_b) {
            return Err(format!("bm25_b must be in [0.0, 1.0], got {}", self.bm25_b));
        }

        if self.min_query_length == 0 {
            return Err("min_query_length must be > 0".to_string());
        }

        Ok(())
    }

    /// Create config optimized for latency: shallow expansion, small fan-out
    pub fn fast() -> Self {
        Self {
            max_depth: 1,
            per_symbol_limit: 4,
            candidate_multiplier: 8,
            ..Default::default()
        }
    }

    /// Create config optimized for recall: deeper expansion, wider fan-out
    pub fn thorough() -> Self {
        Self {
            max_depth: 3,
            per_symbol_limit: 8,
            candidate_multiplier: 16,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_valid() {
        let config = RetrievalConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_weight_validation() {
        let config = RetrievalConfig {
            dense_weight: 0.6,
            lexical_weight: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blend_weight_validation() {
        let config = RetrievalConfig {
            rerank_weight: 0.9,
            base_weight: 0.25,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fan_out_validation() {
        let config = RetrievalConfig {
            per_symbol_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RetrievalConfig {
            candidate_multiplier: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_kind_boost_lookup() {
        let boosts = KindBoosts::default();
        assert_eq!(boosts.boost_for(ChunkKind::Function), 0.20);
        assert_eq!(boosts.boost_for(ChunkKind::Method), 0.18);
        assert_eq!(boosts.boost_for(ChunkKind::Class), 0.10);
        assert_eq!(boosts.boost_for(ChunkKind::Import), 0.02);
        assert_eq!(boosts.boost_for(ChunkKind::File), 0.0);
    }

    #[test]
    fn test_domain_boost_suffix_rule() {
        let rule = DomainBoost {
            path_contains: "request".to_string(),
            path_suffix: Some(".py".to_string()),
            boost: 0.08,
        };
        assert!(rule.matches("src/requests/models.py"));
        assert!(!rule.matches("src/requests/models.rs"));
        assert!(!rule.matches("src/sessions/models.py"));
    }

    #[test]
    fn test_preset_configs() {
        assert!(RetrievalConfig::fast().validate().is_ok());
        assert!(RetrievalConfig::thorough().validate().is_ok());
    }
}
