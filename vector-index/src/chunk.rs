use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Structural kind of a retrievable chunk.
///
/// Line ranges and call-graph expansion are only meaningful for a subset of
/// kinds, so the kind is a tagged enum rather than a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Whole-file chunk
    File,
    /// Free function
    Function,
    /// Method on a class/impl
    Method,
    /// Class/struct definition
    Class,
    /// Configuration file content (YAML/JSON/TOML)
    Config,
    /// Import/use block
    Import,
}

impl ChunkKind {
    /// Whether chunks of this kind have a body worth scanning for call sites.
    pub fn is_callable(self) -> bool {
        matches!(self, ChunkKind::Function | ChunkKind::Method)
    }
}

/// A unit of retrievable content produced by the ingest pipeline.
///
/// Chunks are immutable within a search: the ranking core reads them but
/// never mutates or re-hashes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeChunk {
    /// Stable identifier, unique per (repo, path, qualified symbol, occurrence)
    pub id: String,

    /// File path relative to the repository root
    pub path: String,

    /// Structural kind of this chunk
    pub kind: ChunkKind,

    /// Symbol name (file stem for file chunks)
    pub name: String,

    /// Qualified name, including the enclosing class for methods
    #[serde(default)]
    pub qualified_name: Option<String>,

    /// Enclosing class, when this chunk is a method
    #[serde(default)]
    pub enclosing_class: Option<String>,

    /// Starting line (1-indexed); absent for non-code chunks
    #[serde(default)]
    pub start_line: Option<usize>,

    /// Ending line (1-indexed, inclusive); absent for non-code chunks
    #[serde(default)]
    pub end_line: Option<usize>,

    /// Literal content used for embedding and lexical scoring
    pub content: String,

    /// Owning repository name
    pub repo: String,

    /// Hash of `content`, used upstream for change detection
    pub content_hash: String,
}

impl CodeChunk {
    /// De-duplication key: within one search no two candidates may share it.
    pub fn key(&self) -> ChunkKey {
        ChunkKey {
            path: self.path.clone(),
            symbol: self
                .qualified_name
                .clone()
                .unwrap_or_else(|| self.name.clone()),
            kind: self.kind,
        }
    }

    /// Last dotted segment of the qualified name, if any.
    pub fn qualified_tail(&self) -> Option<&str> {
        self.qualified_name
            .as_deref()
            .and_then(|q| q.rsplit('.').next())
    }
}

/// De-duplication key `(path, qualified name or name, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkKey {
    pub path: String,
    pub symbol: String,
    pub kind: ChunkKind,
}

/// A chunk paired with its raw index distance (lower = closer).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: CodeChunk,
    pub distance: f32,
}

/// Hash chunk content the way the ingest pipeline does.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
