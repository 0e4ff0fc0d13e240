use crate::chunk::{CodeChunk, ScoredChunk};
use crate::error::IndexError;
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Nearest-neighbor index over embedded chunks.
///
/// The ranking core only reads from the index; ingest tooling writes to it.
/// Distance semantics: lower is more similar.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `limit` chunks nearest to `vector`, closest first.
    ///
    /// `repo_hint` is a scope pre-filter: when set, only chunks from that
    /// repository are considered.
    async fn query(
        &self,
        vector: &[f32],
        limit: usize,
        repo_hint: Option<&str>,
    ) -> Result<Vec<ScoredChunk>, IndexError>;

    /// Number of records in the index.
    async fn len(&self) -> usize;

    /// Whether the index holds no records.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    chunk: CodeChunk,
    vector: Vec<f32>,
}

/// Brute-force cosine index persisted as a JSON file.
///
/// Stands in for a real ANN store behind the same trait; adequate for the
/// per-repo index sizes this tool targets.
pub struct JsonVectorIndex {
    db_path: PathBuf,
    records: Arc<RwLock<Vec<StoredRecord>>>,
}

impl JsonVectorIndex {
    /// Open an index at the given path, loading existing records if present.
    pub async fn open(db_path: &Path) -> Result<Self, IndexError> {
        info!("Opening vector index at {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let records = if db_path.exists() {
            match Self::load_from_disk(db_path).await {
                Ok(data) => data,
                Err(e) => {
                    debug!("Could not load existing index: {e}, starting fresh");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        info!("Vector index opened with {} records", records.len());
        Ok(Self {
            db_path: db_path.to_path_buf(),
            records: Arc::new(RwLock::new(records)),
        })
    }

    async fn load_from_disk(path: &Path) -> Result<Vec<StoredRecord>, IndexError> {
        let content = tokio::fs::read(path).await?;
        let records: Vec<StoredRecord> = serde_json::from_slice(&content)?;
        Ok(records)
    }

    async fn save_to_disk(&self) -> Result<(), IndexError> {
        let records = self.records.read().await;
        let content = serde_json::to_vec(&*records)?;
        tokio::fs::write(&self.db_path, content).await?;
        Ok(())
    }

    /// Add pre-embedded chunks to the index and persist.
    pub async fn add(
        &self,
        chunks: Vec<CodeChunk>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<(), IndexError> {
        if chunks.len() != vectors.len() {
            return Err(IndexError::AdditionFailed(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(());
        }

        debug!("Adding {} records to vector index", chunks.len());

        {
            let mut records = self.records.write().await;
            if let Some(first) = records.first() {
                let expected = first.vector.len();
                for vector in &vectors {
                    if vector.len() != expected {
                        return Err(IndexError::DimensionMismatch {
                            expected,
                            actual: vector.len(),
                        });
                    }
                }
            }
            for (chunk, vector) in chunks.into_iter().zip(vectors) {
                records.push(StoredRecord { chunk, vector });
            }
        }

        self.save_to_disk().await
    }
}

#[async_trait]
impl VectorIndex for JsonVectorIndex {
    async fn query(
        &self,
        vector: &[f32],
        limit: usize,
        repo_hint: Option<&str>,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let records = self.records.read().await;

        if let Some(first) = records.first() {
            if first.vector.len() != vector.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: first.vector.len(),
                    actual: vector.len(),
                });
            }
        }

        let mut scored: Vec<ScoredChunk> = records
            .iter()
            .filter(|record| match repo_hint {
                Some(repo) => record.chunk.repo == repo,
                None => true,
            })
            .map(|record| ScoredChunk {
                chunk: record.chunk.clone(),
                distance: cosine_distance(vector, &record.vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        debug!("Index query returned {} of {} records", scored.len(), records.len());
        Ok(scored)
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

/// Cosine distance in [0, 2]: 0 = identical direction, 1 = orthogonal.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (mag_a * mag_b)
}
