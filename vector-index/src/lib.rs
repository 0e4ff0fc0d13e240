//! # codescout Vector Index
//!
//! Chunk data model and nearest-neighbor index for semantic code search.
//! The retrieval core consumes the [`VectorIndex`] trait; [`JsonVectorIndex`]
//! is the bundled brute-force cosine implementation with JSON persistence.
//!
//! ## Example
//!
//! ```no_run
//! use codescout_vector_index::{JsonVectorIndex, VectorIndex};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let index = JsonVectorIndex::open(Path::new(".codescout/index.json")).await?;
//!     let results = index.query(&[0.1; 768], 5, None).await?;
//!     println!("Found {} nearby chunks", results.len());
//!     Ok(())
//! }
//! ```

mod chunk;
mod error;
mod index;

pub use chunk::{ChunkKey, ChunkKind, CodeChunk, ScoredChunk, content_hash};
pub use error::IndexError;
pub use index::{JsonVectorIndex, VectorIndex};
