//! # codescout Embeddings
//!
//! Text embedding support for semantic code search. The retrieval core only
//! sees the [`EmbeddingProvider`] trait, so any deterministic text-to-vector
//! backend can be injected; the default implementation runs
//! Nomic-embed-text-v1.5 locally via fastembed-rs.
//!
//! ## Example
//!
//! ```no_run
//! use codescout_embeddings::{EmbeddingProvider, EmbeddingService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = EmbeddingService::new().await?;
//!     let vectors = service.embed(&["fn hello() {}".to_string()]).await?;
//!     println!("Generated {} embeddings", vectors.len());
//!     Ok(())
//! }
//! ```

mod error;
mod provider;
mod service;

pub use error::EmbeddingError;
pub use provider::EmbeddingProvider;
pub use service::EmbeddingConfig;
pub use service::EmbeddingModelType;
pub use service::EmbeddingService;

/// Default embedding dimension for Nomic-embed-text-v1.5
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Compact embedding dimension (using Matryoshka truncation)
pub const COMPACT_EMBEDDING_DIM: usize = 256;
