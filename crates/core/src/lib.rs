//! Shared data model, token estimation and configuration for the code-context
//! indexing core.
//!
//! This crate has no knowledge of storage, chunking strategy, or retrieval
//! scoring; it only defines the value types those crates agree on plus the
//! token estimator (cheap enough to call from hot paths in every other
//! crate) and the immutable `Config`.

pub mod config;
pub mod error;
pub mod estimator;
pub mod hash;
pub mod types;

pub use config::Config;
pub use error::CoreError;
pub use estimator::{ModelFamily, TokenEstimator};
pub use hash::content_hash;
pub use types::{
  Chunk, ChunkKind, ContextSnippet, Embedding, FileRecord, Job, JobMode, JobPhase, JobStatus,
  TokenBudget,
};
