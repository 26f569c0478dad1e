//! Structural chunkers (C2 registry, C3 chunkers): language/format-aware
//! splitters that cut file contents into addressable, bounded-token chunks.

mod common;
mod error;
mod json_yaml;
mod lang;
mod markdown;
mod plaintext;
mod registry;
mod sql;

pub use common::ChunkDraft;
pub use error::ChunkError;
pub use registry::{ChunkerRegistry, StrategyDescriptor};

use engram_core::estimator::TokenEstimator;

/// Everything a chunker needs to do its work. Does not own a file id: the
/// caller (the incremental indexer) assigns one after chunking completes,
/// once a `FileRecord` exists to own the chunks.
pub struct ChunkContext<'a> {
  pub content: &'a str,
  pub file_path: &'a str,
  pub language: Option<&'a str>,
  pub estimator: &'a TokenEstimator,
  /// Per-chunk token budget used for header-inclusion and oversize-split
  /// decisions. Distinct from the retrieval-time `max_tokens` budget.
  pub max_tokens: u32,
}

/// A single chunking strategy. `chunk` must return chunks in emission order
/// with the caller expected to assign dense ordinals afterward (chunkers
/// that emit in a single deterministic pass already produce the right
/// order; the registry does not re-sort).
pub trait Chunker: Send + Sync {
  fn strategy(&self) -> &StrategyDescriptor;
  fn chunk(&self, ctx: &ChunkContext) -> Vec<ChunkDraft>;
}

pub const DEFAULT_MAX_TOKENS: u32 = 400;
pub const HEADER_TOKEN_CEILING: u32 = 200;
