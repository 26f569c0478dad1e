//! C8 RetrievalProviders: independent scorers, each a pure function from a
//! query plus the pre-filtered candidate set to `(chunk_id, raw_score)`
//! pairs. Generalizes the teacher's single vector-search path
//! (`service/code/search.rs::search`) into several providers the pipeline
//! fans out to concurrently.

mod full_text;
mod git_history;
mod semantic;
mod symbol;

pub use full_text::FullTextProvider;
pub use git_history::GitHistoryProvider;
pub use semantic::{QueryEmbedder, SemanticProvider};
pub use symbol::SymbolProvider;

use engram_store::ChunkWithFile;

use crate::types::ProviderHit;

/// One retrieval strategy. Implementations must never panic and must
/// return quickly enough to respect the pipeline's soft deadline on their
/// own initiative where practical (the pipeline also wraps every call in a
/// `tokio::time::timeout` as a backstop).
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
  fn id(&self) -> &'static str;
  async fn query(&self, query: &str, candidates: &[ChunkWithFile]) -> Vec<ProviderHit>;
}
