//! `git_history` provider: optional signal from commit-message/recency
//! history. No git backend is wired into this core (version-control
//! introspection is external collaborator territory, same as the embedding
//! model and the RPC transport); the provider exists so the fourth provider
//! identity named in spec section 4.7 is addressable and disabled by
//! default in `RetrievalConfig`, and contributes nothing until a real
//! history source is plugged in.

use engram_store::ChunkWithFile;

use super::Provider;
use crate::types::ProviderHit;

pub struct GitHistoryProvider;

impl GitHistoryProvider {
  pub fn new() -> Self {
    Self
  }
}

impl Default for GitHistoryProvider {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait::async_trait]
impl Provider for GitHistoryProvider {
  fn id(&self) -> &'static str {
    "git_history"
  }

  async fn query(&self, _query: &str, _candidates: &[ChunkWithFile]) -> Vec<ProviderHit> {
    Vec::new()
  }
}
