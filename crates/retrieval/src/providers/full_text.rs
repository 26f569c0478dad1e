//! `full_text` provider: a lightweight term-frequency scorer over chunk
//! content. Stands in for a real inverted-index/BM25 backend (out of scope
//! here) while preserving the provider contract so the pipeline's fusion
//! and MMR stages have a working non-semantic signal to fuse against.

use engram_store::ChunkWithFile;

use super::Provider;
use crate::types::ProviderHit;

pub struct FullTextProvider;

impl FullTextProvider {
  pub fn new() -> Self {
    Self
  }
}

impl Default for FullTextProvider {
  fn default() -> Self {
    Self::new()
  }
}

fn term_frequency_score(terms: &[String], content: &str) -> f32 {
  let content_lower = content.to_lowercase();
  let word_count = content_lower.split_whitespace().count().max(1) as f32;

  let mut hits = 0.0f32;
  for term in terms {
    hits += content_lower.matches(term.as_str()).count() as f32;
  }
  if hits == 0.0 {
    return 0.0;
  }
  // Damped by document length so long chunks don't win purely on bulk.
  (hits / word_count.sqrt()).min(10.0)
}

#[async_trait::async_trait]
impl Provider for FullTextProvider {
  fn id(&self) -> &'static str {
    "full_text"
  }

  async fn query(&self, query: &str, candidates: &[ChunkWithFile]) -> Vec<ProviderHit> {
    let terms: Vec<String> = query.split_whitespace().map(|t| t.to_lowercase()).filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
      return Vec::new();
    }

    candidates
      .iter()
      .filter_map(|c| {
        let score = term_frequency_score(&terms, &c.chunk.content);
        (score > 0.0).then_some(ProviderHit { chunk_id: c.chunk.chunk_id, raw_score: score })
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::types::{Chunk, ChunkKind, FileRecord};

  fn candidate(content: &str) -> ChunkWithFile {
    let file = FileRecord::new("root", "a.rs", "/abs/a.rs");
    let chunk = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, content);
    ChunkWithFile { chunk, file }
  }

  #[tokio::test]
  async fn scores_chunks_containing_query_terms() {
    let provider = FullTextProvider::new();
    let hit = candidate("fn authenticate_user() { check_token() }");
    let miss = candidate("fn render_page() {}");

    let hits = provider.query("authenticate", &[hit, miss]).await;
    assert_eq!(hits.len(), 1);
  }

  #[tokio::test]
  async fn blank_query_yields_no_hits() {
    let provider = FullTextProvider::new();
    let c = candidate("fn f() {}");
    assert!(provider.query("   ", &[c]).await.is_empty());
  }
}
