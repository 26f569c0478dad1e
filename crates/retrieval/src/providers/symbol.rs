//! `symbol` provider: scores chunks by matches between query terms and the
//! chunk's symbols/imports/calls/file path. Generalizes the teacher's
//! `calculate_symbol_boost` (`service/code/search.rs`) from a post-hoc boost
//! on a single vector-search result set into a standalone provider.

use engram_store::ChunkWithFile;

use super::Provider;
use crate::types::ProviderHit;

pub struct SymbolProvider;

impl SymbolProvider {
  pub fn new() -> Self {
    Self
  }
}

impl Default for SymbolProvider {
  fn default() -> Self {
    Self::new()
  }
}

fn score_chunk(terms: &[String], candidate: &ChunkWithFile) -> f32 {
  let mut score = 0.0f32;
  let chunk = &candidate.chunk;

  for term in terms {
    for symbol in &chunk.symbols {
      let symbol_lower = symbol.to_lowercase();
      if symbol_lower == *term {
        score += 0.4;
      } else if symbol_lower.contains(term.as_str()) {
        score += 0.2;
      }
    }

    if let Some(summary) = &chunk.summary {
      let summary_lower = summary.to_lowercase();
      if summary_lower.contains(term.as_str()) {
        score += 0.2;
      }
    }

    for import in &chunk.imports {
      if import.to_lowercase().contains(term.as_str()) {
        score += 0.1;
        break;
      }
    }

    for call in &chunk.calls {
      if call.to_lowercase() == *term {
        score += 0.15;
        break;
      }
    }

    if candidate.file.relative_path.to_lowercase().contains(term.as_str()) {
      score += 0.05;
    }
  }

  score.min(1.0)
}

#[async_trait::async_trait]
impl Provider for SymbolProvider {
  fn id(&self) -> &'static str {
    "symbol"
  }

  async fn query(&self, query: &str, candidates: &[ChunkWithFile]) -> Vec<ProviderHit> {
    let terms: Vec<String> = query.split_whitespace().map(|t| t.to_lowercase()).collect();
    if terms.is_empty() {
      return Vec::new();
    }

    candidates
      .iter()
      .filter_map(|c| {
        let score = score_chunk(&terms, c);
        (score > 0.0).then_some(ProviderHit { chunk_id: c.chunk.chunk_id, raw_score: score })
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::types::{Chunk, ChunkKind, FileRecord};

  fn candidate(symbols: Vec<&str>, path: &str) -> ChunkWithFile {
    let file = FileRecord::new("root", path, format!("/abs/{path}"));
    let mut chunk = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, "body");
    chunk.symbols = symbols.into_iter().map(String::from).collect();
    ChunkWithFile { chunk, file }
  }

  #[tokio::test]
  async fn exact_symbol_match_outscores_partial() {
    let provider = SymbolProvider::new();
    let exact = candidate(vec!["authenticate"], "auth.rs");
    let partial = candidate(vec!["authenticate_user"], "helpers.rs");

    let hits = provider.query("authenticate", std::slice::from_ref(&exact)).await;
    assert_eq!(hits.len(), 1);
    let exact_score = hits[0].raw_score;

    let hits = provider.query("authenticate", std::slice::from_ref(&partial)).await;
    let partial_score = hits[0].raw_score;

    assert!(exact_score > partial_score);
  }

  #[tokio::test]
  async fn no_match_yields_no_hit() {
    let provider = SymbolProvider::new();
    let candidate = candidate(vec!["unrelated"], "x.rs");
    let hits = provider.query("authenticate", &[candidate]).await;
    assert!(hits.is_empty());
  }
}
