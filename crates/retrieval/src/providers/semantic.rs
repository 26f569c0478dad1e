//! `semantic` provider: cosine similarity between a query embedding and each
//! candidate chunk's stored embedding. Concrete embedding model
//! implementations are an explicit non-goal (spec section 1); `QueryEmbedder`
//! is the seam an external collaborator plugs into, mirroring the teacher's
//! `EmbeddingProvider` trait (`embedding/mod.rs`) scoped down to query-time
//! embedding only.

use std::sync::Arc;

use engram_store::{ChunkWithFile, EngramStore};
use tracing::warn;

use super::Provider;
use crate::types::ProviderHit;

#[async_trait::async_trait]
pub trait QueryEmbedder: Send + Sync {
  async fn embed_query(&self, text: &str) -> Result<Vec<f32>, String>;
}

pub struct SemanticProvider {
  store: Arc<EngramStore>,
  embedder: Option<Arc<dyn QueryEmbedder>>,
  model: String,
}

impl SemanticProvider {
  pub fn new(store: Arc<EngramStore>, embedder: Option<Arc<dyn QueryEmbedder>>, model: impl Into<String>) -> Self {
    Self { store, embedder, model: model.into() }
  }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() || a.is_empty() {
    return 0.0;
  }
  let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
  let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
  let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
  if norm_a == 0.0 || norm_b == 0.0 {
    return 0.0;
  }
  dot / (norm_a * norm_b)
}

#[async_trait::async_trait]
impl Provider for SemanticProvider {
  fn id(&self) -> &'static str {
    "semantic"
  }

  async fn query(&self, query: &str, candidates: &[ChunkWithFile]) -> Vec<ProviderHit> {
    let Some(embedder) = &self.embedder else {
      warn!("semantic provider has no query embedder configured, contributing nothing");
      return Vec::new();
    };

    let query_vector = match embedder.embed_query(query).await {
      Ok(v) => v,
      Err(err) => {
        warn!(error = %err, "query embedding failed, semantic provider contributing nothing");
        return Vec::new();
      }
    };

    let mut hits = Vec::new();
    for candidate in candidates {
      let Ok(Some(embedding)) = self.store.fetch_embedding_for_chunk(&candidate.chunk.chunk_id, &self.model).await else {
        continue;
      };
      let similarity = cosine(&query_vector, &embedding.vector);
      if similarity > 0.0 {
        // map [-1, 1] cosine to [0, 1] for fusion.
        hits.push(ProviderHit { chunk_id: candidate.chunk.chunk_id, raw_score: (similarity + 1.0) / 2.0 });
      }
    }
    hits
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cosine_of_identical_vectors_is_one() {
    let v = vec![1.0, 2.0, 3.0];
    assert!((cosine(&v, &v) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn cosine_of_orthogonal_vectors_is_zero() {
    assert!((cosine(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
  }

  #[test]
  fn cosine_of_mismatched_lengths_is_zero() {
    assert_eq!(cosine(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
  }

  #[tokio::test]
  async fn missing_embedder_degrades_to_no_hits() {
    use engram_core::types::{Chunk, ChunkKind, FileRecord};
    use tempfile::TempDir;

    let dir = TempDir::new().unwrap();
    let store = Arc::new(EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap());
    let provider = SemanticProvider::new(store.clone(), None, "test-model");

    let file = FileRecord::new("root", "a.rs", "/abs/a.rs");
    let chunk = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, "fn a() {}");
    let candidate = ChunkWithFile { chunk, file };

    let hits = provider.query("anything", &[candidate]).await;
    assert!(hits.is_empty());
  }
}
