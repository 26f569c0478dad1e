//! Step 6: for each selected chunk, optionally pull in up to `neighbor_window`
//! immediately preceding/following chunks from the same file at an attenuated
//! score, so a caller gets surrounding context rather than an isolated span.

use engram_core::types::ContextSnippet;
use engram_store::{ChunkWithFile, EngramStore};

use crate::error::Result;
use crate::fusion::FusedCandidate;

const NEIGHBOR_ATTENUATION: f32 = 0.5;

pub async fn expand_neighbors(store: &EngramStore, selected: Vec<FusedCandidate>, window: u32) -> Result<Vec<FusedCandidate>> {
  if window == 0 {
    return Ok(selected);
  }

  let mut expanded = Vec::with_capacity(selected.len());
  for anchor in selected {
    let file_chunks = store.fetch_chunks_for_file(&anchor.chunk_with_file.chunk.file_id).await?;
    let anchor_ordinal = anchor.chunk_with_file.chunk.ordinal;
    let anchor_score = anchor.fused_score;
    let file = anchor.chunk_with_file.file.clone();

    for neighbor_chunk in &file_chunks {
      let delta = (neighbor_chunk.ordinal as i64 - anchor_ordinal as i64).unsigned_abs();
      if neighbor_chunk.ordinal == anchor_ordinal || delta > window as u64 {
        continue;
      }
      expanded.push(FusedCandidate {
        chunk_with_file: ChunkWithFile { chunk: neighbor_chunk.clone(), file: file.clone() },
        provider_scores: Default::default(),
        fused_score: anchor_score * NEIGHBOR_ATTENUATION,
      });
    }

    expanded.push(anchor);
  }

  Ok(expanded)
}

pub fn to_snippet(candidate: &FusedCandidate) -> ContextSnippet {
  let chunk = &candidate.chunk_with_file.chunk;
  let mut metadata = std::collections::HashMap::new();
  for (provider, score) in &candidate.provider_scores {
    metadata.insert(provider.clone(), format!("{score:.4}"));
  }

  ContextSnippet {
    chunk_id: chunk.chunk_id,
    score: candidate.fused_score,
    file_path: candidate.chunk_with_file.file.relative_path.clone(),
    label: chunk.summary.clone(),
    kind: chunk.kind,
    text: chunk.content.clone(),
    language: chunk.language.clone(),
    start_line: chunk.start_line,
    end_line: chunk.end_line,
    metadata,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::types::{Chunk, ChunkKind, FileRecord};
  use std::collections::HashMap;
  use tempfile::TempDir;

  async fn store_with_file_chunks(n: usize) -> (TempDir, EngramStore, FileRecord, Vec<Chunk>) {
    let dir = TempDir::new().unwrap();
    let store = EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap();
    let file = FileRecord::new("root", "a.rs", "/abs/a.rs");
    let chunks: Vec<Chunk> = (0..n as u32).map(|i| Chunk::new(file.file_id, i, ChunkKind::CodeFunction, format!("fn f{i}() {{}}"))).collect();
    store.replace_file_artifacts(file.clone(), chunks.clone(), vec![]).await.unwrap();
    (dir, store, file, chunks)
  }

  #[tokio::test]
  async fn pulls_in_preceding_and_following_chunks() {
    let (_dir, store, file, chunks) = store_with_file_chunks(5).await;
    let anchor = FusedCandidate {
      chunk_with_file: ChunkWithFile { chunk: chunks[2].clone(), file },
      provider_scores: HashMap::new(),
      fused_score: 1.0,
    };

    let expanded = expand_neighbors(&store, vec![anchor], 1).await.unwrap();
    assert_eq!(expanded.len(), 3);
    let ordinals: Vec<u32> = expanded.iter().map(|c| c.chunk_with_file.chunk.ordinal).collect();
    assert!(ordinals.contains(&1));
    assert!(ordinals.contains(&2));
    assert!(ordinals.contains(&3));
  }

  #[tokio::test]
  async fn neighbors_are_attenuated_relative_to_anchor() {
    let (_dir, store, file, chunks) = store_with_file_chunks(3).await;
    let anchor = FusedCandidate {
      chunk_with_file: ChunkWithFile { chunk: chunks[1].clone(), file },
      provider_scores: HashMap::new(),
      fused_score: 1.0,
    };

    let expanded = expand_neighbors(&store, vec![anchor], 1).await.unwrap();
    let neighbor = expanded.iter().find(|c| c.chunk_with_file.chunk.ordinal != 1).unwrap();
    assert!((neighbor.fused_score - 0.5).abs() < 1e-6);
  }

  #[tokio::test]
  async fn zero_window_is_a_noop() {
    let (_dir, store, file, chunks) = store_with_file_chunks(3).await;
    let anchor = FusedCandidate {
      chunk_with_file: ChunkWithFile { chunk: chunks[1].clone(), file },
      provider_scores: HashMap::new(),
      fused_score: 1.0,
    };
    let expanded = expand_neighbors(&store, vec![anchor], 0).await.unwrap();
    assert_eq!(expanded.len(), 1);
  }
}
