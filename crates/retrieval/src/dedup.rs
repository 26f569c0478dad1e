//! Step 7: dedup by `(chunk_id, file_path)` — the same chunk can reach the
//! candidate set both as a direct provider hit and as another anchor's
//! neighbor. Keeps the highest fused score and merges provider contributions.

use std::collections::HashMap;

use crate::fusion::FusedCandidate;

pub fn dedup(candidates: Vec<FusedCandidate>) -> Vec<FusedCandidate> {
  let mut by_key: HashMap<(uuid::Uuid, String), FusedCandidate> = HashMap::new();

  for candidate in candidates {
    let key = (candidate.chunk_with_file.chunk.chunk_id, candidate.chunk_with_file.file.relative_path.clone());
    match by_key.get_mut(&key) {
      None => {
        by_key.insert(key, candidate);
      }
      Some(existing) => {
        for (provider, score) in candidate.provider_scores {
          existing.provider_scores.entry(provider).or_insert(score);
        }
        if candidate.fused_score > existing.fused_score {
          existing.fused_score = candidate.fused_score;
        }
      }
    }
  }

  by_key.into_values().collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::types::{Chunk, ChunkKind, FileRecord};
  use engram_store::ChunkWithFile;

  fn candidate(file: &FileRecord, chunk: &Chunk, score: f32, provider: &str) -> FusedCandidate {
    let mut provider_scores = HashMap::new();
    provider_scores.insert(provider.to_string(), score);
    FusedCandidate { chunk_with_file: ChunkWithFile { chunk: chunk.clone(), file: file.clone() }, provider_scores, fused_score: score }
  }

  #[test]
  fn keeps_highest_score_and_merges_providers() {
    let file = FileRecord::new("root", "a.rs", "/abs/a.rs");
    let chunk = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, "body");

    let low = candidate(&file, &chunk, 0.3, "full_text");
    let high = candidate(&file, &chunk, 0.9, "semantic");

    let deduped = dedup(vec![low, high]);
    assert_eq!(deduped.len(), 1);
    assert!((deduped[0].fused_score - 0.9).abs() < 1e-6);
    assert!(deduped[0].provider_scores.contains_key("semantic"));
    assert!(deduped[0].provider_scores.contains_key("full_text"));
  }

  #[test]
  fn distinct_chunks_are_preserved() {
    let file = FileRecord::new("root", "a.rs", "/abs/a.rs");
    let c1 = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, "one");
    let c2 = Chunk::new(file.file_id, 1, ChunkKind::CodeFunction, "two");

    let deduped = dedup(vec![candidate(&file, &c1, 0.5, "semantic"), candidate(&file, &c2, 0.5, "semantic")]);
    assert_eq!(deduped.len(), 2);
  }
}
