//! Step 5: Maximal Marginal Relevance diversification. New relative to the
//! teacher (whose single-provider search had no redundancy to diversify
//! against); grounded in `ploke-rag`'s `mmr_select` (budget-aware context
//! assembly, `other_examples/...ploke-rag...`), adapted to treat each
//! chunk's per-provider normalized score vector as its similarity basis
//! instead of an embedding.

use crate::fusion::FusedCandidate;

/// Greedy MMR selection: at each step pick the candidate maximizing
/// `lambda * score - (1 - lambda) * max_sim(selected)`, where `sim` is
/// cosine similarity over provider-score vectors. Returns at most `k`
/// candidates, most relevant first.
pub fn select(candidates: Vec<FusedCandidate>, k: usize, diversity_weight: f32) -> Vec<FusedCandidate> {
  if candidates.is_empty() || k == 0 {
    return Vec::new();
  }

  let lambda = 1.0 - diversity_weight.clamp(0.0, 1.0);
  let provider_ids = collect_provider_ids(&candidates);

  let vectors: Vec<Vec<f32>> = candidates.iter().map(|c| to_vector(c, &provider_ids)).collect();

  let mut remaining: Vec<usize> = (0..candidates.len()).collect();
  let mut selected_indices: Vec<usize> = Vec::new();

  while !remaining.is_empty() && selected_indices.len() < k {
    let mut best_pos = 0;
    let mut best_value = f32::NEG_INFINITY;

    for (pos, &idx) in remaining.iter().enumerate() {
      let max_sim = selected_indices.iter().map(|&s| cosine(&vectors[idx], &vectors[s])).fold(0.0f32, f32::max);
      let value = lambda * candidates[idx].fused_score - (1.0 - lambda) * max_sim;
      if value > best_value {
        best_value = value;
        best_pos = pos;
      }
    }

    selected_indices.push(remaining.remove(best_pos));
  }

  let mut owned: Vec<Option<FusedCandidate>> = candidates.into_iter().map(Some).collect();
  selected_indices.into_iter().map(|idx| owned[idx].take().expect("each index selected at most once")).collect()
}

fn collect_provider_ids(candidates: &[FusedCandidate]) -> Vec<String> {
  let mut ids: Vec<String> = candidates.iter().flat_map(|c| c.provider_scores.keys().cloned()).collect();
  ids.sort();
  ids.dedup();
  ids
}

fn to_vector(candidate: &FusedCandidate, provider_ids: &[String]) -> Vec<f32> {
  provider_ids.iter().map(|id| candidate.provider_scores.get(id).copied().unwrap_or(0.0)).collect()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
  let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
  let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
  let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
  if norm_a == 0.0 || norm_b == 0.0 {
    return 0.0;
  }
  dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  use engram_core::types::{Chunk, ChunkKind, FileRecord};
  use engram_store::ChunkWithFile;

  fn candidate(path: &str, score: f32, provider_scores: Vec<(&str, f32)>) -> FusedCandidate {
    let file = FileRecord::new("root", path, format!("/abs/{path}"));
    let chunk = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, "body");
    FusedCandidate {
      chunk_with_file: ChunkWithFile { chunk, file },
      provider_scores: provider_scores.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
      fused_score: score,
    }
  }

  #[test]
  fn bounds_output_by_k() {
    let candidates = vec![
      candidate("a.rs", 0.9, vec![("semantic", 1.0)]),
      candidate("b.rs", 0.8, vec![("semantic", 0.9)]),
      candidate("c.rs", 0.7, vec![("semantic", 0.1)]),
    ];
    let selected = select(candidates, 2, 0.3);
    assert_eq!(selected.len(), 2);
  }

  #[test]
  fn prefers_diverse_candidate_over_near_duplicate() {
    let candidates = vec![
      candidate("a.rs", 1.0, vec![("semantic", 1.0), ("symbol", 1.0)]),
      candidate("b.rs", 0.95, vec![("semantic", 1.0), ("symbol", 1.0)]),
      candidate("c.rs", 0.5, vec![("semantic", 0.0), ("symbol", 1.0)]),
    ];
    let selected = select(candidates, 2, 0.8);
    let paths: Vec<&str> = selected.iter().map(|c| c.chunk_with_file.file.relative_path.as_str()).collect();
    assert_eq!(paths[0], "a.rs");
    assert_eq!(paths[1], "c.rs");
  }

  #[test]
  fn empty_input_yields_empty_output() {
    assert!(select(Vec::new(), 5, 0.3).is_empty());
  }
}
