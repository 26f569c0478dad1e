//! Step 3 of the pipeline (spec section 4.8): turn each provider's raw,
//! provider-local scores into one fused score per chunk. Generalizes the
//! teacher's `calculate_importance` (`service/code/search.rs`), which folded
//! a single vector-search score and a symbol boost together, into an
//! N-provider weighted sum.

use std::collections::HashMap;

use engram_store::ChunkWithFile;

use crate::types::ProviderHit;

/// One candidate chunk carried through fusion, boosting, MMR, and packing.
#[derive(Debug, Clone)]
pub struct FusedCandidate {
  pub chunk_with_file: ChunkWithFile,
  /// provider id -> normalized-to-[0,1] score, for providers that hit this chunk.
  pub provider_scores: HashMap<String, f32>,
  pub fused_score: f32,
}

/// Normalizes each provider's raw scores by that provider's per-query max
/// (so differently-scaled providers become commensurable), then combines
/// them into a weighted sum per chunk.
pub fn fuse(candidates: Vec<ChunkWithFile>, provider_hits: &HashMap<String, Vec<ProviderHit>>, weights: &HashMap<String, f32>) -> Vec<FusedCandidate> {
  let maxima: HashMap<&str, f32> = provider_hits
    .iter()
    .map(|(id, hits)| (id.as_str(), hits.iter().map(|h| h.raw_score).fold(0.0f32, f32::max)))
    .collect();

  let mut by_chunk: HashMap<uuid::Uuid, HashMap<String, f32>> = HashMap::new();
  for (provider_id, hits) in provider_hits {
    let max = maxima.get(provider_id.as_str()).copied().unwrap_or(0.0);
    if max <= 0.0 {
      continue;
    }
    for hit in hits {
      let normalized = (hit.raw_score / max).clamp(0.0, 1.0);
      by_chunk.entry(hit.chunk_id).or_default().insert(provider_id.clone(), normalized);
    }
  }

  candidates
    .into_iter()
    .filter_map(|cwf| {
      let provider_scores = by_chunk.remove(&cwf.chunk.chunk_id)?;
      let fused_score = provider_scores.iter().map(|(id, score)| weights.get(id).copied().unwrap_or(0.0) * score).sum();
      Some(FusedCandidate { chunk_with_file: cwf, provider_scores, fused_score })
    })
    .collect()
}

/// Descending fused score; ties broken by higher provider count, then
/// lexicographic file path, per spec section 4.8 step 3.
pub fn sort_by_fused_score(candidates: &mut [FusedCandidate]) {
  candidates.sort_by(|a, b| {
    b.fused_score
      .partial_cmp(&a.fused_score)
      .unwrap_or(std::cmp::Ordering::Equal)
      .then_with(|| b.provider_scores.len().cmp(&a.provider_scores.len()))
      .then_with(|| a.chunk_with_file.file.relative_path.cmp(&b.chunk_with_file.file.relative_path))
  });
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::types::{Chunk, ChunkKind, FileRecord};

  fn candidate(path: &str) -> ChunkWithFile {
    let file = FileRecord::new("root", path, format!("/abs/{path}"));
    let chunk = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, "body");
    ChunkWithFile { chunk, file }
  }

  #[test]
  fn normalizes_by_per_provider_max_and_weights() {
    let a = candidate("a.rs");
    let b = candidate("b.rs");
    let a_id = a.chunk.chunk_id;
    let b_id = b.chunk.chunk_id;

    let mut hits = HashMap::new();
    hits.insert("semantic".to_string(), vec![ProviderHit { chunk_id: a_id, raw_score: 0.8 }, ProviderHit { chunk_id: b_id, raw_score: 0.4 }]);

    let mut weights = HashMap::new();
    weights.insert("semantic".to_string(), 1.0);

    let fused = fuse(vec![a, b], &hits, &weights);
    let a_fused = fused.iter().find(|c| c.chunk_with_file.chunk.chunk_id == a_id).unwrap();
    let b_fused = fused.iter().find(|c| c.chunk_with_file.chunk.chunk_id == b_id).unwrap();

    assert!((a_fused.fused_score - 1.0).abs() < 1e-6);
    assert!((b_fused.fused_score - 0.5).abs() < 1e-6);
  }

  #[test]
  fn chunk_with_no_provider_hits_is_dropped() {
    let a = candidate("a.rs");
    let hits = HashMap::new();
    let weights = HashMap::new();
    assert!(fuse(vec![a], &hits, &weights).is_empty());
  }

  #[test]
  fn ties_break_on_provider_count_then_path() {
    let a = candidate("z.rs");
    let b = candidate("a.rs");
    let mut hits = HashMap::new();
    hits.insert("semantic".to_string(), vec![ProviderHit { chunk_id: a.chunk.chunk_id, raw_score: 1.0 }, ProviderHit { chunk_id: b.chunk.chunk_id, raw_score: 1.0 }]);
    let mut weights = HashMap::new();
    weights.insert("semantic".to_string(), 1.0);

    let mut fused = fuse(vec![a, b], &hits, &weights);
    sort_by_fused_score(&mut fused);
    assert_eq!(fused[0].chunk_with_file.file.relative_path, "a.rs");
  }
}
