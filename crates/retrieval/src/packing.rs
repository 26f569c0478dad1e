//! Step 8: greedy token-budget packing. Candidates must already be sorted
//! by descending fused score (`fusion::sort_by_fused_score`).

use crate::fusion::FusedCandidate;

const OVERFLOW_ALLOWANCE: f32 = 0.25;

pub struct PackResult {
  pub packed: Vec<FusedCandidate>,
  pub tokens_used: u32,
}

/// Greedily adds candidates while cumulative tokens stay within `max_tokens`.
/// A single candidate that would overflow the remaining budget by at most
/// 25% is let through once, after which packing stops.
pub fn pack(candidates: Vec<FusedCandidate>, max_tokens: u32) -> PackResult {
  let mut packed = Vec::new();
  let mut used = 0u32;
  let mut overflow_spent = false;

  for candidate in candidates {
    let cost = candidate.chunk_with_file.chunk.token_estimate;
    let remaining = max_tokens.saturating_sub(used);

    if cost <= remaining {
      used += cost;
      packed.push(candidate);
      continue;
    }

    if !overflow_spent && remaining > 0 {
      let allowance = (remaining as f32 * (1.0 + OVERFLOW_ALLOWANCE)).floor() as u32;
      if cost <= allowance {
        used += cost;
        packed.push(candidate);
        overflow_spent = true;
        continue;
      }
    }

    break;
  }

  PackResult { packed, tokens_used: used }
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::types::{Chunk, ChunkKind, FileRecord};
  use engram_store::ChunkWithFile;
  use std::collections::HashMap;

  fn candidate(tokens: u32, score: f32) -> FusedCandidate {
    let file = FileRecord::new("root", "a.rs", "/abs/a.rs");
    let mut chunk = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, "body");
    chunk.token_estimate = tokens;
    FusedCandidate { chunk_with_file: ChunkWithFile { chunk, file }, provider_scores: HashMap::new(), fused_score: score }
  }

  #[test]
  fn stops_once_budget_is_exhausted() {
    let candidates = vec![candidate(40, 1.0), candidate(40, 0.9), candidate(40, 0.8)];
    let result = pack(candidates, 100);
    assert_eq!(result.packed.len(), 2);
    assert_eq!(result.tokens_used, 80);
  }

  #[test]
  fn allows_one_overflowing_candidate_within_25_percent() {
    let candidates = vec![candidate(80, 1.0), candidate(25, 0.9)];
    let result = pack(candidates, 100);
    assert_eq!(result.packed.len(), 2);
    assert_eq!(result.tokens_used, 105);
  }

  #[test]
  fn rejects_candidate_overflowing_past_25_percent() {
    let candidates = vec![candidate(90, 1.0), candidate(50, 0.9)];
    let result = pack(candidates, 100);
    assert_eq!(result.packed.len(), 1);
    assert_eq!(result.tokens_used, 90);
  }

  #[test]
  fn overflow_allowance_is_used_at_most_once() {
    let candidates = vec![candidate(110, 1.0), candidate(5, 0.9), candidate(5, 0.8)];
    let result = pack(candidates, 100);
    assert_eq!(result.packed.len(), 1);
    assert_eq!(result.tokens_used, 110);
  }
}
