//! Step 4: multiplicative path/language boosts, applied once per chunk.
//! Generalizes the teacher's `calculate_symbol_boost` from a single
//! hardcoded factor into configurable `path_boosts`/`language_boosts` tables.

use std::collections::HashMap;

use crate::fusion::FusedCandidate;

pub fn apply_boosts(candidates: &mut [FusedCandidate], path_boosts: &HashMap<String, f32>, language_boosts: &HashMap<String, f32>) {
  for candidate in candidates.iter_mut() {
    let mut factor = 1.0f32;

    let path = &candidate.chunk_with_file.file.relative_path;
    if let Some((_, boost)) = path_boosts.iter().find(|(prefix, _)| path.starts_with(prefix.as_str())) {
      factor *= boost;
    }

    if let Some(lang) = &candidate.chunk_with_file.chunk.language {
      if let Some((_, boost)) = language_boosts.iter().find(|(l, _)| l.eq_ignore_ascii_case(lang)) {
        factor *= boost;
      }
    }

    candidate.fused_score *= factor;
  }
}
