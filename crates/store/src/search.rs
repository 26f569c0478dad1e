//! `search_chunks`/`fetch_snippets`: scope-filtered reads over `chunks`
//! joined against `file_state`, used by the retrieval pipeline.

use engram_core::types::{Chunk, ChunkKind, ContextSnippet, FileRecord, TokenBudget};

use crate::connection::EngramStore;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct ChunkScope {
  pub paths: Vec<String>,
  pub languages: Vec<String>,
  pub kinds: Vec<ChunkKind>,
  pub exclude_patterns: Vec<String>,
}

impl ChunkScope {
  fn matches_file(&self, file: &FileRecord) -> bool {
    if !self.paths.is_empty() && !self.paths.iter().any(|p| file.relative_path == *p || file.relative_path.starts_with(p.as_str())) {
      return false;
    }
    if !self.languages.is_empty() {
      let Some(lang) = &file.language else { return false };
      if !self.languages.iter().any(|l| l.eq_ignore_ascii_case(lang)) {
        return false;
      }
    }
    if self.exclude_patterns.iter().any(|pat| glob_match(pat, &file.relative_path)) {
      return false;
    }
    true
  }

  fn matches_kind(&self, kind: ChunkKind) -> bool {
    self.kinds.is_empty() || self.kinds.iter().any(|k| *k == kind)
  }
}

/// A chunk alongside the file it belongs to, for scope filtering that needs
/// file-level attributes (path, language) not denormalized onto the chunk.
#[derive(Debug, Clone)]
pub struct ChunkWithFile {
  pub chunk: Chunk,
  pub file: FileRecord,
}

impl EngramStore {
  pub async fn search_chunks(&self, scope: &ChunkScope) -> Result<Vec<ChunkWithFile>> {
    let files = self.list_all_files().await?;
    let mut results = Vec::new();
    for file in files {
      if !scope.matches_file(&file) {
        continue;
      }
      let chunks = self.fetch_chunks_for_file(&file.file_id).await?;
      for chunk in chunks {
        if scope.matches_kind(chunk.kind) {
          results.push(ChunkWithFile { chunk, file: file.clone() });
        }
      }
    }
    Ok(results)
  }

  /// Packs matching chunks into snippets within `budget.max_tokens`, largest
  /// score first. This module has no ranking signal of its own, so chunks
  /// are taken in the order `search_chunks` returns them — the retrieval
  /// pipeline is responsible for scoring and ordering before packing when a
  /// ranked result is required.
  pub async fn fetch_snippets(&self, scope: &ChunkScope, budget: &TokenBudget) -> Result<Vec<ContextSnippet>> {
    let matches = self.search_chunks(scope).await?;
    let available = budget.max_tokens.saturating_sub(budget.reserve_for_prompt);

    let mut snippets = Vec::new();
    let mut used = 0u32;
    for m in matches {
      if used.saturating_add(m.chunk.token_estimate) > available {
        continue;
      }
      used = used.saturating_add(m.chunk.token_estimate);
      snippets.push(ContextSnippet {
        chunk_id: m.chunk.chunk_id,
        score: 1.0,
        file_path: m.file.relative_path.clone(),
        label: m.chunk.summary.clone(),
        kind: m.chunk.kind,
        text: m.chunk.content,
        language: m.chunk.language,
        start_line: m.chunk.start_line,
        end_line: m.chunk.end_line,
        metadata: std::collections::HashMap::new(),
      });
    }
    Ok(snippets)
  }
}

/// Minimal glob matcher supporting a single trailing `*` (e.g. `target/*`),
/// which is all `exclude_patterns` needs in practice.
fn glob_match(pattern: &str, path: &str) -> bool {
  match pattern.strip_suffix('*') {
    Some(prefix) => path.starts_with(prefix),
    None => path == pattern,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  async fn open() -> (TempDir, EngramStore) {
    let dir = TempDir::new().unwrap();
    let store = EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap();
    (dir, store)
  }

  fn sample_file(root_id: &str, rel: &str, language: &str) -> FileRecord {
    let mut f = FileRecord::new(root_id, rel, format!("/abs/{rel}"));
    f.content_hash = "h".to_string();
    f.language = Some(language.to_string());
    f
  }

  #[tokio::test]
  async fn scope_filters_by_language_and_path() {
    let (_dir, store) = open().await;
    let rs_file = sample_file("root", "a.rs", "rust");
    let py_file = sample_file("root", "b.py", "python");
    let rs_chunk = Chunk::new(rs_file.file_id, 0, ChunkKind::CodeFunction, "fn a() {}");
    let py_chunk = Chunk::new(py_file.file_id, 0, ChunkKind::CodeFunction, "def b(): pass");

    store.replace_file_artifacts(rs_file, vec![rs_chunk], vec![]).await.unwrap();
    store.replace_file_artifacts(py_file, vec![py_chunk], vec![]).await.unwrap();

    let scope = ChunkScope { languages: vec!["rust".to_string()], ..Default::default() };
    let hits = store.search_chunks(&scope).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file.relative_path, "a.rs");
  }

  #[tokio::test]
  async fn fetch_snippets_respects_token_budget() {
    let (_dir, store) = open().await;
    let file = sample_file("root", "a.rs", "rust");
    let mut c1 = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, "fn a() {}");
    c1.token_estimate = 50;
    let mut c2 = Chunk::new(file.file_id, 1, ChunkKind::CodeFunction, "fn b() {}");
    c2.token_estimate = 50;

    store.replace_file_artifacts(file, vec![c1, c2], vec![]).await.unwrap();

    let budget = TokenBudget { max_tokens: 60, reserve_for_prompt: 0, diversity_weight: 0.3 };
    let snippets = store.fetch_snippets(&ChunkScope::default(), &budget).await.unwrap();
    assert_eq!(snippets.len(), 1);
  }
}
