//! C5 IncrementalIndexer: content-hash-driven classification of a batch of
//! paths into new/modified/unchanged/deleted, chunked and stored through
//! `replace_file_artifacts`. Generalizes the teacher's
//! `service/code/index.rs::run_indexing` (scan -> actor hand-off -> progress
//! counters) into a direct, store-backed function with no actor in between.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use engram_chunker::{ChunkContext, ChunkerRegistry};
use engram_core::content_hash;
use engram_core::estimator::TokenEstimator;
use engram_core::types::FileRecord;
use engram_core::Config;
use engram_store::EngramStore;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::language::detect_language;

/// Outcome of one call to [`IncrementalIndexer::index_paths`].
#[derive(Debug, Clone, Default)]
pub struct UpdateResult {
  pub new: usize,
  pub modified: usize,
  pub unchanged: usize,
  pub deleted: usize,
  pub indexing_failures: usize,
  pub deletion_failures: usize,
  pub duration: Duration,
}

impl UpdateResult {
  pub fn total_touched(&self) -> usize {
    self.new + self.modified
  }
}

enum Classification {
  Unchanged,
  New,
  Modified(FileRecord),
}

pub struct IncrementalIndexer<'a> {
  store: &'a EngramStore,
  registry: &'a ChunkerRegistry,
  estimator: &'a TokenEstimator,
  config: &'a Config,
}

impl<'a> IncrementalIndexer<'a> {
  pub fn new(store: &'a EngramStore, registry: &'a ChunkerRegistry, estimator: &'a TokenEstimator, config: &'a Config) -> Self {
    Self { store, registry, estimator, config }
  }

  /// Indexes `paths` (absolute) under `root_id`. Per-file failures are
  /// logged to `bootstrap_errors` and counted, never abort the batch.
  /// When `detect_implicit_deletions` is set, any active `FileRecord` under
  /// `root_id` whose absolute path is not in `paths` is soft-deleted.
  pub async fn index_paths(&self, root_id: &str, paths: &[PathBuf], force: bool, detect_implicit_deletions: bool) -> Result<UpdateResult> {
    let start = Instant::now();
    let mut result = UpdateResult::default();

    for path in paths {
      match self.index_one(root_id, path, force).await {
        Ok(Classification::Unchanged) => result.unchanged += 1,
        Ok(Classification::New) => result.new += 1,
        Ok(Classification::Modified(_)) => result.modified += 1,
        Err(err) => {
          warn!(path = %path.display(), error = %err, "indexing failed for path");
          let _ = self.store.log_bootstrap_error(&path.to_string_lossy(), &err.to_string()).await;
          result.indexing_failures += 1;
        }
      }
    }

    if detect_implicit_deletions {
      result.deleted += self.soft_delete_missing(root_id, paths).await?;
    }

    result.duration = start.elapsed();
    Ok(result)
  }

  async fn index_one(&self, root_id: &str, path: &Path, force: bool) -> Result<Classification> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !self.config.is_extension_allowed(ext) {
      trace!(path = %path.display(), "extension not allowed, skipping");
      return Ok(Classification::Unchanged);
    }

    let abs_path = path.to_string_lossy().to_string();
    let bytes = tokio::fs::read(path).await?;
    let hash = content_hash(&bytes);
    let metadata = tokio::fs::metadata(path).await?;
    let size_bytes = metadata.len();
    let modified_time_ns = metadata
      .modified()
      .ok()
      .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
      .map(|d| d.as_nanos() as i64)
      .unwrap_or(0);

    let existing = self.store.fetch_file_record_by_abs_path(&abs_path).await?;

    let classification = match &existing {
      Some(record) if record.content_hash == hash && !force => return Ok(Classification::Unchanged),
      Some(record) => Classification::Modified(record.clone()),
      None => Classification::New,
    };

    let relative_path = relativize(root_id, &abs_path, self.config);
    let language = if ext.is_empty() { None } else { detect_language(ext) };

    let content = String::from_utf8_lossy(&bytes).into_owned();
    let chunker = self.registry.resolve(path.to_str().unwrap_or(&abs_path));
    let content = if chunker.strategy().id == "plaintext" { normalize_plaintext(&content) } else { content };

    let max_tokens = chunker.strategy().default_max_tokens.unwrap_or(engram_chunker::DEFAULT_MAX_TOKENS);
    let ctx = ChunkContext {
      content: &content,
      file_path: &relative_path,
      language: language.as_deref(),
      estimator: self.estimator,
      max_tokens,
    };

    let mut file = match &classification {
      Classification::Modified(existing) => existing.clone(),
      _ => FileRecord::new(root_id, relative_path.clone(), abs_path.clone()),
    };
    file.relative_path = relative_path;
    file.absolute_path = abs_path;
    file.content_hash = hash;
    file.size_bytes = size_bytes;
    file.modified_time_ns = modified_time_ns;
    file.language = language.clone();
    file.indexed_at = chrono::Utc::now();
    file.is_deleted = false;

    let mut drafts = chunker.chunk(&ctx);
    for draft in &mut drafts {
      if draft.language.is_none() {
        draft.language = language.clone();
      }
    }
    let chunks: Vec<_> = drafts.into_iter().map(|d| d.into_chunk(file.file_id)).collect();

    debug!(path = %file.relative_path, chunks = chunks.len(), "storing file artifacts");
    self.store.replace_file_artifacts(file, chunks, Vec::new()).await?;

    Ok(classification)
  }

  /// Soft-deletes every active `FileRecord` under `root_id` whose absolute
  /// path is not present in `paths`.
  async fn soft_delete_missing(&self, root_id: &str, paths: &[PathBuf]) -> Result<usize> {
    use std::collections::HashSet;

    let present: HashSet<String> = paths.iter().map(|p| p.to_string_lossy().to_string()).collect();
    let mut deleted = 0;
    for record in self.store.list_all_files().await? {
      if record.root_id != root_id {
        continue;
      }
      if !present.contains(&record.absolute_path) {
        self.store.soft_delete_file_record(&record.file_id).await?;
        deleted += 1;
      }
    }
    Ok(deleted)
  }
}

/// Strips `root_id`'s configured root prefix from `abs_path`, falling back
/// to the absolute path itself if the root is unknown or not a prefix.
fn relativize(root_id: &str, abs_path: &str, config: &Config) -> String {
  if let Some(root) = config.roots.get(root_id) {
    let root = root.trim_end_matches('/');
    if let Some(rest) = abs_path.strip_prefix(root) {
      return rest.trim_start_matches('/').to_string();
    }
  }
  abs_path.to_string()
}

/// CR -> LF, NULs stripped, 3+ consecutive LFs collapsed to 2 -- applied to
/// content routed through the plaintext fallback (the destination for
/// externally-converted Word/PDF text), per spec section 4.2.
fn normalize_plaintext(content: &str) -> String {
  let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
  normalized.retain(|c| c != '\0');
  while normalized.contains("\n\n\n") {
    normalized = normalized.replace("\n\n\n", "\n\n");
  }
  normalized
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_chunker::ChunkerRegistry;
  use tempfile::TempDir;

  async fn harness() -> (TempDir, EngramStore, ChunkerRegistry, TokenEstimator, Config) {
    let dir = TempDir::new().unwrap();
    let store = EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap();
    let mut config = Config::default();
    config.roots.insert("root".to_string(), dir.path().to_string_lossy().to_string());
    (dir, store, ChunkerRegistry::new(), TokenEstimator::new(), config)
  }

  #[tokio::test]
  async fn new_file_is_indexed_and_chunked() {
    let (dir, store, registry, estimator, config) = harness().await;
    let file_path = dir.path().join("a.py");
    tokio::fs::write(&file_path, "def f(x):\n    return x\n").await.unwrap();

    let indexer = IncrementalIndexer::new(&store, &registry, &estimator, &config);
    let result = indexer.index_paths("root", &[file_path.clone()], false, false).await.unwrap();

    assert_eq!(result.new, 1);
    assert_eq!(result.indexing_failures, 0);
    let artifacts = store.fetch_file_artifacts_by_abs_path(&file_path.to_string_lossy()).await.unwrap().unwrap();
    assert!(!artifacts.chunks.is_empty());
  }

  #[tokio::test]
  async fn unchanged_content_is_a_noop() {
    let (dir, store, registry, estimator, config) = harness().await;
    let file_path = dir.path().join("a.py");
    tokio::fs::write(&file_path, "x = 1\n").await.unwrap();

    let indexer = IncrementalIndexer::new(&store, &registry, &estimator, &config);
    indexer.index_paths("root", &[file_path.clone()], false, false).await.unwrap();
    let second = indexer.index_paths("root", &[file_path.clone()], false, false).await.unwrap();

    assert_eq!(second.unchanged, 1);
    assert_eq!(second.new, 0);
  }

  #[tokio::test]
  async fn modified_content_is_reindexed() {
    let (dir, store, registry, estimator, config) = harness().await;
    let file_path = dir.path().join("a.py");
    tokio::fs::write(&file_path, "x = 1\n").await.unwrap();

    let indexer = IncrementalIndexer::new(&store, &registry, &estimator, &config);
    indexer.index_paths("root", &[file_path.clone()], false, false).await.unwrap();

    tokio::fs::write(&file_path, "x = 2\ny = 3\n").await.unwrap();
    let second = indexer.index_paths("root", &[file_path.clone()], false, false).await.unwrap();

    assert_eq!(second.modified, 1);
  }

  #[tokio::test]
  async fn disallowed_extension_is_skipped_without_failure() {
    let (dir, store, registry, estimator, mut config) = harness().await;
    config.deny_extensions.push("lock".to_string());
    let file_path = dir.path().join("Cargo.lock");
    tokio::fs::write(&file_path, "not real toml").await.unwrap();

    let indexer = IncrementalIndexer::new(&store, &registry, &estimator, &config);
    let result = indexer.index_paths("root", &[file_path.clone()], false, false).await.unwrap();

    assert_eq!(result.new, 0);
    assert_eq!(result.indexing_failures, 0);
  }

  #[tokio::test]
  async fn implicit_deletions_soft_delete_missing_records() {
    let (dir, store, registry, estimator, config) = harness().await;
    let file_path = dir.path().join("a.py");
    tokio::fs::write(&file_path, "x = 1\n").await.unwrap();

    let indexer = IncrementalIndexer::new(&store, &registry, &estimator, &config);
    indexer.index_paths("root", &[file_path.clone()], false, false).await.unwrap();

    let result = indexer.index_paths("root", &[], false, true).await.unwrap();
    assert_eq!(result.deleted, 1);
    assert!(store.fetch_file_artifacts_by_abs_path(&file_path.to_string_lossy()).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn missing_file_is_counted_as_indexing_failure() {
    let (dir, store, registry, estimator, config) = harness().await;
    let missing = dir.path().join("missing.py");

    let indexer = IncrementalIndexer::new(&store, &registry, &estimator, &config);
    let result = indexer.index_paths("root", &[missing], false, false).await.unwrap();

    assert_eq!(result.indexing_failures, 1);
    assert_eq!(result.new, 0);
  }
}
