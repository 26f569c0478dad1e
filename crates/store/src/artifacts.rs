//! `replace_file_artifacts`: the single transactional contract the store
//! standardizes on (design note in section 9) — delete existing
//! chunks/embeddings for a file, upsert the file row, insert the new
//! chunks/embeddings, in that order. LanceDB has no cross-table transaction
//! primitive, so this is expressed as an explicit scoped sequence: each step
//! either completes or the error is propagated immediately, leaving the
//! store in a best-effort-consistent state rather than silently partial.

use engram_core::types::{Chunk, Embedding, FileRecord};

use crate::connection::EngramStore;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct FileArtifacts {
  pub file: FileRecord,
  pub chunks: Vec<Chunk>,
  pub embeddings: Vec<Embedding>,
}

impl EngramStore {
  /// Replaces all persisted artifacts for `file.file_id`: deletes existing
  /// chunks/embeddings, upserts the file row, then inserts the provided
  /// chunks and embeddings. `chunks` must already carry dense 0-based
  /// ordinals; this function does not renumber them.
  pub async fn replace_file_artifacts(
    &self,
    file: FileRecord,
    chunks: Vec<Chunk>,
    embeddings: Vec<Embedding>,
  ) -> Result<FileArtifacts> {
    let existing_chunk_ids: Vec<_> = self.fetch_chunks_for_file(&file.file_id).await?.into_iter().map(|c| c.chunk_id).collect();
    self.delete_embeddings_for_chunks(&existing_chunk_ids).await?;
    self.delete_chunks_for_file(&file.file_id).await?;

    self.upsert_file_record(&file).await?;
    self.insert_chunks(&chunks).await?;
    self.insert_embeddings(&embeddings).await?;

    Ok(FileArtifacts { file, chunks, embeddings })
  }

  pub async fn fetch_file_artifacts_by_path(&self, root_id: &str, rel_path: &str) -> Result<Option<FileArtifacts>> {
    let Some(file) = self.fetch_file_record_by_path(root_id, rel_path).await? else {
      return Ok(None);
    };
    self.load_artifacts(file).await
  }

  pub async fn fetch_file_artifacts_by_abs_path(&self, abs_path: &str) -> Result<Option<FileArtifacts>> {
    let Some(file) = self.fetch_file_record_by_abs_path(abs_path).await? else {
      return Ok(None);
    };
    self.load_artifacts(file).await
  }

  async fn load_artifacts(&self, file: FileRecord) -> Result<Option<FileArtifacts>> {
    let chunks = self.fetch_chunks_for_file(&file.file_id).await?;
    let chunk_ids: Vec<_> = chunks.iter().map(|c| c.chunk_id).collect();
    let embeddings = self.fetch_embeddings_for_chunks(&chunk_ids).await?;
    Ok(Some(FileArtifacts { file, chunks, embeddings }))
  }

  /// Deletes a file and its chunks/embeddings. Returns `false` if the path
  /// had no active record, mirroring the "unknown path -> false" contract.
  pub async fn delete_file_artifacts(&self, root_id: &str, rel_path: &str) -> Result<bool> {
    let Some(file) = self.fetch_file_record_by_path(root_id, rel_path).await? else {
      return Ok(false);
    };
    self.remove_file_and_artifacts(&file).await?;
    Ok(true)
  }

  pub async fn delete_file_artifacts_by_abs_path(&self, abs_path: &str) -> Result<bool> {
    let Some(file) = self.fetch_file_record_by_abs_path(abs_path).await? else {
      return Ok(false);
    };
    self.remove_file_and_artifacts(&file).await?;
    Ok(true)
  }

  async fn remove_file_and_artifacts(&self, file: &FileRecord) -> Result<()> {
    let chunk_ids: Vec<_> = self.fetch_chunks_for_file(&file.file_id).await?.into_iter().map(|c| c.chunk_id).collect();
    self.delete_embeddings_for_chunks(&chunk_ids).await?;
    self.delete_chunks_for_file(&file.file_id).await?;
    self.hard_delete_file_record(&file.file_id).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::types::ChunkKind;
  use tempfile::TempDir;

  async fn open() -> (TempDir, EngramStore) {
    let dir = TempDir::new().unwrap();
    let store = EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap();
    (dir, store)
  }

  fn sample_file(root_id: &str, rel: &str) -> FileRecord {
    let mut f = FileRecord::new(root_id, rel, format!("/abs/{rel}"));
    f.content_hash = "hash1".to_string();
    f
  }

  #[tokio::test]
  async fn replace_then_fetch_round_trips() {
    let (_dir, store) = open().await;
    let file = sample_file("root", "a.rs");
    let chunk = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, "fn a() {}");

    store.replace_file_artifacts(file.clone(), vec![chunk.clone()], vec![]).await.unwrap();

    let artifacts = store.fetch_file_artifacts_by_path("root", "a.rs").await.unwrap().unwrap();
    assert_eq!(artifacts.chunks.len(), 1);
    assert_eq!(artifacts.chunks[0].content, "fn a() {}");
  }

  #[tokio::test]
  async fn replace_is_idempotent_for_unchanged_content() {
    let (_dir, store) = open().await;
    let file = sample_file("root", "a.rs");
    let chunk = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, "fn a() {}");

    store.replace_file_artifacts(file.clone(), vec![chunk.clone()], vec![]).await.unwrap();
    store.replace_file_artifacts(file.clone(), vec![chunk.clone()], vec![]).await.unwrap();

    let artifacts = store.fetch_file_artifacts_by_path("root", "a.rs").await.unwrap().unwrap();
    assert_eq!(artifacts.chunks.len(), 1);
  }

  #[tokio::test]
  async fn delete_unknown_path_returns_false() {
    let (_dir, store) = open().await;
    assert!(!store.delete_file_artifacts("root", "missing.rs").await.unwrap());
  }

  #[tokio::test]
  async fn delete_removes_file_and_chunks() {
    let (_dir, store) = open().await;
    let file = sample_file("root", "a.rs");
    let chunk = Chunk::new(file.file_id, 0, ChunkKind::CodeFunction, "fn a() {}");
    store.replace_file_artifacts(file.clone(), vec![chunk], vec![]).await.unwrap();

    assert!(store.delete_file_artifacts("root", "a.rs").await.unwrap());
    assert!(store.fetch_file_artifacts_by_path("root", "a.rs").await.unwrap().is_none());
  }
}
