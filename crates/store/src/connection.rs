use std::path::PathBuf;

use lancedb::{connect, Connection};
use tracing::{debug, info};

use crate::error::Result;
use crate::schema::{
  bootstrap_errors_schema, chunks_schema, embeddings_schema, file_state_schema, links_schema, symbols_schema,
  usage_metrics_schema,
};

pub const TABLE_FILE_STATE: &str = "file_state";
pub const TABLE_CHUNKS: &str = "chunks";
pub const TABLE_EMBEDDINGS: &str = "embeddings";
pub const TABLE_BOOTSTRAP_ERRORS: &str = "bootstrap_errors";
pub const TABLE_SYMBOLS: &str = "symbols";
pub const TABLE_LINKS: &str = "links";
pub const TABLE_USAGE_METRICS: &str = "usage_metrics";

/// FK-safe clear order for destructive rebuild (spec section 6): leaves
/// before the tables they reference.
pub const DESTRUCTIVE_CLEAR_ORDER: &[&str] = &[
  TABLE_USAGE_METRICS,
  TABLE_LINKS,
  TABLE_SYMBOLS,
  TABLE_EMBEDDINGS,
  TABLE_CHUNKS,
  TABLE_FILE_STATE,
];

/// Connection to the LanceDB-backed store for one watched-tree workspace.
pub struct EngramStore {
  pub connection: Connection,
  pub vector_dim: usize,
}

impl EngramStore {
  pub async fn open_at_path(db_path: PathBuf, vector_dim: usize) -> Result<Self> {
    if let Some(parent) = db_path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }

    info!(path = %db_path.display(), vector_dim, "opening store connection");
    let connection = connect(db_path.to_string_lossy().as_ref()).execute().await?;

    let store = Self { connection, vector_dim };
    store.ensure_tables().await?;
    Ok(store)
  }

  async fn ensure_tables(&self) -> Result<()> {
    let existing = self.connection.table_names().execute().await?;
    debug!(existing = existing.len(), "checking required tables");

    if !existing.contains(&TABLE_FILE_STATE.to_string()) {
      self.connection.create_empty_table(TABLE_FILE_STATE, file_state_schema()).execute().await?;
    }
    if !existing.contains(&TABLE_CHUNKS.to_string()) {
      self.connection.create_empty_table(TABLE_CHUNKS, chunks_schema()).execute().await?;
    }
    if !existing.contains(&TABLE_EMBEDDINGS.to_string()) {
      self
        .connection
        .create_empty_table(TABLE_EMBEDDINGS, embeddings_schema(self.vector_dim))
        .execute()
        .await?;
    }
    if !existing.contains(&TABLE_BOOTSTRAP_ERRORS.to_string()) {
      self
        .connection
        .create_empty_table(TABLE_BOOTSTRAP_ERRORS, bootstrap_errors_schema())
        .execute()
        .await?;
    }
    if !existing.contains(&TABLE_SYMBOLS.to_string()) {
      self.connection.create_empty_table(TABLE_SYMBOLS, symbols_schema()).execute().await?;
    }
    if !existing.contains(&TABLE_LINKS.to_string()) {
      self.connection.create_empty_table(TABLE_LINKS, links_schema()).execute().await?;
    }
    if !existing.contains(&TABLE_USAGE_METRICS.to_string()) {
      self
        .connection
        .create_empty_table(TABLE_USAGE_METRICS, usage_metrics_schema())
        .execute()
        .await?;
    }

    Ok(())
  }

  pub async fn file_state_table(&self) -> Result<lancedb::Table> {
    Ok(self.connection.open_table(TABLE_FILE_STATE).execute().await?)
  }

  pub async fn chunks_table(&self) -> Result<lancedb::Table> {
    Ok(self.connection.open_table(TABLE_CHUNKS).execute().await?)
  }

  pub async fn embeddings_table(&self) -> Result<lancedb::Table> {
    Ok(self.connection.open_table(TABLE_EMBEDDINGS).execute().await?)
  }

  pub async fn bootstrap_errors_table(&self) -> Result<lancedb::Table> {
    Ok(self.connection.open_table(TABLE_BOOTSTRAP_ERRORS).execute().await?)
  }

  pub async fn usage_metrics_table(&self) -> Result<lancedb::Table> {
    Ok(self.connection.open_table(TABLE_USAGE_METRICS).execute().await?)
  }

  /// Drops and recreates every table in `DESTRUCTIVE_CLEAR_ORDER`. Used by
  /// the rebuild job's destructive phase; never by anything else.
  pub async fn clear_all_tables(&self) -> Result<()> {
    for name in DESTRUCTIVE_CLEAR_ORDER {
      info!(table = *name, "clearing table for rebuild");
      self.connection.drop_table(name).await?;
    }
    self.ensure_tables().await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[tokio::test]
  async fn open_creates_all_tables() {
    let dir = TempDir::new().unwrap();
    let store = EngramStore::open_at_path(dir.path().join("test.lancedb"), 8).await.unwrap();
    let names = store.connection.table_names().execute().await.unwrap();
    for expected in [TABLE_FILE_STATE, TABLE_CHUNKS, TABLE_EMBEDDINGS, TABLE_BOOTSTRAP_ERRORS] {
      assert!(names.iter().any(|n| n == expected), "missing table {expected}");
    }
  }

  #[tokio::test]
  async fn clear_all_tables_leaves_them_empty_but_present() {
    let dir = TempDir::new().unwrap();
    let store = EngramStore::open_at_path(dir.path().join("test.lancedb"), 8).await.unwrap();
    store.clear_all_tables().await.unwrap();
    let count = store.file_state_table().await.unwrap().count_rows(None).await.unwrap();
    assert_eq!(count, 0);
  }
}
