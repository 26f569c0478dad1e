//! C7 BootstrapErrorLog: a single-table log of per-path ingestion failures,
//! keyed by absolute path. Recreated (dropped + created) on `reset()` so
//! each indexing run starts clean.

use std::sync::Arc;

use arrow_array::{Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};

use crate::connection::{EngramStore, TABLE_BOOTSTRAP_ERRORS};
use crate::error::{Result, StoreError};
use crate::schema::bootstrap_errors_schema;

#[derive(Debug, Clone)]
pub struct BootstrapError {
  pub abs_path: String,
  pub message: String,
  pub occurred_at: chrono::DateTime<Utc>,
}

impl EngramStore {
  /// Drops and recreates `bootstrap_errors` so the log starts clean for a
  /// new indexing run.
  pub async fn reset_bootstrap_errors(&self) -> Result<()> {
    let names = self.connection.table_names().execute().await?;
    if names.contains(&TABLE_BOOTSTRAP_ERRORS.to_string()) {
      self.connection.drop_table(TABLE_BOOTSTRAP_ERRORS).await?;
    }
    self
      .connection
      .create_empty_table(TABLE_BOOTSTRAP_ERRORS, bootstrap_errors_schema())
      .execute()
      .await?;
    Ok(())
  }

  pub async fn log_bootstrap_error(&self, abs_path: &str, message: &str) -> Result<()> {
    let table = self.bootstrap_errors_table().await?;
    let batch = RecordBatch::try_new(
      bootstrap_errors_schema(),
      vec![
        Arc::new(StringArray::from(vec![abs_path.to_string()])),
        Arc::new(StringArray::from(vec![message.to_string()])),
        Arc::new(Int64Array::from(vec![Utc::now().timestamp_millis()])),
      ],
    )?;
    let batches = RecordBatchIterator::new(vec![Ok(batch)], bootstrap_errors_schema());
    table.add(Box::new(batches)).execute().await?;
    Ok(())
  }

  pub async fn list_bootstrap_errors(&self) -> Result<Vec<BootstrapError>> {
    let table = self.bootstrap_errors_table().await?;
    let results: Vec<RecordBatch> = table.query().execute().await?.try_collect().await?;
    let mut errors = Vec::new();
    for batch in &results {
      for i in 0..batch.num_rows() {
        errors.push(batch_to_error(batch, i)?);
      }
    }
    Ok(errors)
  }

  pub async fn clear_bootstrap_errors(&self) -> Result<()> {
    let table = self.bootstrap_errors_table().await?;
    table.delete("true").await?;
    Ok(())
  }

  /// Returns every logged path and clears the log, so the caller can retry
  /// ingestion for them.
  pub async fn retry_failed_bootstrap_paths(&self) -> Result<Vec<String>> {
    let errors = self.list_bootstrap_errors().await?;
    self.clear_bootstrap_errors().await?;
    Ok(errors.into_iter().map(|e| e.abs_path).collect())
  }
}

fn batch_to_error(batch: &RecordBatch, row: usize) -> Result<BootstrapError> {
  use arrow_array::Array;
  use chrono::TimeZone;

  let get_str = |name: &str| -> Result<String> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<StringArray>())
      .map(|a| a.value(row).to_string())
      .ok_or_else(|| StoreError::NotFound(format!("column {name}")))
  };
  let occurred_at = batch
    .column_by_name("occurred_at")
    .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
    .map(|a| a.value(row))
    .ok_or_else(|| StoreError::NotFound("column occurred_at".to_string()))?;

  Ok(BootstrapError {
    abs_path: get_str("abs_path")?,
    message: get_str("message")?,
    occurred_at: Utc
      .timestamp_millis_opt(occurred_at)
      .single()
      .ok_or_else(|| StoreError::InvalidInput("invalid occurred_at".into()))?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[tokio::test]
  async fn log_list_clear_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap();

    store.log_bootstrap_error("/a.rs", "parse error").await.unwrap();
    store.log_bootstrap_error("/b.rs", "io error").await.unwrap();

    let errors = store.list_bootstrap_errors().await.unwrap();
    assert_eq!(errors.len(), 2);

    let retried = store.retry_failed_bootstrap_paths().await.unwrap();
    assert_eq!(retried.len(), 2);

    let remaining = store.list_bootstrap_errors().await.unwrap();
    assert!(remaining.is_empty());
  }

  #[tokio::test]
  async fn reset_drops_prior_entries() {
    let dir = TempDir::new().unwrap();
    let store = EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap();
    store.log_bootstrap_error("/a.rs", "err").await.unwrap();
    store.reset_bootstrap_errors().await.unwrap();
    assert!(store.list_bootstrap_errors().await.unwrap().is_empty());
  }
}
