//! `file_state` table operations: upsert, fetch by path, list, delete.

use std::sync::Arc;

use arrow_array::{Array, BooleanArray, Int64Array, RecordBatch, RecordBatchIterator, StringArray, UInt64Array};
use chrono::{TimeZone, Utc};
use engram_core::types::FileRecord;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use uuid::Uuid;

use crate::connection::EngramStore;
use crate::error::{Result, StoreError};
use crate::schema::file_state_schema;

impl EngramStore {
  pub async fn upsert_file_record(&self, file: &FileRecord) -> Result<()> {
    let table = self.file_state_table().await?;
    table.delete(&format!("file_id = '{}'", file.file_id)).await?;

    let batch = file_record_to_batch(file)?;
    let batches = RecordBatchIterator::new(vec![Ok(batch)], file_state_schema());
    table.add(Box::new(batches)).execute().await?;
    Ok(())
  }

  pub async fn fetch_file_record_by_path(&self, root_id: &str, rel_path: &str) -> Result<Option<FileRecord>> {
    let filter = format!(
      "root_id = '{}' AND rel_path = '{}' AND is_deleted = false",
      escape(root_id),
      escape(rel_path)
    );
    self.fetch_one_file_record(&filter).await
  }

  pub async fn fetch_file_record_by_abs_path(&self, abs_path: &str) -> Result<Option<FileRecord>> {
    let filter = format!("abs_path = '{}' AND is_deleted = false", escape(abs_path));
    self.fetch_one_file_record(&filter).await
  }

  async fn fetch_one_file_record(&self, filter: &str) -> Result<Option<FileRecord>> {
    let table = self.file_state_table().await?;
    let results: Vec<RecordBatch> = table.query().only_if(filter).execute().await?.try_collect().await?;
    for batch in &results {
      if batch.num_rows() > 0 {
        return Ok(Some(batch_to_file_record(batch, 0)?));
      }
    }
    Ok(None)
  }

  /// All active (non-soft-deleted) file records, for reconciliation and
  /// `list_all_files`.
  pub async fn list_all_files(&self) -> Result<Vec<FileRecord>> {
    let table = self.file_state_table().await?;
    let results: Vec<RecordBatch> = table
      .query()
      .only_if("is_deleted = false")
      .execute()
      .await?
      .try_collect()
      .await?;

    let mut files = Vec::new();
    for batch in &results {
      for i in 0..batch.num_rows() {
        files.push(batch_to_file_record(batch, i)?);
      }
    }
    Ok(files)
  }

  pub async fn soft_delete_file_record(&self, file_id: &Uuid) -> Result<()> {
    let table = self.file_state_table().await?;
    table
      .update()
      .only_if(format!("file_id = '{}'", file_id))
      .column("is_deleted", "true")
      .execute()
      .await?;
    Ok(())
  }

  pub async fn hard_delete_file_record(&self, file_id: &Uuid) -> Result<()> {
    let table = self.file_state_table().await?;
    table.delete(&format!("file_id = '{}'", file_id)).await?;
    Ok(())
  }
}

fn escape(s: &str) -> String {
  s.replace('\'', "''")
}

pub(crate) fn file_record_to_batch(file: &FileRecord) -> Result<RecordBatch> {
  let batch = RecordBatch::try_new(
    file_state_schema(),
    vec![
      Arc::new(StringArray::from(vec![file.file_id.to_string()])),
      Arc::new(StringArray::from(vec![file.root_id.clone()])),
      Arc::new(StringArray::from(vec![file.relative_path.clone()])),
      Arc::new(StringArray::from(vec![file.absolute_path.clone()])),
      Arc::new(StringArray::from(vec![file.content_hash.clone()])),
      Arc::new(UInt64Array::from(vec![file.size_bytes])),
      Arc::new(Int64Array::from(vec![file.modified_time_ns])),
      Arc::new(StringArray::from(vec![file.language.clone()])),
      Arc::new(StringArray::from(vec![file.kind.clone()])),
      Arc::new(StringArray::from(vec![file.fingerprint.clone()])),
      Arc::new(Int64Array::from(vec![file.indexed_at.timestamp_millis()])),
      Arc::new(BooleanArray::from(vec![file.is_deleted])),
    ],
  )?;
  Ok(batch)
}

pub(crate) fn batch_to_file_record(batch: &RecordBatch, row: usize) -> Result<FileRecord> {
  let get_str = |name: &str| -> Result<String> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<StringArray>())
      .map(|a| a.value(row).to_string())
      .ok_or_else(|| StoreError::NotFound(format!("column {name}")))
  };
  let get_str_opt = |name: &str| -> Option<String> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<StringArray>())
      .filter(|a| !a.is_null(row))
      .map(|a| a.value(row).to_string())
  };
  let get_u64 = |name: &str| -> Result<u64> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<UInt64Array>())
      .map(|a| a.value(row))
      .ok_or_else(|| StoreError::NotFound(format!("column {name}")))
  };
  let get_i64 = |name: &str| -> Result<i64> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
      .map(|a| a.value(row))
      .ok_or_else(|| StoreError::NotFound(format!("column {name}")))
  };
  let get_bool = |name: &str| -> Result<bool> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<BooleanArray>())
      .map(|a| a.value(row))
      .ok_or_else(|| StoreError::NotFound(format!("column {name}")))
  };

  Ok(FileRecord {
    file_id: Uuid::parse_str(&get_str("file_id")?).map_err(|_| StoreError::NotFound("invalid file_id".into()))?,
    root_id: get_str("root_id")?,
    relative_path: get_str("rel_path")?,
    absolute_path: get_str("abs_path")?,
    content_hash: get_str("content_hash")?,
    size_bytes: get_u64("size_bytes")?,
    modified_time_ns: get_i64("mtime_ns")?,
    language: get_str_opt("language"),
    kind: get_str_opt("kind"),
    fingerprint: get_str_opt("fingerprint"),
    indexed_at: Utc
      .timestamp_millis_opt(get_i64("indexed_at")?)
      .single()
      .ok_or_else(|| StoreError::NotFound("invalid indexed_at".into()))?,
    is_deleted: get_bool("is_deleted")?,
  })
}
