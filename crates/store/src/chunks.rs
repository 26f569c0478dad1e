//! `chunks` table operations.

use std::sync::Arc;

use arrow_array::{Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray, UInt32Array};
use chrono::{TimeZone, Utc};
use engram_core::types::{Chunk, ChunkKind};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use uuid::Uuid;

use crate::connection::EngramStore;
use crate::error::{Result, StoreError};
use crate::schema::chunks_schema;

impl EngramStore {
  pub async fn delete_chunks_for_file(&self, file_id: &Uuid) -> Result<()> {
    let table = self.chunks_table().await?;
    table.delete(&format!("file_id = '{}'", file_id)).await?;
    Ok(())
  }

  pub async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
    if chunks.is_empty() {
      return Ok(());
    }
    let table = self.chunks_table().await?;
    let batch = chunks_to_batch(chunks)?;
    let batches = RecordBatchIterator::new(vec![Ok(batch)], chunks_schema());
    table.add(Box::new(batches)).execute().await?;
    Ok(())
  }

  pub async fn fetch_chunks_for_file(&self, file_id: &Uuid) -> Result<Vec<Chunk>> {
    let table = self.chunks_table().await?;
    let results: Vec<RecordBatch> = table
      .query()
      .only_if(format!("file_id = '{}'", file_id))
      .execute()
      .await?
      .try_collect()
      .await?;

    let mut chunks = Vec::new();
    for batch in &results {
      for i in 0..batch.num_rows() {
        chunks.push(batch_to_chunk(batch, i)?);
      }
    }
    chunks.sort_by_key(|c| c.ordinal);
    Ok(chunks)
  }

  pub async fn fetch_chunks_by_filter(&self, filter: Option<&str>) -> Result<Vec<Chunk>> {
    let table = self.chunks_table().await?;
    let query = match filter {
      Some(f) => table.query().only_if(f),
      None => table.query(),
    };
    let results: Vec<RecordBatch> = query.execute().await?.try_collect().await?;

    let mut chunks = Vec::new();
    for batch in &results {
      for i in 0..batch.num_rows() {
        chunks.push(batch_to_chunk(batch, i)?);
      }
    }
    Ok(chunks)
  }

  pub async fn count_chunks(&self, filter: Option<&str>) -> Result<usize> {
    let table = self.chunks_table().await?;
    Ok(table.count_rows(filter.map(|s| s.to_string())).await?)
  }
}

fn chunks_to_batch(chunks: &[Chunk]) -> Result<RecordBatch> {
  let n = chunks.len();
  let mut chunk_id = Vec::with_capacity(n);
  let mut file_id = Vec::with_capacity(n);
  let mut ordinal = Vec::with_capacity(n);
  let mut kind = Vec::with_capacity(n);
  let mut start_line: Vec<Option<u32>> = Vec::with_capacity(n);
  let mut end_line: Vec<Option<u32>> = Vec::with_capacity(n);
  let mut token_estimate = Vec::with_capacity(n);
  let mut content = Vec::with_capacity(n);
  let mut summary: Vec<Option<String>> = Vec::with_capacity(n);
  let mut created_at = Vec::with_capacity(n);
  let mut symbols = Vec::with_capacity(n);
  let mut language: Vec<Option<String>> = Vec::with_capacity(n);
  let mut imports = Vec::with_capacity(n);
  let mut calls = Vec::with_capacity(n);

  for c in chunks {
    chunk_id.push(c.chunk_id.to_string());
    file_id.push(c.file_id.to_string());
    ordinal.push(c.ordinal);
    kind.push(c.kind.as_str().to_string());
    start_line.push(c.start_line);
    end_line.push(c.end_line);
    token_estimate.push(c.token_estimate);
    content.push(c.content.clone());
    summary.push(c.summary.clone());
    created_at.push(c.created_at.timestamp_millis());
    symbols.push(serde_json::to_string(&c.symbols)?);
    language.push(c.language.clone());
    imports.push(serde_json::to_string(&c.imports)?);
    calls.push(serde_json::to_string(&c.calls)?);
  }

  let batch = RecordBatch::try_new(
    chunks_schema(),
    vec![
      Arc::new(StringArray::from(chunk_id)),
      Arc::new(StringArray::from(file_id)),
      Arc::new(UInt32Array::from(ordinal)),
      Arc::new(StringArray::from(kind)),
      Arc::new(UInt32Array::from(start_line)),
      Arc::new(UInt32Array::from(end_line)),
      Arc::new(UInt32Array::from(token_estimate)),
      Arc::new(StringArray::from(content)),
      Arc::new(StringArray::from(summary)),
      Arc::new(Int64Array::from(created_at)),
      Arc::new(StringArray::from(symbols)),
      Arc::new(StringArray::from(language)),
      Arc::new(StringArray::from(imports)),
      Arc::new(StringArray::from(calls)),
    ],
  )?;
  Ok(batch)
}

pub(crate) fn batch_to_chunk(batch: &RecordBatch, row: usize) -> Result<Chunk> {
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
  let get_u32 = |name: &str| -> Result<u32> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
      .map(|a| a.value(row))
      .ok_or_else(|| StoreError::NotFound(format!("column {name}")))
  };
  let get_u32_opt = |name: &str| -> Option<u32> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
      .filter(|a| !a.is_null(row))
      .map(|a| a.value(row))
  };
  let get_i64 = |name: &str| -> Result<i64> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
      .map(|a| a.value(row))
      .ok_or_else(|| StoreError::NotFound(format!("column {name}")))
  };

  let kind_str = get_str("kind")?;
  let kind = ChunkKind::from_str_opt(&kind_str).ok_or_else(|| StoreError::InvalidInput(format!("unknown chunk kind {kind_str}")))?;

  let symbols: Vec<String> = serde_json::from_str(&get_str("symbols")?).unwrap_or_default();
  let imports: Vec<String> = get_str_opt("imports").and_then(|j| serde_json::from_str(&j).ok()).unwrap_or_default();
  let calls: Vec<String> = get_str_opt("calls").and_then(|j| serde_json::from_str(&j).ok()).unwrap_or_default();

  Ok(Chunk {
    chunk_id: Uuid::parse_str(&get_str("chunk_id")?).map_err(|_| StoreError::InvalidInput("invalid chunk_id".into()))?,
    file_id: Uuid::parse_str(&get_str("file_id")?).map_err(|_| StoreError::InvalidInput("invalid file_id".into()))?,
    ordinal: get_u32("ordinal")?,
    kind,
    start_line: get_u32_opt("start_line"),
    end_line: get_u32_opt("end_line"),
    token_estimate: get_u32("token_estimate")?,
    content: get_str("content")?,
    summary: get_str_opt("summary"),
    created_at: Utc
      .timestamp_millis_opt(get_i64("created_at")?)
      .single()
      .ok_or_else(|| StoreError::InvalidInput("invalid created_at".into()))?,
    symbols,
    language: get_str_opt("language"),
    imports,
    calls,
  })
}
