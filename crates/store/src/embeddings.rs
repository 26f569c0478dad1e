//! `embeddings` table operations.

use std::sync::Arc;

use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray, UInt32Array};
use chrono::{TimeZone, Utc};
use engram_core::types::Embedding;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use uuid::Uuid;

use crate::connection::EngramStore;
use crate::error::{Result, StoreError};
use crate::schema::embeddings_schema;

impl EngramStore {
  pub async fn delete_embeddings_for_chunks(&self, chunk_ids: &[Uuid]) -> Result<()> {
    if chunk_ids.is_empty() {
      return Ok(());
    }
    let table = self.embeddings_table().await?;
    let list = chunk_ids.iter().map(|id| format!("'{id}'")).collect::<Vec<_>>().join(", ");
    table.delete(&format!("chunk_id IN ({list})")).await?;
    Ok(())
  }

  pub async fn insert_embeddings(&self, embeddings: &[Embedding]) -> Result<()> {
    if embeddings.is_empty() {
      return Ok(());
    }
    let table = self.embeddings_table().await?;
    let batch = embeddings_to_batch(embeddings, self.vector_dim)?;
    let batches = RecordBatchIterator::new(vec![Ok(batch)], embeddings_schema(self.vector_dim));
    table.add(Box::new(batches)).execute().await?;
    Ok(())
  }

  pub async fn fetch_embeddings_for_chunks(&self, chunk_ids: &[Uuid]) -> Result<Vec<Embedding>> {
    if chunk_ids.is_empty() {
      return Ok(Vec::new());
    }
    let table = self.embeddings_table().await?;
    let list = chunk_ids.iter().map(|id| format!("'{id}'")).collect::<Vec<_>>().join(", ");
    let results: Vec<RecordBatch> = table
      .query()
      .only_if(format!("chunk_id IN ({list})"))
      .execute()
      .await?
      .try_collect()
      .await?;
    let mut embeddings = Vec::new();
    for batch in &results {
      for i in 0..batch.num_rows() {
        embeddings.push(batch_to_embedding(batch, i, self.vector_dim)?);
      }
    }
    Ok(embeddings)
  }

  pub async fn fetch_embedding_for_chunk(&self, chunk_id: &Uuid, model: &str) -> Result<Option<Embedding>> {
    let table = self.embeddings_table().await?;
    let results: Vec<RecordBatch> = table
      .query()
      .only_if(format!("chunk_id = '{chunk_id}' AND model = '{}'", model.replace('\'', "''")))
      .execute()
      .await?
      .try_collect()
      .await?;
    for batch in &results {
      if batch.num_rows() > 0 {
        return Ok(Some(batch_to_embedding(batch, 0, self.vector_dim)?));
      }
    }
    Ok(None)
  }

  pub async fn count_embeddings(&self) -> Result<usize> {
    let table = self.embeddings_table().await?;
    Ok(table.count_rows(None).await?)
  }
}

fn embeddings_to_batch(embeddings: &[Embedding], vector_dim: usize) -> Result<RecordBatch> {
  let n = embeddings.len();
  let mut embedding_id = Vec::with_capacity(n);
  let mut chunk_id = Vec::with_capacity(n);
  let mut model = Vec::with_capacity(n);
  let mut dimensions = Vec::with_capacity(n);
  let mut created_at = Vec::with_capacity(n);
  let mut flat_vector = Vec::with_capacity(n * vector_dim);

  for e in embeddings {
    embedding_id.push(e.embedding_id.to_string());
    chunk_id.push(e.chunk_id.to_string());
    model.push(e.model.clone());
    dimensions.push(e.dimensions);
    created_at.push(e.created_at.timestamp_millis());

    let mut v = e.vector.clone();
    v.resize(vector_dim, 0.0);
    flat_vector.extend(v);
  }

  let field = Arc::new(arrow_schema::Field::new("item", arrow_schema::DataType::Float32, true));
  let values = Float32Array::from(flat_vector);
  let vector_list = FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values), None)?;

  let batch = RecordBatch::try_new(
    embeddings_schema(vector_dim),
    vec![
      Arc::new(StringArray::from(embedding_id)),
      Arc::new(StringArray::from(chunk_id)),
      Arc::new(StringArray::from(model)),
      Arc::new(UInt32Array::from(dimensions)),
      Arc::new(vector_list),
      Arc::new(Int64Array::from(created_at)),
    ],
  )?;
  Ok(batch)
}

fn batch_to_embedding(batch: &RecordBatch, row: usize, vector_dim: usize) -> Result<Embedding> {
  let get_str = |name: &str| -> Result<String> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<StringArray>())
      .map(|a| a.value(row).to_string())
      .ok_or_else(|| StoreError::NotFound(format!("column {name}")))
  };
  let get_u32 = |name: &str| -> Result<u32> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
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

  let vector = batch
    .column_by_name("vector")
    .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
    .map(|arr| {
      let values = arr.value(row);
      let floats = values.as_any().downcast_ref::<Float32Array>().expect("vector values are f32");
      (0..vector_dim).map(|i| floats.value(i)).collect::<Vec<f32>>()
    })
    .ok_or_else(|| StoreError::NotFound("column vector".to_string()))?;

  Ok(Embedding {
    embedding_id: Uuid::parse_str(&get_str("embedding_id")?).map_err(|_| StoreError::InvalidInput("invalid embedding_id".into()))?,
    chunk_id: Uuid::parse_str(&get_str("chunk_id")?).map_err(|_| StoreError::InvalidInput("invalid chunk_id".into()))?,
    model: get_str("model")?,
    dimensions: get_u32("dimensions")?,
    vector,
    created_at: Utc
      .timestamp_millis_opt(get_i64("created_at")?)
      .single()
      .ok_or_else(|| StoreError::InvalidInput("invalid created_at".into()))?,
  })
}
