//! Table schemas for the persisted layout of spec section 6: `file_state`,
//! `chunks`, `embeddings`, plus `bootstrap_errors`, `symbols`, `links`, and
//! `usage_metrics` carried only for FK-safe clear ordering during rebuild.

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

pub fn file_state_schema() -> Arc<Schema> {
  Arc::new(Schema::new(vec![
    Field::new("file_id", DataType::Utf8, false),
    Field::new("root_id", DataType::Utf8, false),
    Field::new("rel_path", DataType::Utf8, false),
    Field::new("abs_path", DataType::Utf8, false),
    Field::new("content_hash", DataType::Utf8, false),
    Field::new("size_bytes", DataType::UInt64, false),
    Field::new("mtime_ns", DataType::Int64, false),
    Field::new("language", DataType::Utf8, true),
    Field::new("kind", DataType::Utf8, true),
    Field::new("fingerprint", DataType::Utf8, true),
    Field::new("indexed_at", DataType::Int64, false),
    Field::new("is_deleted", DataType::Boolean, false),
  ]))
}

pub fn chunks_schema() -> Arc<Schema> {
  Arc::new(Schema::new(vec![
    Field::new("chunk_id", DataType::Utf8, false),
    Field::new("file_id", DataType::Utf8, false),
    Field::new("ordinal", DataType::UInt32, false),
    Field::new("kind", DataType::Utf8, false),
    Field::new("start_line", DataType::UInt32, true),
    Field::new("end_line", DataType::UInt32, true),
    Field::new("token_estimate", DataType::UInt32, false),
    Field::new("content", DataType::Utf8, false),
    Field::new("summary", DataType::Utf8, true),
    Field::new("created_at", DataType::Int64, false),
    Field::new("symbols", DataType::Utf8, false), // JSON array
    Field::new("language", DataType::Utf8, true),
    Field::new("imports", DataType::Utf8, false), // JSON array
    Field::new("calls", DataType::Utf8, false),   // JSON array
  ]))
}

pub fn embeddings_schema(vector_dim: usize) -> Arc<Schema> {
  Arc::new(Schema::new(vec![
    Field::new("embedding_id", DataType::Utf8, false),
    Field::new("chunk_id", DataType::Utf8, false),
    Field::new("model", DataType::Utf8, false),
    Field::new("dimensions", DataType::UInt32, false),
    Field::new(
      "vector",
      DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), vector_dim as i32),
      false,
    ),
    Field::new("created_at", DataType::Int64, false),
  ]))
}

pub fn bootstrap_errors_schema() -> Arc<Schema> {
  Arc::new(Schema::new(vec![
    Field::new("abs_path", DataType::Utf8, false),
    Field::new("message", DataType::Utf8, false),
    Field::new("occurred_at", DataType::Int64, false),
  ]))
}

/// Carried for FK-clear-order parity with spec section 6; the symbol-graph
/// subsystem that would populate this is an explicit non-goal here.
pub fn symbols_schema() -> Arc<Schema> {
  Arc::new(Schema::new(vec![
    Field::new("symbol_id", DataType::Utf8, false),
    Field::new("chunk_id", DataType::Utf8, false),
    Field::new("name", DataType::Utf8, false),
  ]))
}

/// Carried for FK-clear-order parity; cross-reference resolution is a
/// non-goal here (see `symbols_schema`).
pub fn links_schema() -> Arc<Schema> {
  Arc::new(Schema::new(vec![
    Field::new("link_id", DataType::Utf8, false),
    Field::new("from_chunk_id", DataType::Utf8, false),
    Field::new("to_symbol", DataType::Utf8, false),
  ]))
}

pub fn usage_metrics_schema() -> Arc<Schema> {
  Arc::new(Schema::new(vec![
    Field::new("metric_id", DataType::Utf8, false),
    Field::new("task_id", DataType::Utf8, true),
    Field::new("snippets_returned", DataType::UInt32, false),
    Field::new("tokens_used", DataType::UInt32, false),
    Field::new("latency_ms", DataType::UInt64, false),
    Field::new("recorded_at", DataType::Int64, false),
  ]))
}
