//! T1 `query_context`: the read path. Thin wrapper around the retrieval
//! pipeline that records the call into the metrics ring -- grounded in the
//! teacher's `service/code/search.rs` pattern of "delegate to the pipeline,
//! record usage, return".

use engram_retrieval::{QueryParams, QueryResult};

use crate::context::CoreContext;
use crate::error::Result;

pub async fn query_context(ctx: &CoreContext, params: QueryParams) -> Result<QueryResult> {
  let start = std::time::Instant::now();
  let result = ctx.retrieval.query(params).await?;
  ctx.metrics.record(None, result.hits.len(), result.metadata.tokens_used, start.elapsed().as_millis() as u64).await;
  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::Config;
  use engram_store::EngramStore;
  use std::sync::Arc;
  use tempfile::TempDir;

  #[tokio::test]
  async fn records_a_metrics_sample_per_call() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap());
    let config = Arc::new(Config::default());
    let ctx = CoreContext::new(store, Arc::new(engram_chunker::ChunkerRegistry::new()), Arc::new(engram_core::estimator::TokenEstimator::new()), config, None);

    let params = QueryParams { query: "anything".to_string(), ..Default::default() };
    query_context(&ctx, params).await.unwrap();

    assert_eq!(ctx.metrics.aggregate().await.total_records, 1);
  }

  #[tokio::test]
  async fn blank_query_is_rejected_before_reaching_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap());
    let config = Arc::new(Config::default());
    let ctx = CoreContext::new(store, Arc::new(engram_chunker::ChunkerRegistry::new()), Arc::new(engram_core::estimator::TokenEstimator::new()), config, None);

    let params = QueryParams { query: "   ".to_string(), ..Default::default() };
    let err = query_context(&ctx, params).await.unwrap_err();
    assert!(matches!(err, crate::error::ToolError::InvalidArgument(_)));
  }
}
