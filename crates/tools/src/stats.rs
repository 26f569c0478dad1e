//! T2 `get_context_stats`: aggregate storage and provider-health reporting.
//! Grounded in the teacher's `service/code/stats.rs` (`get_stats` walking
//! every chunk once to build language/kind breakdowns) generalized with
//! provider configuration and recent-query metrics the teacher's stats
//! call doesn't have a counterpart for.

use std::collections::HashMap;

use engram_metrics::{MetricsAggregate, QueryRecord};
use serde::{Deserialize, Serialize};

use crate::context::CoreContext;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
  pub enabled: bool,
  pub weight: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextStatsResult {
  pub total_files: usize,
  pub total_chunks: usize,
  pub total_embeddings: usize,
  pub language_breakdown: HashMap<String, usize>,
  pub kind_breakdown: HashMap<String, usize>,
  pub providers: HashMap<String, ProviderHealth>,
  pub metrics: MetricsAggregate,
  pub recent_queries: Vec<QueryRecord>,
}

pub async fn get_context_stats(ctx: &CoreContext, recent_limit: Option<usize>) -> Result<ContextStatsResult> {
  let files = ctx.store.list_all_files().await?;
  let chunks = ctx.store.fetch_chunks_by_filter(None).await?;
  let total_embeddings = ctx.store.count_embeddings().await?;

  let mut language_breakdown: HashMap<String, usize> = HashMap::new();
  let mut kind_breakdown: HashMap<String, usize> = HashMap::new();
  for chunk in &chunks {
    let language = chunk.language.clone().unwrap_or_else(|| "unknown".to_string());
    *language_breakdown.entry(language).or_insert(0) += 1;
    *kind_breakdown.entry(format!("{:?}", chunk.kind)).or_insert(0) += 1;
  }

  let providers = ctx.config.retrieval.providers.iter().map(|(id, cfg)| (id.clone(), ProviderHealth { enabled: cfg.enabled, weight: cfg.weight })).collect();

  let metrics = ctx.metrics.aggregate().await;
  let recent_queries = ctx.metrics.recent(recent_limit.unwrap_or(10)).await;

  Ok(ContextStatsResult {
    total_files: files.iter().filter(|f| !f.is_deleted).count(),
    total_chunks: chunks.len(),
    total_embeddings,
    language_breakdown,
    kind_breakdown,
    providers,
    metrics,
    recent_queries,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::Config;
  use engram_store::EngramStore;
  use std::sync::Arc;
  use tempfile::TempDir;

  async fn context() -> (TempDir, CoreContext) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap());
    let config = Arc::new(Config::default());
    let ctx = CoreContext::new(store, Arc::new(engram_chunker::ChunkerRegistry::new()), Arc::new(engram_core::estimator::TokenEstimator::new()), config, None);
    (dir, ctx)
  }

  #[tokio::test]
  async fn empty_store_reports_zero_totals() {
    let (_dir, ctx) = context().await;
    let stats = get_context_stats(&ctx, None).await.unwrap();
    assert_eq!(stats.total_files, 0);
    assert_eq!(stats.total_chunks, 0);
    assert_eq!(stats.total_embeddings, 0);
  }

  #[tokio::test]
  async fn reports_known_providers_from_config() {
    let (_dir, ctx) = context().await;
    let stats = get_context_stats(&ctx, None).await.unwrap();
    assert!(stats.providers.contains_key("semantic"));
  }
}
