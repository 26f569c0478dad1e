//! C9 RetrievalPipeline: wires providers, the store, and `RetrievalConfig`
//! together into the nine-step algorithm (filter, fan-out, fuse, boost, MMR,
//! neighbor expansion, dedup, pack, metadata). Generalizes the teacher's
//! single-path `service/code/search.rs::search` into a pipeline over several
//! providers, fanned out the way the teacher's actor handles fan out
//! requests over a channel, here via concurrent futures instead.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use engram_core::config::RetrievalConfig;
use engram_core::types::ChunkKind;
use engram_store::{ChunkScope, EngramStore};
use tracing::warn;

use crate::boost::apply_boosts;
use crate::dedup::dedup;
use crate::error::{RetrievalError, Result};
use crate::fusion::{fuse, sort_by_fused_score};
use crate::mmr;
use crate::neighbors::{expand_neighbors, to_snippet};
use crate::packing::pack;
use crate::providers::Provider;
use crate::types::{ProviderStat, QueryParams, QueryResult, RetrievalMetadata};

const DEFAULT_K: usize = 20;

pub struct RetrievalPipeline {
  store: Arc<EngramStore>,
  providers: Vec<Arc<dyn Provider>>,
  config: RetrievalConfig,
}

impl RetrievalPipeline {
  pub fn new(store: Arc<EngramStore>, providers: Vec<Arc<dyn Provider>>, config: RetrievalConfig) -> Self {
    Self { store, providers, config }
  }

  pub async fn query(&self, params: QueryParams) -> Result<QueryResult> {
    if params.query.trim().is_empty() {
      return Err(RetrievalError::InvalidArgument("query must not be blank".to_string()));
    }

    let max_tokens = params.max_tokens.unwrap_or(self.config.default_max_tokens).clamp(self.config.min_max_tokens, self.config.max_max_tokens);
    let k = params.k.unwrap_or(DEFAULT_K);
    let mut warnings = Vec::new();

    let mut kinds = Vec::new();
    if let Some(requested) = &params.kinds {
      for k in requested {
        match ChunkKind::from_str_opt(k) {
          Some(parsed) => kinds.push(parsed),
          None => warnings.push(format!("unknown kind '{k}' ignored")),
        }
      }
    }

    let scope = ChunkScope {
      paths: params.paths.clone().unwrap_or_default(),
      languages: params.languages.clone().unwrap_or_default().into_iter().map(|l| l.to_lowercase()).collect(),
      kinds,
      exclude_patterns: params.exclude_patterns.clone().unwrap_or_default(),
    };

    let candidates = self.store.search_chunks(&scope).await?;

    let active_providers: Vec<&Arc<dyn Provider>> = self
      .providers
      .iter()
      .filter(|p| {
        let enabled = self.config.providers.get(p.id()).map(|c| c.enabled).unwrap_or(false);
        let requested = params.providers.as_ref().map(|allow| allow.iter().any(|id| id == p.id())).unwrap_or(true);
        enabled && requested
      })
      .collect();

    if active_providers.is_empty() {
      warnings.push("no providers enabled for this query".to_string());
      return Ok(QueryResult {
        hits: Vec::new(),
        metadata: RetrievalMetadata { tokens_requested: max_tokens, warnings, fallback_used: Some(true), ..Default::default() },
      });
    }

    let deadline = Duration::from_millis(self.config.soft_deadline_ms);
    let mut provider_hits = HashMap::new();
    let mut provider_stats = HashMap::new();

    let candidates_ref = &candidates;
    let query_ref = params.query.as_str();
    let futures = active_providers.iter().map(|provider| {
      let id = provider.id();
      async move {
        let started = Instant::now();
        let outcome = tokio::time::timeout(deadline, provider.query(query_ref, candidates_ref)).await;
        (id, outcome, started.elapsed())
      }
    });

    for (id, outcome, elapsed) in futures::future::join_all(futures).await {
      match outcome {
        Ok(hits) => {
          let max_score = hits.iter().map(|h| h.raw_score).fold(0.0f32, f32::max);
          provider_stats.insert(id.to_string(), ProviderStat { count: hits.len(), max_score, latency_ms: elapsed.as_millis() as u64, timed_out: false });
          provider_hits.insert(id.to_string(), hits);
        }
        Err(_) => {
          warn!(provider = id, "provider exceeded soft deadline, contributing nothing");
          warnings.push(format!("provider '{id}' timed out"));
          provider_stats.insert(id.to_string(), ProviderStat { count: 0, max_score: 0.0, latency_ms: elapsed.as_millis() as u64, timed_out: true });
        }
      }
    }

    let weights: HashMap<String, f32> = self.config.providers.iter().map(|(id, cfg)| (id.clone(), cfg.weight)).collect();
    let mut fused = fuse(candidates, &provider_hits, &weights);
    apply_boosts(&mut fused, &self.config.path_boosts, &self.config.language_boosts);
    sort_by_fused_score(&mut fused);

    let total_hits = fused.len();

    let selected = if self.config.use_mmr {
      mmr::select(fused, k, self.config.diversity_weight)
    } else {
      fused.truncate(k);
      fused
    };

    let expanded = expand_neighbors(&self.store, selected, self.config.neighbor_window).await?;
    let mut deduped = dedup(expanded);
    sort_by_fused_score(&mut deduped);

    let packed = pack(deduped, max_tokens);
    let hits: Vec<_> = packed.packed.iter().map(to_snippet).collect();
    let returned_hits = hits.len();

    Ok(QueryResult {
      hits,
      metadata: RetrievalMetadata {
        total_hits,
        returned_hits,
        tokens_used: packed.tokens_used,
        tokens_requested: max_tokens,
        provider_stats,
        warnings,
        fallback_used: Some(false),
      },
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::config::ProviderConfig;
  use engram_core::types::{Chunk, FileRecord};
  use tempfile::TempDir;

  use crate::providers::{FullTextProvider, SymbolProvider};

  async fn harness() -> (TempDir, Arc<EngramStore>) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap());
    (dir, store)
  }

  fn retrieval_config() -> RetrievalConfig {
    let mut cfg = RetrievalConfig::default();
    cfg.providers.insert("full_text".to_string(), ProviderConfig::new(true, 1.0));
    cfg.providers.insert("symbol".to_string(), ProviderConfig::new(true, 1.0));
    cfg.providers.insert("semantic".to_string(), ProviderConfig::new(false, 1.0));
    cfg.providers.insert("git_history".to_string(), ProviderConfig::new(false, 1.0));
    cfg
  }

  #[tokio::test]
  async fn blank_query_is_rejected() {
    let (_dir, store) = harness().await;
    let pipeline = RetrievalPipeline::new(store, vec![Arc::new(FullTextProvider::new())], retrieval_config());
    let result = pipeline.query(QueryParams { query: "   ".to_string(), ..Default::default() }).await;
    assert!(matches!(result, Err(RetrievalError::InvalidArgument(_))));
  }

  #[tokio::test]
  async fn no_enabled_providers_returns_empty_with_warning() {
    let (_dir, store) = harness().await;
    let mut cfg = retrieval_config();
    cfg.providers.get_mut("full_text").unwrap().enabled = false;
    cfg.providers.get_mut("symbol").unwrap().enabled = false;
    let pipeline = RetrievalPipeline::new(store, vec![Arc::new(FullTextProvider::new())], cfg);

    let result = pipeline.query(QueryParams { query: "authenticate".to_string(), ..Default::default() }).await.unwrap();
    assert!(result.hits.is_empty());
    assert_eq!(result.metadata.fallback_used, Some(true));
    assert!(!result.metadata.warnings.is_empty());
  }

  #[tokio::test]
  async fn returns_matching_chunk_within_budget() {
    let (_dir, store) = harness().await;
    let file = FileRecord::new("root", "auth.rs", "/abs/auth.rs");
    let mut chunk = Chunk::new(file.file_id, 0, engram_core::types::ChunkKind::CodeFunction, "fn authenticate_user() { verify_token() }");
    chunk.token_estimate = 20;
    chunk.symbols = vec!["authenticate_user".to_string()];
    store.replace_file_artifacts(file, vec![chunk], vec![]).await.unwrap();

    let pipeline = RetrievalPipeline::new(store, vec![Arc::new(FullTextProvider::new()), Arc::new(SymbolProvider::new())], retrieval_config());
    let result = pipeline.query(QueryParams { query: "authenticate".to_string(), max_tokens: Some(1000), ..Default::default() }).await.unwrap();

    assert_eq!(result.hits.len(), 1);
    assert_eq!(result.hits[0].file_path, "auth.rs");
    assert!(result.metadata.tokens_used <= 1000);
  }

  #[tokio::test]
  async fn unknown_kind_is_dropped_with_warning_not_rejected() {
    let (_dir, store) = harness().await;
    let pipeline = RetrievalPipeline::new(store, vec![Arc::new(FullTextProvider::new())], retrieval_config());
    let result = pipeline
      .query(QueryParams { query: "anything".to_string(), kinds: Some(vec!["NOT_A_REAL_KIND".to_string()]), ..Default::default() })
      .await
      .unwrap();
    assert!(result.metadata.warnings.iter().any(|w| w.contains("NOT_A_REAL_KIND")));
  }
}
