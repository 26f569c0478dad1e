//! Value types for the retrieval pipeline's public surface: request params,
//! provider contributions, and the diagnostics bundle returned alongside
//! hits (spec section 4.8, step 9).

use std::collections::HashMap;

use engram_core::types::ContextSnippet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryParams {
  pub query: String,
  pub k: Option<usize>,
  pub max_tokens: Option<u32>,
  pub paths: Option<Vec<String>>,
  pub languages: Option<Vec<String>>,
  pub kinds: Option<Vec<String>>,
  pub exclude_patterns: Option<Vec<String>>,
  pub providers: Option<Vec<String>>,
}

/// One provider's raw contribution for a single chunk, prior to fusion.
#[derive(Debug, Clone)]
pub struct ProviderHit {
  pub chunk_id: Uuid,
  pub raw_score: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderStat {
  pub count: usize,
  pub max_score: f32,
  pub latency_ms: u64,
  pub timed_out: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalMetadata {
  pub total_hits: usize,
  pub returned_hits: usize,
  pub tokens_used: u32,
  pub tokens_requested: u32,
  pub provider_stats: HashMap<String, ProviderStat>,
  pub warnings: Vec<String>,
  pub fallback_used: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
  pub hits: Vec<ContextSnippet>,
  pub metadata: RetrievalMetadata,
}
