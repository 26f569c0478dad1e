//! Immutable configuration value for the indexing core.
//!
//! The core never parses CLI flags or config files itself; a caller builds a
//! `Config` (e.g. by deserializing one with `serde`) and hands it to
//! `CoreContext` at construction time. Loading from disk is the caller's job.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
  pub enabled: bool,
  pub weight: f32,
}

impl ProviderConfig {
  pub fn new(enabled: bool, weight: f32) -> Self {
    Self { enabled, weight }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
  pub default_max_tokens: u32,
  pub min_max_tokens: u32,
  pub max_max_tokens: u32,
  pub use_mmr: bool,
  pub diversity_weight: f32,
  pub neighbor_window: u32,
  /// path prefix -> multiplicative boost factor
  pub path_boosts: HashMap<String, f32>,
  /// lowercase language slug -> multiplicative boost factor
  pub language_boosts: HashMap<String, f32>,
  pub soft_deadline_ms: u64,
  pub providers: HashMap<String, ProviderConfig>,
}

impl Default for RetrievalConfig {
  fn default() -> Self {
    let mut providers = HashMap::new();
    providers.insert("semantic".to_string(), ProviderConfig::new(true, 0.55));
    providers.insert("symbol".to_string(), ProviderConfig::new(true, 0.30));
    providers.insert("full_text".to_string(), ProviderConfig::new(true, 0.15));
    providers.insert("git_history".to_string(), ProviderConfig::new(false, 0.10));

    Self {
      default_max_tokens: 4000,
      min_max_tokens: 1000,
      max_max_tokens: 120_000,
      use_mmr: true,
      diversity_weight: 0.3,
      neighbor_window: 1,
      path_boosts: HashMap::new(),
      language_boosts: HashMap::new(),
      soft_deadline_ms: 1500,
      providers,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
  pub parallelism: usize,
  pub max_file_size_bytes: u64,
}

impl Default for WorkerPoolConfig {
  fn default() -> Self {
    Self { parallelism: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4), max_file_size_bytes: 1024 * 1024 }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
  /// root_id -> absolute path of watched root.
  pub roots: HashMap<String, String>,
  pub allow_extensions: Option<Vec<String>>,
  pub deny_extensions: Vec<String>,
  pub retrieval: RetrievalConfig,
  pub worker_pool: WorkerPoolConfig,
  pub embedding_cache_size: usize,
  pub job_retention: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      roots: HashMap::new(),
      allow_extensions: None,
      deny_extensions: Vec::new(),
      retrieval: RetrievalConfig::default(),
      worker_pool: WorkerPoolConfig::default(),
      embedding_cache_size: 10_000,
      job_retention: 100,
    }
  }
}

impl Config {
  /// Validates ranges that are not already enforced by their containing
  /// type; does not touch disk or the environment.
  pub fn validate(&self) -> Result<(), String> {
    if self.retrieval.min_max_tokens == 0 {
      return Err("retrieval.min_max_tokens must be > 0".to_string());
    }
    if self.retrieval.min_max_tokens > self.retrieval.max_max_tokens {
      return Err("retrieval.min_max_tokens must be <= retrieval.max_max_tokens".to_string());
    }
    if !(0.0..=1.0).contains(&self.retrieval.diversity_weight) {
      return Err("retrieval.diversity_weight must be in [0,1]".to_string());
    }
    if self.worker_pool.parallelism == 0 {
      return Err("worker_pool.parallelism must be >= 1".to_string());
    }
    Ok(())
  }

  pub fn is_extension_allowed(&self, ext: &str) -> bool {
    let ext = ext.to_lowercase();
    if self.deny_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
      return false;
    }
    match &self.allow_extensions {
      Some(allowed) => allowed.iter().any(|e| e.eq_ignore_ascii_case(&ext)),
      None => true,
    }
  }
}
