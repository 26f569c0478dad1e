//! `CoreContext`: the single value the five tool functions are threaded
//! through. Consolidates the global flags the design notes call out
//! (`rebuild_in_progress`, the job registry, the metrics ring) into one
//! struct constructed once at startup and torn down at shutdown, instead of
//! module-level statics -- grounded in the teacher's `Arc<ProjectDb>` shared
//! across actor handles (`service/mod.rs`), generalized from "one database
//! handle" to "one handle per concern, all owned here".

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use engram_chunker::ChunkerRegistry;
use engram_core::estimator::TokenEstimator;
use engram_core::Config;
use engram_jobs::JobRegistry;
use engram_metrics::MetricsCollector;
use engram_retrieval::{FullTextProvider, GitHistoryProvider, Provider, QueryEmbedder, RetrievalPipeline, SemanticProvider, SymbolProvider};
use engram_store::EngramStore;
use tokio::sync::Mutex;

/// Per-`absolute_path` lock table so refresh/rebuild never write the same
/// file concurrently (spec section 5). Coarser callers (the rebuild job,
/// which is already serialized store-wide via `rebuild_in_progress`) do not
/// need it; it exists for future concurrent per-file refresh callers.
#[derive(Default)]
pub struct PathLockTable {
  locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PathLockTable {
  pub async fn lock_for(&self, absolute_path: &str) -> Arc<Mutex<()>> {
    let mut table = self.locks.lock().await;
    table.entry(absolute_path.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
  }
}

pub struct CoreContext {
  pub store: Arc<EngramStore>,
  pub chunkers: Arc<ChunkerRegistry>,
  pub estimator: Arc<TokenEstimator>,
  pub config: Arc<Config>,
  pub retrieval: RetrievalPipeline,
  pub jobs: JobRegistry,
  pub rebuild_in_progress: Arc<AtomicBool>,
  pub metrics: Arc<MetricsCollector>,
  pub file_locks: Arc<PathLockTable>,
}

impl CoreContext {
  /// `embedder` is the external collaborator that backs the `semantic`
  /// provider; passing `None` is valid (spec treats missing/failing
  /// embedding as single-provider degradation, not a hard failure).
  pub fn new(store: Arc<EngramStore>, chunkers: Arc<ChunkerRegistry>, estimator: Arc<TokenEstimator>, config: Arc<Config>, embedder: Option<Arc<dyn QueryEmbedder>>) -> Self {
    let providers: Vec<Arc<dyn Provider>> = vec![
      Arc::new(SemanticProvider::new(store.clone(), embedder, "default")),
      Arc::new(SymbolProvider::new()),
      Arc::new(FullTextProvider::new()),
      Arc::new(GitHistoryProvider::new()),
    ];
    let retrieval = RetrievalPipeline::new(store.clone(), providers, config.retrieval.clone());

    Self {
      jobs: JobRegistry::new(config.job_retention),
      metrics: Arc::new(MetricsCollector::new(10_000)),
      rebuild_in_progress: Arc::new(AtomicBool::new(false)),
      file_locks: Arc::new(PathLockTable::default()),
      store,
      chunkers,
      estimator,
      config,
      retrieval,
    }
  }
}
