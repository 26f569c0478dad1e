//! C6 StartupReconciler: aligns the database with filesystem ground truth at
//! boot without a full rescan, generalizing the teacher's
//! `service/code/startup_scan.rs` (indexed-vs-disk diff, mtime+hash change
//! detection) from a single-project comparison to the multi-root, store-
//! backed shape of this spec.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use engram_chunker::ChunkerRegistry;
use engram_core::estimator::TokenEstimator;
use engram_core::Config;
use engram_store::EngramStore;
use tracing::{info, warn};

use crate::incremental::IncrementalIndexer;
use crate::scan::scan_root;

#[derive(Debug, Clone)]
pub struct ReconcileResult {
  pub new: usize,
  pub deleted: usize,
  pub started_at: DateTime<Utc>,
  pub completed_at: DateTime<Utc>,
  pub duration_ms: u64,
  /// Set on scan failure; counts above reflect whatever was salvaged before
  /// the failure, never a throw.
  pub error: Option<String>,
}

pub struct StartupReconciler<'a> {
  store: &'a EngramStore,
  registry: &'a ChunkerRegistry,
  estimator: &'a TokenEstimator,
  config: &'a Config,
}

impl<'a> StartupReconciler<'a> {
  pub fn new(store: &'a EngramStore, registry: &'a ChunkerRegistry, estimator: &'a TokenEstimator, config: &'a Config) -> Self {
    Self { store, registry, estimator, config }
  }

  pub async fn reconcile(&self) -> ReconcileResult {
    let started_at = Utc::now();
    let start = Instant::now();

    let indexed = match self.store.list_all_files().await {
      Ok(files) => files,
      Err(err) => {
        return ReconcileResult {
          new: 0,
          deleted: 0,
          started_at,
          completed_at: Utc::now(),
          duration_ms: start.elapsed().as_millis() as u64,
          error: Some(err.to_string()),
        };
      }
    };

    if indexed.is_empty() {
      info!("no indexed files yet, skipping startup reconciliation");
      return ReconcileResult { new: 0, deleted: 0, started_at, completed_at: Utc::now(), duration_ms: start.elapsed().as_millis() as u64, error: None };
    }

    let mut root_ids: Vec<&String> = self.config.roots.keys().collect();
    root_ids.sort();

    let mut scanned: HashMap<String, String> = HashMap::new();
    let mut scan_error: Option<String> = None;
    for root_id in &root_ids {
      let Some(root_path) = self.config.roots.get(*root_id) else { continue };
      let path = std::path::Path::new(root_path);
      if !path.exists() {
        let msg = format!("watch root '{root_id}' does not exist at {root_path}");
        warn!("{msg}");
        scan_error.get_or_insert(msg);
        continue;
      }
      for file in scan_root(path) {
        let abs = file.to_string_lossy().to_string();
        scanned.entry(abs).or_insert_with(|| (*root_id).clone());
      }
    }

    let indexed_paths: HashSet<String> = indexed.iter().map(|f| f.absolute_path.clone()).collect();

    let mut new_by_root: HashMap<String, Vec<PathBuf>> = HashMap::new();
    for (abs, root_id) in &scanned {
      if !indexed_paths.contains(abs) {
        new_by_root.entry(root_id.clone()).or_default().push(PathBuf::from(abs));
      }
    }

    let mut new_count = 0;
    for (root_id, paths) in new_by_root {
      let indexer = IncrementalIndexer::new(self.store, self.registry, self.estimator, self.config);
      match indexer.index_paths(&root_id, &paths, false, false).await {
        Ok(result) => new_count += result.total_touched(),
        Err(err) => scan_error.get_or_insert_with(|| err.to_string()),
      };
    }

    let mut deleted_count = 0;
    for record in indexed.iter().filter(|f| !scanned.contains_key(&f.absolute_path)) {
      if let Err(err) = self.store.soft_delete_file_record(&record.file_id).await {
        scan_error.get_or_insert_with(|| err.to_string());
        continue;
      }
      deleted_count += 1;
    }

    info!(new = new_count, deleted = deleted_count, "startup reconciliation complete");

    ReconcileResult {
      new: new_count,
      deleted: deleted_count,
      started_at,
      completed_at: Utc::now(),
      duration_ms: start.elapsed().as_millis() as u64,
      error: scan_error,
    }
  }
}
