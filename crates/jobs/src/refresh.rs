//! C10 RefreshJobs: sync (inline) and async (job-registry-tracked) variants
//! of reconciliation + incremental indexing. Generalizes the teacher's
//! `run_indexing` (scan -> actor hand-off -> progress channel) by replacing
//! the actor hand-off with a direct call into `IncrementalIndexer`/
//! `StartupReconciler` and the progress channel with `JobRegistry` polling.

use std::path::{Path, PathBuf};
use std::time::Instant;

use engram_chunker::ChunkerRegistry;
use engram_core::estimator::TokenEstimator;
use engram_core::types::{Job, JobMode, JobPhase, JobStatus};
use engram_core::Config;
use engram_indexer::{scan_root, IncrementalIndexer, UpdateResult};
use engram_store::EngramStore;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::registry::{mark_phase, JobRegistry};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshOutcome {
  pub new: usize,
  pub modified: usize,
  pub unchanged: usize,
  pub deleted: usize,
  pub indexing_failures: usize,
  pub duration_ms: u64,
}

impl From<UpdateResult> for RefreshOutcome {
  fn from(r: UpdateResult) -> Self {
    Self { new: r.new, modified: r.modified, unchanged: r.unchanged, deleted: r.deleted, indexing_failures: r.indexing_failures, duration_ms: r.duration.as_millis() as u64 }
  }
}

impl RefreshOutcome {
  fn accumulate(&mut self, other: UpdateResult) {
    self.new += other.new;
    self.modified += other.modified;
    self.unchanged += other.unchanged;
    self.deleted += other.deleted;
    self.indexing_failures += other.indexing_failures;
    self.duration_ms += other.duration.as_millis() as u64;
  }
}

/// Either rescans every configured root (`paths` is `None`, full reconcile
/// including implicit-deletion detection) or reindexes exactly the given
/// paths, grouped under whichever configured root prefixes them.
pub async fn run_refresh(store: &EngramStore, chunkers: &ChunkerRegistry, estimator: &TokenEstimator, config: &Config, paths: Option<&[PathBuf]>, force: bool) -> Result<RefreshOutcome> {
  let start = Instant::now();
  let indexer = IncrementalIndexer::new(store, chunkers, estimator, config);
  let mut outcome = RefreshOutcome::default();

  let mut root_ids: Vec<&String> = config.roots.keys().collect();
  root_ids.sort();

  match paths {
    Some(explicit) => {
      for root_id in root_ids {
        let root_path = &config.roots[root_id];
        let matching: Vec<PathBuf> = explicit.iter().filter(|p| p.starts_with(root_path)).cloned().collect();
        if matching.is_empty() {
          continue;
        }
        let result = indexer.index_paths(root_id, &matching, force, false).await?;
        outcome.accumulate(result);
      }
    }
    None => {
      for root_id in root_ids {
        let root_path = &config.roots[root_id];
        let scanned = scan_root(Path::new(root_path));
        let result = indexer.index_paths(root_id, &scanned, force, true).await?;
        outcome.accumulate(result);
      }
    }
  }

  outcome.duration_ms = start.elapsed().as_millis() as u64;
  Ok(outcome)
}

/// Allocates a job, returns its id immediately, and continues the refresh
/// on a spawned task. The job's cancellation flag is polled between roots;
/// a cancelled job completes the in-flight root before stopping (cooperative
/// cancellation -- no new root is scheduled after cancel).
pub async fn spawn_refresh(
  store: std::sync::Arc<EngramStore>,
  chunkers: std::sync::Arc<ChunkerRegistry>,
  estimator: std::sync::Arc<TokenEstimator>,
  config: std::sync::Arc<Config>,
  registry: JobRegistry,
  paths: Option<Vec<PathBuf>>,
  force: bool,
) -> Uuid {
  let mut job = Job::new(JobMode::Async);
  mark_phase(job, JobPhase::Rebuild);
  let job_id = job.job_id;
  let cancel = registry.insert(job).await;

  tokio::spawn(async move {
    let start = Instant::now();
    let mut outcome = RefreshOutcome::default();
    let indexer = IncrementalIndexer::new(&store, &chunkers, &estimator, &config);

    let mut root_ids: Vec<String> = config.roots.keys().cloned().collect();
    root_ids.sort();

    let mut failed = false;
    let mut error_message = None;

    for root_id in root_ids {
      if cancel.load(std::sync::atomic::Ordering::SeqCst) {
        info!(job_id = %job_id, "refresh job cancelled before completing all roots");
        break;
      }

      let root_path = config.roots[&root_id].clone();
      let target_paths: Option<Vec<PathBuf>> = paths.as_ref().map(|all| all.iter().filter(|p| p.starts_with(&root_path)).cloned().collect());

      let result = match &target_paths {
        Some(explicit) if explicit.is_empty() => continue,
        Some(explicit) => indexer.index_paths(&root_id, explicit, force, false).await,
        None => {
          let scanned = scan_root(Path::new(&root_path));
          indexer.index_paths(&root_id, &scanned, force, true).await
        }
      };

      match result {
        Ok(r) => {
          outcome.accumulate(r);
          registry
            .update(job_id, |job| {
              job.processed_files = (outcome.new + outcome.modified + outcome.unchanged) as u64;
              job.successful_files = (outcome.new + outcome.modified) as u64;
              job.failed_files = outcome.indexing_failures as u64;
            })
            .await;
        }
        Err(err) => {
          failed = true;
          error_message = Some(err.to_string());
          break;
        }
      }
    }

    outcome.duration_ms = start.elapsed().as_millis() as u64;

    registry
      .update(job_id, |job| {
        mark_phase(job, JobPhase::Completed);
        job.completed_at = Some(chrono::Utc::now());
        job.status = if failed {
          JobStatus::Failed
        } else if outcome.indexing_failures > 0 {
          JobStatus::CompletedWithErrors
        } else {
          JobStatus::Completed
        };
        job.error = error_message;
        job.logs.push(format!("refresh complete: new={} modified={} unchanged={} deleted={}", outcome.new, outcome.modified, outcome.unchanged, outcome.deleted));
      })
      .await;
  });

  job_id
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  async fn harness() -> (TempDir, EngramStore, ChunkerRegistry, TokenEstimator, Config) {
    let dir = TempDir::new().unwrap();
    let store = EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap();
    let mut config = Config::default();
    config.roots.insert("root".to_string(), dir.path().to_string_lossy().to_string());
    (dir, store, ChunkerRegistry::new(), TokenEstimator::new(), config)
  }

  #[tokio::test]
  async fn sync_refresh_indexes_new_files() {
    let (dir, store, chunkers, estimator, config) = harness().await;
    tokio::fs::write(dir.path().join("a.py"), "x = 1\n").await.unwrap();

    let outcome = run_refresh(&store, &chunkers, &estimator, &config, None, false).await.unwrap();
    assert_eq!(outcome.new, 1);
  }

  #[tokio::test]
  async fn explicit_paths_restrict_scope() {
    let (dir, store, chunkers, estimator, config) = harness().await;
    tokio::fs::write(dir.path().join("a.py"), "x = 1\n").await.unwrap();
    tokio::fs::write(dir.path().join("b.py"), "y = 2\n").await.unwrap();

    let target = vec![dir.path().join("a.py")];
    let outcome = run_refresh(&store, &chunkers, &estimator, &config, Some(&target), false).await.unwrap();
    assert_eq!(outcome.new, 1);
  }

  #[tokio::test]
  async fn async_refresh_completes_and_is_queryable() {
    let (dir, store, chunkers, estimator, config) = harness().await;
    tokio::fs::write(dir.path().join("a.py"), "x = 1\n").await.unwrap();

    let registry = JobRegistry::new(10);
    let job_id = spawn_refresh(
      std::sync::Arc::new(store),
      std::sync::Arc::new(chunkers),
      std::sync::Arc::new(estimator),
      std::sync::Arc::new(config),
      registry.clone(),
      None,
      false,
    )
    .await;

    for _ in 0..50 {
      if let Some(job) = registry.get(job_id).await {
        if !matches!(job.status, JobStatus::Running) {
          assert_eq!(job.status, JobStatus::Completed);
          return;
        }
      }
      tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("async refresh job never completed");
  }
}
