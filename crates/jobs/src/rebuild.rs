//! C11 RebuildJobs: destructive full reindex, gated by a single process-wide
//! `rebuild_in_progress` flag (owned by the caller's `CoreContext` and handed
//! in here, per the design note consolidating global flags into `CoreContext`
//! rather than module statics). Phases mirror spec section 4.10 exactly:
//! validation -> pre-rebuild -> destructive -> rebuild -> post-rebuild.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use engram_chunker::ChunkerRegistry;
use engram_core::estimator::TokenEstimator;
use engram_core::types::{Job, JobMode, JobPhase, JobStatus};
use engram_core::Config;
use engram_indexer::{scan_root, IncrementalIndexer};
use engram_store::EngramStore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{JobError, Result};
use crate::registry::{mark_phase, JobRegistry};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebuildParams {
  pub confirm: bool,
  pub async_mode: bool,
  pub paths: Option<Vec<PathBuf>>,
  pub validate_only: bool,
  pub parallelism: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RebuildOutcome {
  ValidationFailed { errors: Vec<String> },
  ValidatedOnly,
  Started { job_id: Uuid },
  Completed { job: Job },
}

fn validate(params: &RebuildParams) -> Vec<String> {
  let mut errors = Vec::new();
  if !params.validate_only && !params.confirm {
    errors.push("confirm=true is required".to_string());
  }
  if let Some(parallelism) = params.parallelism {
    if parallelism == 0 {
      errors.push("parallelism must be >= 1".to_string());
    }
  }
  if let Some(paths) = &params.paths {
    for path in paths {
      if !path.exists() {
        errors.push(format!("path does not exist: {}", path.display()));
      }
    }
  }
  errors
}

pub struct RebuildJobs {
  in_progress: Arc<AtomicBool>,
}

impl RebuildJobs {
  pub fn new(in_progress: Arc<AtomicBool>) -> Self {
    Self { in_progress }
  }

  pub async fn run(
    &self,
    store: Arc<EngramStore>,
    chunkers: Arc<ChunkerRegistry>,
    estimator: Arc<TokenEstimator>,
    config: Arc<Config>,
    registry: JobRegistry,
    params: RebuildParams,
  ) -> Result<RebuildOutcome> {
    let errors = validate(&params);
    if !errors.is_empty() {
      return Ok(RebuildOutcome::ValidationFailed { errors });
    }
    if params.validate_only {
      return Ok(RebuildOutcome::ValidatedOnly);
    }

    if self.in_progress.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
      return Err(JobError::Conflict("Another rebuild is already in progress".to_string()));
    }

    let mut job = Job::new(if params.async_mode { JobMode::Async } else { JobMode::Sync });
    mark_phase(job, JobPhase::Pre);
    let job_id = job.job_id;
    registry.insert(job).await;

    if params.async_mode {
      let in_progress = self.in_progress.clone();
      tokio::spawn(async move {
        execute(store, chunkers, estimator, config, registry, job_id, params).await;
        in_progress.store(false, Ordering::SeqCst);
      });
      return Ok(RebuildOutcome::Started { job_id });
    }

    execute(store, chunkers, estimator, config, registry.clone(), job_id, params).await;
    self.in_progress.store(false, Ordering::SeqCst);
    let job = registry.get(job_id).await.expect("rebuild job was just inserted");
    Ok(RebuildOutcome::Completed { job })
  }
}

async fn execute(store: Arc<EngramStore>, chunkers: Arc<ChunkerRegistry>, estimator: Arc<TokenEstimator>, config: Arc<Config>, registry: JobRegistry, job_id: Uuid, params: RebuildParams) {
  let start = Instant::now();

  registry.update(job_id, |job| mark_phase(job, JobPhase::Destructive)).await;
  if let Err(err) = store.clear_all_tables().await {
    warn!(job_id = %job_id, error = %err, "destructive phase failed, rebuild aborted");
    fail(&registry, job_id, start, err.to_string()).await;
    return;
  }

  registry.update(job_id, |job| mark_phase(job, JobPhase::Rebuild)).await;
  let indexer = IncrementalIndexer::new(&store, &chunkers, &estimator, &config);
  let mut root_ids: Vec<String> = config.roots.keys().cloned().collect();
  root_ids.sort();

  let mut total_failures = 0u64;
  let mut total_processed = 0u64;

  for root_id in root_ids {
    let root_path = config.roots[&root_id].clone();
    let targets: Vec<PathBuf> = match &params.paths {
      Some(explicit) => explicit.iter().filter(|p| p.starts_with(&root_path)).cloned().collect(),
      None => scan_root(Path::new(&root_path)),
    };

    match indexer.index_paths(&root_id, &targets, true, false).await {
      Ok(result) => {
        total_processed += (result.new + result.modified + result.unchanged) as u64;
        total_failures += result.indexing_failures as u64;
        registry
          .update(job_id, |job| {
            job.processed_files = total_processed;
            job.successful_files = total_processed - total_failures;
            job.failed_files = total_failures;
          })
          .await;
      }
      Err(err) => {
        fail(&registry, job_id, start, err.to_string()).await;
        return;
      }
    }
  }

  registry.update(job_id, |job| mark_phase(job, JobPhase::Post)).await;
  info!(job_id = %job_id, processed = total_processed, failures = total_failures, "rebuild complete");

  registry
    .update(job_id, |job| {
      mark_phase(job, JobPhase::Completed);
      job.completed_at = Some(chrono::Utc::now());
      job.status = if total_failures > 0 { JobStatus::CompletedWithErrors } else { JobStatus::Completed };
      job.logs.push(format!("rebuild complete: processed={total_processed} failures={total_failures}"));
    })
    .await;
}

async fn fail(registry: &JobRegistry, job_id: Uuid, start: Instant, message: String) {
  let _ = start;
  registry
    .update(job_id, |job| {
      job.status = JobStatus::Failed;
      job.completed_at = Some(chrono::Utc::now());
      job.error = Some(message);
    })
    .await;
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  async fn harness() -> (TempDir, Arc<EngramStore>, Arc<ChunkerRegistry>, Arc<TokenEstimator>, Arc<Config>) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap());
    let mut config = Config::default();
    config.roots.insert("root".to_string(), dir.path().to_string_lossy().to_string());
    (dir, store, Arc::new(ChunkerRegistry::new()), Arc::new(TokenEstimator::new()), Arc::new(config))
  }

  #[tokio::test]
  async fn rejects_missing_confirm() {
    let (_dir, store, chunkers, estimator, config) = harness().await;
    let jobs = RebuildJobs::new(Arc::new(AtomicBool::new(false)));
    let registry = JobRegistry::new(10);

    let outcome = jobs.run(store, chunkers, estimator, config, registry, RebuildParams { confirm: false, ..Default::default() }).await.unwrap();
    assert!(matches!(outcome, RebuildOutcome::ValidationFailed { .. }));
  }

  #[tokio::test]
  async fn validate_only_never_mutates_state() {
    let (dir, store, chunkers, estimator, config) = harness().await;
    tokio::fs::write(dir.path().join("a.py"), "x = 1\n").await.unwrap();

    let jobs = RebuildJobs::new(Arc::new(AtomicBool::new(false)));
    let registry = JobRegistry::new(10);
    let outcome = jobs.run(store.clone(), chunkers, estimator, config, registry, RebuildParams { confirm: true, validate_only: true, ..Default::default() }).await.unwrap();

    assert!(matches!(outcome, RebuildOutcome::ValidatedOnly));
    assert!(store.list_all_files().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn concurrent_rebuild_is_denied() {
    let (_dir, store, chunkers, estimator, config) = harness().await;
    let flag = Arc::new(AtomicBool::new(true));
    let jobs = RebuildJobs::new(flag);
    let registry = JobRegistry::new(10);

    let result = jobs.run(store, chunkers, estimator, config, registry, RebuildParams { confirm: true, ..Default::default() }).await;
    assert!(matches!(result, Err(JobError::Conflict(_))));
  }

  #[tokio::test]
  async fn sync_rebuild_reindexes_and_releases_flag() {
    let (dir, store, chunkers, estimator, config) = harness().await;
    tokio::fs::write(dir.path().join("a.py"), "x = 1\n").await.unwrap();

    let flag = Arc::new(AtomicBool::new(false));
    let jobs = RebuildJobs::new(flag.clone());
    let registry = JobRegistry::new(10);

    let outcome = jobs.run(store.clone(), chunkers, estimator, config, registry, RebuildParams { confirm: true, ..Default::default() }).await.unwrap();
    match outcome {
      RebuildOutcome::Completed { job } => assert_eq!(job.status, JobStatus::Completed),
      other => panic!("expected Completed, got {other:?}"),
    }
    assert!(!flag.load(Ordering::SeqCst));
    assert_eq!(store.list_all_files().await.unwrap().len(), 1);
  }
}
