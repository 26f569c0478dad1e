//! C10/C11 shared job bookkeeping: a map from job id to the `Job` status
//! value, plus the cooperative-cancellation flags refresh/rebuild jobs poll.
//! Generalizes the teacher's `actor::indexer` progress-channel pattern
//! (`service/code/index.rs::run_indexing`) into a queryable registry instead
//! of a one-shot channel, since jobs here must be pollable after the caller
//! that started them has moved on (`get_rebuild_status`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use engram_core::types::{Job, JobPhase, JobStatus};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone)]
pub struct JobRegistry {
  jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
  cancel_flags: Arc<RwLock<HashMap<Uuid, Arc<AtomicBool>>>>,
  retention: usize,
}

impl JobRegistry {
  pub fn new(retention: usize) -> Self {
    Self { jobs: Arc::new(RwLock::new(HashMap::new())), cancel_flags: Arc::new(RwLock::new(HashMap::new())), retention }
  }

  pub async fn insert(&self, job: Job) -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    self.cancel_flags.write().await.insert(job.job_id, cancel.clone());
    self.jobs.write().await.insert(job.job_id, job);
    self.prune().await;
    cancel
  }

  pub async fn update(&self, job_id: Uuid, f: impl FnOnce(&mut Job)) {
    if let Some(job) = self.jobs.write().await.get_mut(&job_id) {
      f(job);
    }
  }

  pub async fn get(&self, job_id: Uuid) -> Option<Job> {
    self.jobs.read().await.get(&job_id).cloned()
  }

  pub async fn list(&self) -> Vec<Job> {
    self.jobs.read().await.values().cloned().collect()
  }

  pub async fn request_cancel(&self, job_id: Uuid) -> bool {
    match self.cancel_flags.read().await.get(&job_id) {
      Some(flag) => {
        flag.store(true, Ordering::SeqCst);
        true
      }
      None => false,
    }
  }

  pub async fn is_cancelled(&self, job_id: Uuid) -> bool {
    self.cancel_flags.read().await.get(&job_id).map(|f| f.load(Ordering::SeqCst)).unwrap_or(false)
  }

  /// Drops the oldest completed/failed jobs beyond the retention window.
  /// Running jobs are never pruned.
  async fn prune(&self) {
    let mut jobs = self.jobs.write().await;
    let mut finished: Vec<(Uuid, chrono::DateTime<chrono::Utc>)> = jobs
      .values()
      .filter(|j| !matches!(j.status, JobStatus::Running))
      .map(|j| (j.job_id, j.completed_at.unwrap_or(j.started_at)))
      .collect();

    if finished.len() <= self.retention {
      return;
    }

    finished.sort_by_key(|(_, completed_at)| *completed_at);
    let overflow = finished.len() - self.retention;
    for (job_id, _) in finished.into_iter().take(overflow) {
      jobs.remove(&job_id);
    }
  }
}

pub fn mark_phase(job: &mut Job, phase: JobPhase) {
  job.phase = phase;
}
