//! T4 `rebuild_context` / T5 `get_rebuild_status`: destructive full reindex
//! and its status lookup. `get_rebuild_status` returns `JobStatus::NotFound`
//! rather than an error for an unknown id (spec section 7 treats an unknown
//! jobId as a query answer, not a failure).

use engram_core::types::{Job, JobStatus};
use engram_jobs::{RebuildJobs, RebuildOutcome, RebuildParams};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::CoreContext;
use crate::error::Result;

pub async fn rebuild_context(ctx: &CoreContext, params: RebuildParams) -> Result<RebuildOutcome> {
  let jobs = RebuildJobs::new(ctx.rebuild_in_progress.clone());
  let outcome = jobs.run(ctx.store.clone(), ctx.chunkers.clone(), ctx.estimator.clone(), ctx.config.clone(), ctx.jobs.clone(), params).await?;
  Ok(outcome)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
  pub status: JobStatus,
  pub job: Option<Job>,
}

pub async fn get_rebuild_status(ctx: &CoreContext, job_id: Uuid, include_logs: bool) -> Result<JobStatusResponse> {
  let Some(mut job) = ctx.jobs.get(job_id).await else {
    return Ok(JobStatusResponse { status: JobStatus::NotFound, job: None });
  };
  if !include_logs {
    job.logs.clear();
  }
  Ok(JobStatusResponse { status: job.status, job: Some(job) })
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::Config;
  use engram_store::EngramStore;
  use std::sync::Arc;
  use tempfile::TempDir;

  async fn context(dir: &TempDir) -> CoreContext {
    let store = Arc::new(EngramStore::open_at_path(dir.path().join("t.lancedb"), 4).await.unwrap());
    let mut config = Config::default();
    config.roots.insert("root".to_string(), dir.path().to_string_lossy().to_string());
    CoreContext::new(store, Arc::new(engram_chunker::ChunkerRegistry::new()), Arc::new(engram_core::estimator::TokenEstimator::new()), Arc::new(config), None)
  }

  #[tokio::test]
  async fn unconfirmed_rebuild_is_rejected_without_mutating_anything() {
    let dir = TempDir::new().unwrap();
    tokio::fs::write(dir.path().join("a.py"), "x = 1\n").await.unwrap();
    let ctx = context(&dir).await;

    let outcome = rebuild_context(&ctx, RebuildParams { confirm: false, ..Default::default() }).await.unwrap();
    assert!(matches!(outcome, RebuildOutcome::ValidationFailed { .. }));
  }

  #[tokio::test]
  async fn unknown_job_id_reports_not_found_rather_than_erroring() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir).await;

    let response = get_rebuild_status(&ctx, Uuid::now_v7(), true).await.unwrap();
    assert_eq!(response.status, JobStatus::NotFound);
    assert!(response.job.is_none());
  }

  #[tokio::test]
  async fn completed_rebuild_is_queryable_by_status() {
    let dir = TempDir::new().unwrap();
    tokio::fs::write(dir.path().join("a.py"), "x = 1\n").await.unwrap();
    let ctx = context(&dir).await;

    let outcome = rebuild_context(&ctx, RebuildParams { confirm: true, ..Default::default() }).await.unwrap();
    let job_id = match outcome {
      RebuildOutcome::Completed { job } => job.job_id,
      other => panic!("expected Completed, got {other:?}"),
    };

    let response = get_rebuild_status(&ctx, job_id, false).await.unwrap();
    assert_eq!(response.status, JobStatus::Completed);
    assert!(response.job.unwrap().logs.is_empty());
  }
}
