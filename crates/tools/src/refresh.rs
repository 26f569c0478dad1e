//! T3 `refresh_context`: incremental reconciliation, sync or fire-and-poll.

use std::path::PathBuf;

use engram_jobs::RefreshOutcome;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::CoreContext;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RefreshResponse {
  Sync { outcome: RefreshOutcome },
  Async { job_id: Uuid },
}

pub async fn refresh_context(ctx: &CoreContext, paths: Option<Vec<PathBuf>>, force: bool, async_mode: bool) -> Result<RefreshResponse> {
  if async_mode {
    let job_id = engram_jobs::spawn_refresh(ctx.store.clone(), ctx.chunkers.clone(), ctx.estimator.clone(), ctx.config.clone(), ctx.jobs.clone(), paths, force).await;
    return Ok(RefreshResponse::Async { job_id });
  }

  let outcome = engram_jobs::run_refresh(&ctx.store, &ctx.chunkers, &ctx.estimator, &ctx.config, paths.as_deref(), force).await?;
  Ok(RefreshResponse::Sync { outcome })
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
  async fn sync_refresh_returns_outcome_inline() {
    let dir = TempDir::new().unwrap();
    tokio::fs::write(dir.path().join("a.py"), "x = 1\n").await.unwrap();
    let ctx = context(&dir).await;

    let response = refresh_context(&ctx, None, false, false).await.unwrap();
    match response {
      RefreshResponse::Sync { outcome } => assert_eq!(outcome.new, 1),
      other => panic!("expected Sync, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn async_refresh_returns_a_job_id_immediately() {
    let dir = TempDir::new().unwrap();
    tokio::fs::write(dir.path().join("a.py"), "x = 1\n").await.unwrap();
    let ctx = context(&dir).await;

    let response = refresh_context(&ctx, None, false, true).await.unwrap();
    assert!(matches!(response, RefreshResponse::Async { .. }));
  }
}
