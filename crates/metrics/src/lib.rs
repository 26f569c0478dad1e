//! C12 MetricsCollector: a bounded ring buffer of per-retrieval records plus
//! running aggregates. New relative to the teacher but grounded in its
//! statistics-aggregation style (`db/stats.rs::get_memory_stats`: fold over
//! records into counts/sums, return a plain value struct) applied to
//! retrieval performance instead of memory/code counts.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

const DEFAULT_WINDOW: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
  pub task_id: Option<Uuid>,
  pub snippets_returned: usize,
  pub tokens_used: u32,
  pub latency_ms: u64,
  pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MetricsAggregate {
  pub total_records: u64,
  pub total_context_tokens: u64,
  pub average_latency_ms: f64,
}

struct Inner {
  window: VecDeque<QueryRecord>,
  capacity: usize,
  total_records: u64,
  total_context_tokens: u64,
  total_latency_ms: u128,
}

pub struct MetricsCollector {
  inner: RwLock<Inner>,
}

impl MetricsCollector {
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self { inner: RwLock::new(Inner { window: VecDeque::with_capacity(capacity), capacity, total_records: 0, total_context_tokens: 0, total_latency_ms: 0 }) }
  }

  pub async fn record(&self, task_id: Option<Uuid>, snippets_returned: usize, tokens_used: u32, latency_ms: u64) {
    let record = QueryRecord { task_id, snippets_returned, tokens_used, latency_ms, recorded_at: Utc::now() };
    let mut inner = self.inner.write().await;
    inner.total_records += 1;
    inner.total_context_tokens += tokens_used as u64;
    inner.total_latency_ms += latency_ms as u128;
    if inner.window.len() == inner.capacity {
      inner.window.pop_front();
    }
    inner.window.push_back(record);
  }

  /// Most recent `limit` records, newest first.
  pub async fn recent(&self, limit: usize) -> Vec<QueryRecord> {
    let inner = self.inner.read().await;
    inner.window.iter().rev().take(limit).cloned().collect()
  }

  pub async fn aggregate(&self) -> MetricsAggregate {
    let inner = self.inner.read().await;
    let average_latency_ms = if inner.total_records > 0 { inner.total_latency_ms as f64 / inner.total_records as f64 } else { 0.0 };
    MetricsAggregate { total_records: inner.total_records, total_context_tokens: inner.total_context_tokens, average_latency_ms }
  }
}

impl Default for MetricsCollector {
  fn default() -> Self {
    Self::new(DEFAULT_WINDOW)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn aggregate_reflects_all_recorded_queries() {
    let collector = MetricsCollector::new(100);
    collector.record(None, 3, 150, 20).await;
    collector.record(None, 5, 250, 40).await;

    let agg = collector.aggregate().await;
    assert_eq!(agg.total_records, 2);
    assert_eq!(agg.total_context_tokens, 400);
    assert!((agg.average_latency_ms - 30.0).abs() < 1e-6);
  }

  #[tokio::test]
  async fn window_evicts_oldest_beyond_capacity() {
    let collector = MetricsCollector::new(2);
    collector.record(None, 1, 10, 1).await;
    collector.record(None, 2, 20, 2).await;
    collector.record(None, 3, 30, 3).await;

    let recent = collector.recent(10).await;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].snippets_returned, 3);
    assert_eq!(recent[1].snippets_returned, 2);

    let agg = collector.aggregate().await;
    assert_eq!(agg.total_records, 3);
  }

  #[tokio::test]
  async fn recent_respects_requested_limit() {
    let collector = MetricsCollector::new(10);
    for i in 0..5 {
      collector.record(None, i, 10, 5).await;
    }
    assert_eq!(collector.recent(2).await.len(), 2);
  }
}
