//! Transport-agnostic tool surface (spec section 6): five plain async
//! functions over a shared `CoreContext`. No RPC framing lives here -- a
//! caller (stdio server, HTTP handler, in-process test) owns that and calls
//! straight into these.

mod context;
mod error;
mod query;
mod rebuild;
mod refresh;
mod stats;

pub use context::CoreContext;
pub use error::{Result, ToolError};
pub use query::query_context;
pub use rebuild::{get_rebuild_status, rebuild_context, JobStatusResponse};
pub use refresh::{refresh_context, RefreshResponse};
pub use stats::{get_context_stats, ContextStatsResult, ProviderHealth};

pub use engram_jobs::{RebuildOutcome, RebuildParams};
pub use engram_retrieval::{QueryParams, QueryResult};
