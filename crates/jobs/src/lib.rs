//! C10/C11: refresh and rebuild job orchestration plus the shared job
//! registry both are tracked through.

mod error;
mod rebuild;
mod refresh;
mod registry;

pub use error::JobError;
pub use rebuild::{RebuildJobs, RebuildOutcome, RebuildParams};
pub use refresh::{run_refresh, spawn_refresh, RefreshOutcome};
pub use registry::JobRegistry;
