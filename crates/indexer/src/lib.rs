//! C5/C6/C7: the write path from filesystem to persisted artifacts.
//! `IncrementalIndexer` classifies and (re)chunks a batch of paths;
//! `StartupReconciler` aligns the store with the filesystem at boot;
//! `scan_root` is the shared directory walk both (and refresh jobs) use.

mod error;
mod incremental;
mod language;
mod reconciler;
mod scan;

pub use error::IndexError;
pub use incremental::{IncrementalIndexer, UpdateResult};
pub use language::detect_language;
pub use reconciler::{ReconcileResult, StartupReconciler};
pub use scan::scan_root;
