use thiserror::Error;

/// Top-level error taxonomy shared across the core. Concerns with their own
/// richer error enum (`StoreError`, `ChunkError`, ...) convert into this one
/// at crate boundaries via `From`.
#[derive(Error, Debug)]
pub enum CoreError {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("conflict: {0}")]
  Conflict(String),
  #[error("transient error: {0}")]
  Transient(String),
  #[error("fatal error: {0}")]
  Fatal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
