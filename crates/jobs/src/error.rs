use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("conflict: {0}")]
  Conflict(String),
  #[error("store error: {0}")]
  Store(#[from] engram_store::StoreError),
  #[error("index error: {0}")]
  Index(#[from] engram_indexer::IndexError),
}

pub type Result<T> = std::result::Result<T, JobError>;

impl From<JobError> for engram_core::CoreError {
  fn from(err: JobError) -> Self {
    match err {
      JobError::InvalidArgument(msg) => engram_core::CoreError::InvalidArgument(msg),
      JobError::NotFound(msg) => engram_core::CoreError::NotFound(msg),
      JobError::Conflict(msg) => engram_core::CoreError::Conflict(msg),
      other => engram_core::CoreError::Transient(other.to_string()),
    }
  }
}
