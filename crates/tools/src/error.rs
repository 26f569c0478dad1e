use thiserror::Error;

/// Mirrors `CoreError` exactly; tool functions return this directly instead
/// of forcing every caller to depend on `engram-core`'s error module.
#[derive(Error, Debug)]
pub enum ToolError {
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

pub type Result<T> = std::result::Result<T, ToolError>;

impl From<engram_core::CoreError> for ToolError {
  fn from(err: engram_core::CoreError) -> Self {
    match err {
      engram_core::CoreError::InvalidArgument(m) => ToolError::InvalidArgument(m),
      engram_core::CoreError::NotFound(m) => ToolError::NotFound(m),
      engram_core::CoreError::Conflict(m) => ToolError::Conflict(m),
      engram_core::CoreError::Transient(m) => ToolError::Transient(m),
      engram_core::CoreError::Fatal(m) => ToolError::Fatal(m),
    }
  }
}

impl From<engram_retrieval::RetrievalError> for ToolError {
  fn from(err: engram_retrieval::RetrievalError) -> Self {
    engram_core::CoreError::from(err).into()
  }
}

impl From<engram_jobs::JobError> for ToolError {
  fn from(err: engram_jobs::JobError) -> Self {
    engram_core::CoreError::from(err).into()
  }
}

impl From<engram_store::StoreError> for ToolError {
  fn from(err: engram_store::StoreError) -> Self {
    engram_core::CoreError::from(err).into()
  }
}
