use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),
  #[error("store error: {0}")]
  Store(#[from] engram_store::StoreError),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

impl From<RetrievalError> for engram_core::CoreError {
  fn from(err: RetrievalError) -> Self {
    match err {
      RetrievalError::InvalidArgument(msg) => engram_core::CoreError::InvalidArgument(msg),
      other => engram_core::CoreError::Transient(other.to_string()),
    }
  }
}
