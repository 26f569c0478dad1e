use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("store error: {0}")]
  Store(#[from] engram_store::StoreError),
  #[error("invalid argument: {0}")]
  InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl From<IndexError> for engram_core::CoreError {
  fn from(err: IndexError) -> Self {
    match err {
      IndexError::InvalidArgument(msg) => engram_core::CoreError::InvalidArgument(msg),
      other => engram_core::CoreError::Transient(other.to_string()),
    }
  }
}
