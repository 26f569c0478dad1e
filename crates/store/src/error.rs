use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("lancedb error: {0}")]
  Lance(#[from] lancedb::Error),
  #[error("arrow error: {0}")]
  Arrow(#[from] arrow_schema::ArrowError),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("invalid input: {0}")]
  InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for engram_core::CoreError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::NotFound(msg) => engram_core::CoreError::NotFound(msg),
      StoreError::InvalidInput(msg) => engram_core::CoreError::InvalidArgument(msg),
      other => engram_core::CoreError::Fatal(other.to_string()),
    }
  }
}
