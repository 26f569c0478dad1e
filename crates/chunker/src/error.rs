use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkError {
  #[error("no chunker registered and no plaintext fallback available")]
  NoChunkerAvailable,
}
