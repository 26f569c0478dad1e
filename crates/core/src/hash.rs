use sha2::{Digest, Sha256};

/// Canonical content hash: SHA-256 truncated to the first 8 bytes, rendered
/// as 16 lowercase hex characters. Used for `FileRecord::content_hash` and
/// change detection across the indexer and reconciler.
pub fn content_hash(content: &[u8]) -> String {
  let digest = Sha256::digest(content);
  format!("{:016x}", u64::from_be_bytes(digest[0..8].try_into().unwrap()))
}
