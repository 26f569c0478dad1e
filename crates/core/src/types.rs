use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One indexed file under a watched root.
///
/// `relative_path` is only unique *within* a root (see `root_id`); callers
/// that need a globally unique key should use `(root_id, relative_path)` or
/// `file_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
  pub file_id: Uuid,
  /// Which configured watch root this file was discovered under.
  pub root_id: String,
  pub relative_path: String,
  pub absolute_path: String,
  pub content_hash: String,
  pub size_bytes: u64,
  pub modified_time_ns: i64,
  pub language: Option<String>,
  pub kind: Option<String>,
  pub fingerprint: Option<String>,
  pub indexed_at: DateTime<Utc>,
  pub is_deleted: bool,
}

impl FileRecord {
  pub fn new(root_id: impl Into<String>, relative_path: impl Into<String>, absolute_path: impl Into<String>) -> Self {
    Self {
      file_id: Uuid::now_v7(),
      root_id: root_id.into(),
      relative_path: relative_path.into(),
      absolute_path: absolute_path.into(),
      content_hash: String::new(),
      size_bytes: 0,
      modified_time_ns: 0,
      language: None,
      kind: None,
      fingerprint: None,
      indexed_at: Utc::now(),
      is_deleted: false,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkKind {
  CodeHeader,
  CodeClass,
  CodeInterface,
  CodeEnum,
  CodeMethod,
  CodeFunction,
  CodeConstructor,
  CodeBlock,
  Docstring,
  Paragraph,
  MarkdownSection,
  SqlStatement,
  YamlBlock,
  JsonBlock,
}

impl ChunkKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ChunkKind::CodeHeader => "CODE_HEADER",
      ChunkKind::CodeClass => "CODE_CLASS",
      ChunkKind::CodeInterface => "CODE_INTERFACE",
      ChunkKind::CodeEnum => "CODE_ENUM",
      ChunkKind::CodeMethod => "CODE_METHOD",
      ChunkKind::CodeFunction => "CODE_FUNCTION",
      ChunkKind::CodeConstructor => "CODE_CONSTRUCTOR",
      ChunkKind::CodeBlock => "CODE_BLOCK",
      ChunkKind::Docstring => "DOCSTRING",
      ChunkKind::Paragraph => "PARAGRAPH",
      ChunkKind::MarkdownSection => "MARKDOWN_SECTION",
      ChunkKind::SqlStatement => "SQL_STATEMENT",
      ChunkKind::YamlBlock => "YAML_BLOCK",
      ChunkKind::JsonBlock => "JSON_BLOCK",
    }
  }

  pub fn from_str_opt(s: &str) -> Option<Self> {
    Some(match s {
      "CODE_HEADER" => ChunkKind::CodeHeader,
      "CODE_CLASS" => ChunkKind::CodeClass,
      "CODE_INTERFACE" => ChunkKind::CodeInterface,
      "CODE_ENUM" => ChunkKind::CodeEnum,
      "CODE_METHOD" => ChunkKind::CodeMethod,
      "CODE_FUNCTION" => ChunkKind::CodeFunction,
      "CODE_CONSTRUCTOR" => ChunkKind::CodeConstructor,
      "CODE_BLOCK" => ChunkKind::CodeBlock,
      "DOCSTRING" => ChunkKind::Docstring,
      "PARAGRAPH" => ChunkKind::Paragraph,
      "MARKDOWN_SECTION" => ChunkKind::MarkdownSection,
      "SQL_STATEMENT" => ChunkKind::SqlStatement,
      "YAML_BLOCK" => ChunkKind::YamlBlock,
      "JSON_BLOCK" => ChunkKind::JsonBlock,
      _ => return None,
    })
  }
}

/// One addressable, bounded-token span of a file, produced by a chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
  pub chunk_id: Uuid,
  pub file_id: Uuid,
  /// 0-based, dense per file in emission order.
  pub ordinal: u32,
  pub kind: ChunkKind,
  pub start_line: Option<u32>,
  pub end_line: Option<u32>,
  pub token_estimate: u32,
  pub content: String,
  pub summary: Option<String>,
  pub created_at: DateTime<Utc>,
  /// Denormalized onto the chunk so retrieval boosting/scoring avoids a
  /// join for the common case.
  #[serde(default)]
  pub symbols: Vec<String>,
  #[serde(default)]
  pub language: Option<String>,
  #[serde(default)]
  pub imports: Vec<String>,
  #[serde(default)]
  pub calls: Vec<String>,
}

impl Chunk {
  pub fn new(file_id: Uuid, ordinal: u32, kind: ChunkKind, content: impl Into<String>) -> Self {
    Self {
      chunk_id: Uuid::now_v7(),
      file_id,
      ordinal,
      kind,
      start_line: None,
      end_line: None,
      token_estimate: 0,
      content: content.into(),
      summary: None,
      created_at: Utc::now(),
      symbols: Vec::new(),
      language: None,
      imports: Vec::new(),
      calls: Vec::new(),
    }
  }
}

/// An optional embedding vector for a chunk under a given model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
  pub embedding_id: Uuid,
  pub chunk_id: Uuid,
  pub model: String,
  pub dimensions: u32,
  pub vector: Vec<f32>,
  pub created_at: DateTime<Utc>,
}

impl Embedding {
  pub fn new(chunk_id: Uuid, model: impl Into<String>, vector: Vec<f32>) -> Self {
    let dimensions = vector.len() as u32;
    Self {
      embedding_id: Uuid::now_v7(),
      chunk_id,
      model: model.into(),
      dimensions,
      vector,
      created_at: Utc::now(),
    }
  }
}

/// Ephemeral retrieval result handed back to a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnippet {
  pub chunk_id: Uuid,
  pub score: f32,
  pub file_path: String,
  pub label: Option<String>,
  pub kind: ChunkKind,
  pub text: String,
  pub language: Option<String>,
  pub start_line: Option<u32>,
  pub end_line: Option<u32>,
  /// Provider id -> raw score, plus free-form flags (e.g. "neighbor": "true").
  pub metadata: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenBudget {
  pub max_tokens: u32,
  pub reserve_for_prompt: u32,
  pub diversity_weight: f32,
}

impl Default for TokenBudget {
  fn default() -> Self {
    Self { max_tokens: 4000, reserve_for_prompt: 0, diversity_weight: 0.3 }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobMode {
  Sync,
  Async,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobPhase {
  Validation,
  Pre,
  Destructive,
  Rebuild,
  Post,
  Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
  Running,
  Completed,
  CompletedWithErrors,
  Failed,
  NotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
  pub job_id: Uuid,
  pub mode: JobMode,
  pub phase: JobPhase,
  pub status: JobStatus,
  pub total_files: u64,
  pub processed_files: u64,
  pub successful_files: u64,
  pub failed_files: u64,
  pub started_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
  pub logs: Vec<String>,
  pub error: Option<String>,
}

impl Job {
  pub fn new(mode: JobMode) -> Self {
    Self {
      job_id: Uuid::now_v7(),
      mode,
      phase: JobPhase::Validation,
      status: JobStatus::Running,
      total_files: 0,
      processed_files: 0,
      successful_files: 0,
      failed_files: 0,
      started_at: Utc::now(),
      completed_at: None,
      logs: Vec::new(),
      error: None,
    }
  }
}
