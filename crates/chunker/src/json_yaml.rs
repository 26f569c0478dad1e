//! JSON/YAML chunker: walks the parsed document tree and emits one chunk
//! per top-level key (object) or index (array), falling back to a single
//! `root` chunk when the document is a scalar or parsing fails outright.

use engram_core::types::ChunkKind;
use serde_json::Value as JsonValue;

use crate::common::{assign_ordinals, estimate, ChunkDraft};
use crate::registry::StrategyDescriptor;
use crate::{ChunkContext, Chunker, DEFAULT_MAX_TOKENS};

pub struct JsonChunker {
  strategy: StrategyDescriptor,
}

impl JsonChunker {
  pub fn new() -> Self {
    Self {
      strategy: StrategyDescriptor {
        id: "json".to_string(),
        display_name: "JSON".to_string(),
        supported_languages: vec!["json".to_string()],
        default_max_tokens: Some(DEFAULT_MAX_TOKENS),
        description: Some("Splits JSON documents into one chunk per top-level key or array entry.".to_string()),
      },
    }
  }
}

impl Default for JsonChunker {
  fn default() -> Self {
    Self::new()
  }
}

impl Chunker for JsonChunker {
  fn strategy(&self) -> &StrategyDescriptor {
    &self.strategy
  }

  fn chunk(&self, ctx: &ChunkContext) -> Vec<ChunkDraft> {
    if ctx.content.trim().is_empty() {
      return Vec::new();
    }
    match serde_json::from_str::<JsonValue>(ctx.content) {
      Ok(value) => chunk_json_value(&value, ctx),
      Err(_) => root_chunk(ChunkKind::JsonBlock, ctx),
    }
  }
}

pub struct YamlChunker {
  strategy: StrategyDescriptor,
}

impl YamlChunker {
  pub fn new() -> Self {
    Self {
      strategy: StrategyDescriptor {
        id: "yaml".to_string(),
        display_name: "YAML".to_string(),
        supported_languages: vec!["yaml".to_string()],
        default_max_tokens: Some(DEFAULT_MAX_TOKENS),
        description: Some("Splits YAML documents into one chunk per top-level key or array entry.".to_string()),
      },
    }
  }
}

impl Default for YamlChunker {
  fn default() -> Self {
    Self::new()
  }
}

impl Chunker for YamlChunker {
  fn strategy(&self) -> &StrategyDescriptor {
    &self.strategy
  }

  fn chunk(&self, ctx: &ChunkContext) -> Vec<ChunkDraft> {
    if ctx.content.trim().is_empty() {
      return Vec::new();
    }
    match serde_yaml::from_str::<serde_yaml::Value>(ctx.content) {
      Ok(value) => chunk_yaml_value(&value, ctx),
      Err(_) => root_chunk(ChunkKind::YamlBlock, ctx),
    }
  }
}

fn root_chunk(kind: ChunkKind, ctx: &ChunkContext) -> Vec<ChunkDraft> {
  vec![ChunkDraft {
    ordinal: 0,
    kind,
    start_line: Some(1),
    end_line: Some(ctx.content.lines().count().max(1) as u32),
    token_estimate: estimate(ctx.estimator, ctx.content),
    content: ctx.content.to_string(),
    summary: Some("root".to_string()),
    symbols: Vec::new(),
    language: None,
    imports: Vec::new(),
    calls: Vec::new(),
  }]
}

fn chunk_json_value(value: &JsonValue, ctx: &ChunkContext) -> Vec<ChunkDraft> {
  let mut drafts = Vec::new();
  match value {
    JsonValue::Object(map) if !map.is_empty() => {
      for (key, v) in map {
        emit_json_entry(key, v, ctx, &mut drafts);
      }
    }
    JsonValue::Array(items) if !items.is_empty() => {
      for (idx, v) in items.iter().enumerate() {
        emit_json_entry(&format!("[{idx}]"), v, ctx, &mut drafts);
      }
    }
    _ => {
      drafts.push(scalar_draft(ChunkKind::JsonBlock, "root", value.to_string(), ctx));
    }
  }
  assign_ordinals(&mut drafts);
  drafts
}

/// Emits a chunk for `path` -> `value`. When the serialized value exceeds
/// `ctx.max_tokens`, recurses into object/array children with composed
/// `parent.child`/`parent[i]` labels instead of emitting a single
/// over-budget chunk; oversize string scalars are split by line with
/// `path[i]` labels.
fn emit_json_entry(path: &str, value: &JsonValue, ctx: &ChunkContext, drafts: &mut Vec<ChunkDraft>) {
  let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
  if estimate(ctx.estimator, &text) <= ctx.max_tokens {
    drafts.push(scalar_draft(ChunkKind::JsonBlock, path, text, ctx));
    return;
  }

  match value {
    JsonValue::Object(map) if !map.is_empty() => {
      for (key, v) in map {
        emit_json_entry(&format!("{path}.{key}"), v, ctx, drafts);
      }
    }
    JsonValue::Array(items) if !items.is_empty() => {
      for (idx, v) in items.iter().enumerate() {
        emit_json_entry(&format!("{path}[{idx}]"), v, ctx, drafts);
      }
    }
    JsonValue::String(s) => split_large_text(path, s, ChunkKind::JsonBlock, ctx, drafts),
    _ => split_large_text(path, &text, ChunkKind::JsonBlock, ctx, drafts),
  }
}

fn chunk_yaml_value(value: &serde_yaml::Value, ctx: &ChunkContext) -> Vec<ChunkDraft> {
  let mut drafts = Vec::new();
  match value {
    serde_yaml::Value::Mapping(map) if !map.is_empty() => {
      for (key, v) in map {
        let key_str = yaml_key_string(key);
        emit_yaml_entry(&key_str, v, ctx, &mut drafts);
      }
    }
    serde_yaml::Value::Sequence(items) if !items.is_empty() => {
      for (idx, v) in items.iter().enumerate() {
        emit_yaml_entry(&format!("[{idx}]"), v, ctx, &mut drafts);
      }
    }
    _ => {
      let text = serde_yaml::to_string(value).unwrap_or_default();
      drafts.push(scalar_draft(ChunkKind::YamlBlock, "root", text, ctx));
    }
  }
  assign_ordinals(&mut drafts);
  drafts
}

/// Same recursive oversize handling as `emit_json_entry`, for YAML mappings
/// and sequences.
fn emit_yaml_entry(path: &str, value: &serde_yaml::Value, ctx: &ChunkContext, drafts: &mut Vec<ChunkDraft>) {
  let text = serde_yaml::to_string(value).unwrap_or_default();
  if estimate(ctx.estimator, &text) <= ctx.max_tokens {
    drafts.push(scalar_draft(ChunkKind::YamlBlock, path, text, ctx));
    return;
  }

  match value {
    serde_yaml::Value::Mapping(map) if !map.is_empty() => {
      for (key, v) in map {
        let key_str = yaml_key_string(key);
        emit_yaml_entry(&format!("{path}.{key_str}"), v, ctx, drafts);
      }
    }
    serde_yaml::Value::Sequence(items) if !items.is_empty() => {
      for (idx, v) in items.iter().enumerate() {
        emit_yaml_entry(&format!("{path}[{idx}]"), v, ctx, drafts);
      }
    }
    serde_yaml::Value::String(s) => split_large_text(path, s, ChunkKind::YamlBlock, ctx, drafts),
    _ => split_large_text(path, &text, ChunkKind::YamlBlock, ctx, drafts),
  }
}

/// Splits `text` into consecutive line-bounded pieces each within
/// `ctx.max_tokens`, labeled `path[0]`, `path[1]`, ... Always advances by at
/// least one line per piece, ruling out the zero-progress loop hazard noted
/// for other oversize splitters in this crate.
fn split_large_text(path: &str, text: &str, kind: ChunkKind, ctx: &ChunkContext, drafts: &mut Vec<ChunkDraft>) {
  let lines: Vec<&str> = text.split('\n').collect();
  if lines.is_empty() || text.is_empty() {
    return;
  }

  let mut idx = 0usize;
  let mut cursor = 0usize;
  while cursor < lines.len() {
    let mut end = cursor;
    while end + 1 < lines.len() && estimate(ctx.estimator, &lines[cursor..=end + 1].join("\n")) <= ctx.max_tokens {
      end += 1;
    }
    let piece = lines[cursor..=end].join("\n");
    drafts.push(ChunkDraft {
      ordinal: 0,
      kind,
      start_line: None,
      end_line: None,
      token_estimate: estimate(ctx.estimator, &piece),
      content: piece,
      summary: Some(format!("{path}[{idx}]")),
      symbols: vec![path.to_string()],
      language: None,
      imports: Vec::new(),
      calls: Vec::new(),
    });
    idx += 1;
    cursor = end + 1;
  }
}

fn yaml_key_string(key: &serde_yaml::Value) -> String {
  match key {
    serde_yaml::Value::String(s) => s.clone(),
    other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
  }
}

fn scalar_draft(kind: ChunkKind, key: &str, text: String, ctx: &ChunkContext) -> ChunkDraft {
  let text = text.trim().to_string();
  ChunkDraft {
    ordinal: 0,
    kind,
    start_line: None,
    end_line: None,
    token_estimate: estimate(ctx.estimator, &text),
    content: text,
    summary: Some(key.to_string()),
    symbols: vec![key.to_string()],
    language: None,
    imports: Vec::new(),
    calls: Vec::new(),
  }
}
