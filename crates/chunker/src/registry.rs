//! C2: registry mapping file extensions to chunking strategies, with a
//! universal plaintext fallback for anything unrecognized.

use std::collections::HashMap;
use std::sync::Arc;

use crate::json_yaml::{JsonChunker, YamlChunker};
use crate::lang::{CSharpChunker, JavaChunker, KotlinChunker, PythonChunker, TypeScriptChunker};
use crate::markdown::MarkdownChunker;
use crate::plaintext::PlaintextChunker;
use crate::sql::SqlChunker;
use crate::Chunker;

/// Metadata describing a registered chunking strategy, surfaced to callers
/// that want to explain or enumerate available strategies (e.g. stats/tools
/// surfaces) without depending on the chunker's concrete type.
#[derive(Debug, Clone)]
pub struct StrategyDescriptor {
  pub id: String,
  pub display_name: String,
  pub supported_languages: Vec<String>,
  pub default_max_tokens: Option<u32>,
  pub description: Option<String>,
}

/// Dispatches a file's lowercased extension to the chunker registered for
/// it, falling back to [`PlaintextChunker`] for anything unrecognized.
pub struct ChunkerRegistry {
  by_extension: HashMap<String, Arc<dyn Chunker>>,
  fallback: Arc<dyn Chunker>,
}

impl ChunkerRegistry {
  pub fn new() -> Self {
    let mut by_extension: HashMap<String, Arc<dyn Chunker>> = HashMap::new();

    let java: Arc<dyn Chunker> = Arc::new(JavaChunker::new());
    by_extension.insert("java".to_string(), java);

    let csharp: Arc<dyn Chunker> = Arc::new(CSharpChunker::new());
    by_extension.insert("cs".to_string(), csharp);

    let kotlin: Arc<dyn Chunker> = Arc::new(KotlinChunker::new());
    by_extension.insert("kt".to_string(), kotlin.clone());
    by_extension.insert("kts".to_string(), kotlin);

    let typescript: Arc<dyn Chunker> = Arc::new(TypeScriptChunker::new());
    by_extension.insert("ts".to_string(), typescript.clone());
    by_extension.insert("tsx".to_string(), typescript.clone());
    by_extension.insert("js".to_string(), typescript.clone());
    by_extension.insert("jsx".to_string(), typescript.clone());
    by_extension.insert("mjs".to_string(), typescript.clone());
    by_extension.insert("cjs".to_string(), typescript);

    let python: Arc<dyn Chunker> = Arc::new(PythonChunker::new());
    by_extension.insert("py".to_string(), python);

    let markdown: Arc<dyn Chunker> = Arc::new(MarkdownChunker::new());
    by_extension.insert("md".to_string(), markdown.clone());
    by_extension.insert("markdown".to_string(), markdown);

    let sql: Arc<dyn Chunker> = Arc::new(SqlChunker::new());
    by_extension.insert("sql".to_string(), sql);

    let json: Arc<dyn Chunker> = Arc::new(JsonChunker::new());
    by_extension.insert("json".to_string(), json);

    let yaml: Arc<dyn Chunker> = Arc::new(YamlChunker::new());
    by_extension.insert("yaml".to_string(), yaml.clone());
    by_extension.insert("yml".to_string(), yaml);

    Self {
      by_extension,
      fallback: Arc::new(PlaintextChunker::new()),
    }
  }

  /// Picks a chunker for `file_path` based on its extension, case-insensitively.
  /// Always returns a usable chunker: unrecognized extensions resolve to the
  /// plaintext fallback rather than an error.
  pub fn resolve(&self, file_path: &str) -> Arc<dyn Chunker> {
    let ext = file_path.rsplit('.').next().map(|s| s.to_lowercase());
    match ext {
      Some(ext) if ext.len() != file_path.len() => {
        self.by_extension.get(&ext).cloned().unwrap_or_else(|| self.fallback.clone())
      }
      _ => self.fallback.clone(),
    }
  }

  pub fn strategies(&self) -> Vec<StrategyDescriptor> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for chunker in self.by_extension.values() {
      let d = chunker.strategy();
      if seen.insert(d.id.clone()) {
        out.push(d.clone());
      }
    }
    out.push(self.fallback.strategy().clone());
    out
  }
}

impl Default for ChunkerRegistry {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_extension_resolves_to_dedicated_chunker() {
    let registry = ChunkerRegistry::new();
    let chunker = registry.resolve("src/Main.java");
    assert_eq!(chunker.strategy().id, "java");
  }

  #[test]
  fn unknown_extension_falls_back_to_plaintext() {
    let registry = ChunkerRegistry::new();
    let chunker = registry.resolve("README.xyz");
    assert_eq!(chunker.strategy().id, "plaintext");
  }

  #[test]
  fn extensionless_file_falls_back_to_plaintext() {
    let registry = ChunkerRegistry::new();
    let chunker = registry.resolve("Makefile");
    assert_eq!(chunker.strategy().id, "plaintext");
  }

  #[test]
  fn extension_match_is_case_insensitive() {
    let registry = ChunkerRegistry::new();
    let chunker = registry.resolve("Query.SQL");
    assert_eq!(chunker.strategy().id, "sql");
  }
}
