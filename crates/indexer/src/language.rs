//! Extension -> language-slug mapping. Distinct from `ChunkerRegistry`'s
//! extension -> chunker dispatch: several extensions share a chunker
//! (`.ts`/`.js`) but carry different language slugs, and some languages
//! (e.g. `rust`) have no dedicated chunker at all and fall through to
//! plaintext while still reporting a language.

/// Lowercases `ext` and maps it to a language slug, or `None` for anything
/// unrecognized (the file is still indexed; `FileRecord.language` stays
/// unset).
pub fn detect_language(ext: &str) -> Option<String> {
  let slug = match ext.to_lowercase().as_str() {
    "py" => "python",
    "ts" | "tsx" => "typescript",
    "js" | "jsx" | "mjs" | "cjs" => "javascript",
    "java" => "java",
    "cs" => "csharp",
    "kt" | "kts" => "kotlin",
    "md" | "markdown" => "markdown",
    "sql" => "sql",
    "json" => "json",
    "yaml" | "yml" => "yaml",
    "rs" => "rust",
    "go" => "go",
    "rb" => "ruby",
    "c" => "c",
    "h" => "c",
    "cpp" | "cc" | "cxx" | "hpp" => "cpp",
    "txt" => "plaintext",
    _ => return None,
  };
  Some(slug.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recognizes_common_extensions() {
    assert_eq!(detect_language("PY"), Some("python".to_string()));
    assert_eq!(detect_language("tsx"), Some("typescript".to_string()));
  }

  #[test]
  fn unknown_extension_is_none() {
    assert_eq!(detect_language("xyz"), None);
  }
}
