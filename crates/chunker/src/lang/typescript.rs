use regex::Regex;

use engram_core::types::ChunkKind;

use super::brace_common::{chunk_brace_lang, BraceLangSpec, DeclRule};
use crate::common::ChunkDraft;
use crate::registry::StrategyDescriptor;
use crate::{ChunkContext, Chunker, DEFAULT_MAX_TOKENS};

pub struct TypeScriptChunker {
  strategy: StrategyDescriptor,
  spec: BraceLangSpec,
}

impl TypeScriptChunker {
  pub fn new() -> Self {
    let decl_rules = vec![
      DeclRule { regex: Regex::new(r"^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)").unwrap(), kind: ChunkKind::CodeClass },
      DeclRule { regex: Regex::new(r"^(?:export\s+)?interface\s+(\w+)").unwrap(), kind: ChunkKind::CodeInterface },
      DeclRule { regex: Regex::new(r"^(?:export\s+)?enum\s+(\w+)").unwrap(), kind: ChunkKind::CodeEnum },
      DeclRule { regex: Regex::new(r"^(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s+(\w+)").unwrap(), kind: ChunkKind::CodeFunction },
      DeclRule {
        regex: Regex::new(r"^(?:export\s+)?const\s+(\w+)\s*(?::[^=]+)?=\s*(?:async\s*)?\(").unwrap(),
        kind: ChunkKind::CodeFunction,
      },
      DeclRule { regex: Regex::new(r"^(?:export\s+)?(?:const|let|var)\s+(\w+)").unwrap(), kind: ChunkKind::CodeBlock },
    ];
    Self {
      strategy: StrategyDescriptor {
        id: "typescript".to_string(),
        display_name: "TypeScript/JavaScript".to_string(),
        supported_languages: vec!["typescript".to_string(), "javascript".to_string()],
        default_max_tokens: Some(DEFAULT_MAX_TOKENS),
        description: Some("Brace-depth structural chunker for TypeScript/JavaScript, string/template/comment aware.".to_string()),
      },
      spec: BraceLangSpec { language_slug: "typescript", header_prefixes: vec!["import "], decl_rules },
    }
  }
}

impl Default for TypeScriptChunker {
  fn default() -> Self {
    Self::new()
  }
}

impl Chunker for TypeScriptChunker {
  fn strategy(&self) -> &StrategyDescriptor {
    &self.strategy
  }

  fn chunk(&self, ctx: &ChunkContext) -> Vec<ChunkDraft> {
    chunk_brace_lang(ctx, &self.spec)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::estimator::TokenEstimator;

  #[test]
  fn exported_class_and_function() {
    let content = "import { z } from 'zod';\n\nexport class Widget {\n  render() {\n    return `<div>${1}</div>`;\n  }\n}\n\nexport function build(): Widget {\n  return new Widget();\n}\n";
    let estimator = TokenEstimator::new();
    let ctx = ChunkContext { content, file_path: "widget.ts", language: Some("typescript"), estimator: &estimator, max_tokens: DEFAULT_MAX_TOKENS };
    let drafts = TypeScriptChunker::new().chunk(&ctx);
    assert!(drafts.iter().any(|d| d.kind == ChunkKind::CodeClass && d.symbols.contains(&"Widget".to_string())));
    assert!(drafts.iter().any(|d| d.kind == ChunkKind::CodeFunction && d.symbols.contains(&"build".to_string())));
  }

  #[test]
  fn template_literal_braces_do_not_confuse_depth() {
    let content = "export function f() {\n  const s = `value: ${1 + 1}`;\n  return s;\n}\n";
    let estimator = TokenEstimator::new();
    let ctx = ChunkContext { content, file_path: "f.ts", language: Some("typescript"), estimator: &estimator, max_tokens: DEFAULT_MAX_TOKENS };
    let drafts = TypeScriptChunker::new().chunk(&ctx);
    let f = drafts.iter().find(|d| d.kind == ChunkKind::CodeFunction).expect("function chunk");
    assert!(f.content.contains("return s;"));
  }
}
