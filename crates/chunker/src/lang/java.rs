use std::sync::Mutex;

use regex::Regex;

use engram_core::types::ChunkKind;
use engram_parser::{JavaDefinitionKind, JavaParser};

use super::brace_common::{chunk_brace_lang, BraceLangSpec, DeclRule};
use crate::common::{assign_ordinals, estimate, oversize_split, split_lines, ChunkDraft};
use crate::registry::StrategyDescriptor;
use crate::{ChunkContext, Chunker, DEFAULT_MAX_TOKENS, HEADER_TOKEN_CEILING};

/// Java chunker: AST-based extraction (via tree-sitter) is the preferred
/// path; malformed input that the parser rejects falls back to the same
/// brace-depth heuristic the other structural chunkers use.
pub struct JavaChunker {
  strategy: StrategyDescriptor,
  parser: Mutex<Option<JavaParser>>,
  fallback_spec: BraceLangSpec,
}

impl JavaChunker {
  pub fn new() -> Self {
    let decl_rules = vec![
      DeclRule { regex: Regex::new(r"^(?:\w+\s+)*(?:class|record)\s+(\w+)").unwrap(), kind: ChunkKind::CodeClass },
      DeclRule { regex: Regex::new(r"^(?:\w+\s+)*interface\s+(\w+)").unwrap(), kind: ChunkKind::CodeInterface },
      DeclRule { regex: Regex::new(r"^(?:\w+\s+)*enum\s+(\w+)").unwrap(), kind: ChunkKind::CodeEnum },
      DeclRule {
        regex: Regex::new(r"^(?:[\w<>\[\],\.]+\s+)+(\w+)\s*\([^)]*\)\s*(?:throws\s+[\w,\s]+)?\{").unwrap(),
        kind: ChunkKind::CodeMethod,
      },
    ];
    Self {
      strategy: StrategyDescriptor {
        id: "java".to_string(),
        display_name: "Java".to_string(),
        supported_languages: vec!["java".to_string()],
        default_max_tokens: Some(DEFAULT_MAX_TOKENS),
        description: Some("Tree-sitter AST extraction with a brace-heuristic fallback for malformed input.".to_string()),
      },
      parser: Mutex::new(JavaParser::new().ok()),
      fallback_spec: BraceLangSpec { language_slug: "java", header_prefixes: vec!["package ", "import "], decl_rules },
    }
  }

  fn chunk_via_ast(&self, ctx: &ChunkContext) -> Option<Vec<ChunkDraft>> {
    let mut guard = self.parser.lock().ok()?;
    let parser = guard.as_mut()?;
    let defs = parser.parse(ctx.content);
    if defs.is_empty() {
      return None;
    }
    let lines = split_lines(ctx.content);
    let mut drafts = Vec::new();

    // header: leading package/import lines before the first definition.
    let first_start = defs.iter().map(|d| d.start_line).min().unwrap_or(1) as usize;
    if first_start > 1 {
      let header_lines = &lines[0..(first_start - 1).min(lines.len())];
      let text = header_lines.join("\n");
      if !text.trim().is_empty() {
        let tokens = estimate(ctx.estimator, &text);
        if tokens <= HEADER_TOKEN_CEILING {
          drafts.push(ChunkDraft {
            ordinal: 0,
            kind: ChunkKind::CodeHeader,
            start_line: Some(1),
            end_line: Some((first_start - 1) as u32),
            token_estimate: tokens,
            content: text,
            summary: Some("header".to_string()),
            symbols: Vec::new(),
            language: Some("java".to_string()),
            imports: header_lines.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
            calls: Vec::new(),
          });
        }
      }
    }

    for def in defs {
      let kind = match def.kind {
        JavaDefinitionKind::Class => ChunkKind::CodeClass,
        JavaDefinitionKind::Interface => ChunkKind::CodeInterface,
        JavaDefinitionKind::Enum => ChunkKind::CodeEnum,
        JavaDefinitionKind::Record => ChunkKind::CodeClass,
        JavaDefinitionKind::Method => ChunkKind::CodeMethod,
        JavaDefinitionKind::Constructor => ChunkKind::CodeConstructor,
      };
      let start = def.start_line as usize;
      let end = def.end_line as usize;
      if start == 0 || end > lines.len() || start > end {
        continue;
      }
      let mut start_line = start as u32;
      let mut content_lines: Vec<&str> = Vec::new();
      if let Some(doc) = &def.doc_comment {
        content_lines.extend(doc.split('\n'));
        // doc comment sits immediately above; approximate its start line.
        let doc_line_count = doc.split('\n').count() as u32;
        start_line = start_line.saturating_sub(doc_line_count);
      }
      content_lines.extend_from_slice(&lines[(start - 1)..end]);
      let mut split = oversize_split(&def.name, kind, &content_lines, start_line, ctx.max_tokens, ctx.estimator);
      for d in &mut split {
        d.language = Some("java".to_string());
        if d.symbols.is_empty() {
          d.symbols.push(def.name.clone());
        }
      }
      drafts.extend(split);
    }

    assign_ordinals(&mut drafts);
    Some(drafts)
  }
}

impl Default for JavaChunker {
  fn default() -> Self {
    Self::new()
  }
}

impl Chunker for JavaChunker {
  fn strategy(&self) -> &StrategyDescriptor {
    &self.strategy
  }

  fn chunk(&self, ctx: &ChunkContext) -> Vec<ChunkDraft> {
    if let Some(drafts) = self.chunk_via_ast(ctx) {
      return drafts;
    }
    chunk_brace_lang(ctx, &self.fallback_spec)
  }
}
