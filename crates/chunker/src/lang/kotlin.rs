use regex::Regex;

use engram_core::types::ChunkKind;

use super::brace_common::{chunk_brace_lang, BraceLangSpec, DeclRule};
use crate::common::ChunkDraft;
use crate::registry::StrategyDescriptor;
use crate::{ChunkContext, Chunker, DEFAULT_MAX_TOKENS};

pub struct KotlinChunker {
  strategy: StrategyDescriptor,
  spec: BraceLangSpec,
}

impl KotlinChunker {
  pub fn new() -> Self {
    let decl_rules = vec![
      DeclRule { regex: Regex::new(r"^(?:\w+\s+)*enum\s+class\s+(\w+)").unwrap(), kind: ChunkKind::CodeEnum },
      DeclRule { regex: Regex::new(r"^(?:\w+\s+)*(?:class|object)\s+(\w+)").unwrap(), kind: ChunkKind::CodeClass },
      DeclRule { regex: Regex::new(r"^(?:\w+\s+)*interface\s+(\w+)").unwrap(), kind: ChunkKind::CodeInterface },
      DeclRule { regex: Regex::new(r"^(?:\w+\s+)*fun\s+(?:<[^>]*>\s*)?(\w+)\s*\(").unwrap(), kind: ChunkKind::CodeFunction },
      DeclRule { regex: Regex::new(r"^(?:\w+\s+)*(?:val|var)\s+(\w+)").unwrap(), kind: ChunkKind::CodeBlock },
    ];
    Self {
      strategy: StrategyDescriptor {
        id: "kotlin".to_string(),
        display_name: "Kotlin".to_string(),
        supported_languages: vec!["kotlin".to_string()],
        default_max_tokens: Some(DEFAULT_MAX_TOKENS),
        description: Some("Brace-depth structural chunker for Kotlin source.".to_string()),
      },
      spec: BraceLangSpec { language_slug: "kotlin", header_prefixes: vec!["package ", "import "], decl_rules },
    }
  }
}

impl Default for KotlinChunker {
  fn default() -> Self {
    Self::new()
  }
}

impl Chunker for KotlinChunker {
  fn strategy(&self) -> &StrategyDescriptor {
    &self.strategy
  }

  fn chunk(&self, ctx: &ChunkContext) -> Vec<ChunkDraft> {
    chunk_brace_lang(ctx, &self.spec)
  }
}
