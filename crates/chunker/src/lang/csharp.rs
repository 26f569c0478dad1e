use regex::Regex;

use engram_core::types::ChunkKind;

use super::brace_common::{chunk_brace_lang, BraceLangSpec, DeclRule};
use crate::common::ChunkDraft;
use crate::registry::StrategyDescriptor;
use crate::{ChunkContext, Chunker, DEFAULT_MAX_TOKENS};

pub struct CSharpChunker {
  strategy: StrategyDescriptor,
  spec: BraceLangSpec,
}

impl CSharpChunker {
  pub fn new() -> Self {
    let decl_rules = vec![
      DeclRule { regex: Regex::new(r"^(?:\w+\s+)*(?:class|struct|record)\s+(\w+)").unwrap(), kind: ChunkKind::CodeClass },
      DeclRule { regex: Regex::new(r"^(?:\w+\s+)*interface\s+(\w+)").unwrap(), kind: ChunkKind::CodeInterface },
      DeclRule { regex: Regex::new(r"^(?:\w+\s+)*enum\s+(\w+)").unwrap(), kind: ChunkKind::CodeEnum },
      // property-like members (`{ get; set; }` or expression-bodied `=>`) are
      // classified as CODE_BLOCK per the component's C# note.
      DeclRule {
        regex: Regex::new(r"^(?:[\w<>\[\],\.\?]+\s+)+(\w+)\s*(?:\{\s*get|\s*=>)").unwrap(),
        kind: ChunkKind::CodeBlock,
      },
      DeclRule {
        regex: Regex::new(r"^(?:[\w<>\[\],\.\?]+\s+)+(\w+)\s*\([^)]*\)\s*(\{|=>|;)").unwrap(),
        kind: ChunkKind::CodeMethod,
      },
    ];
    Self {
      strategy: StrategyDescriptor {
        id: "csharp".to_string(),
        display_name: "C#".to_string(),
        supported_languages: vec!["csharp".to_string()],
        default_max_tokens: Some(DEFAULT_MAX_TOKENS),
        description: Some("Brace-depth structural chunker for C# source.".to_string()),
      },
      spec: BraceLangSpec { language_slug: "csharp", header_prefixes: vec!["using ", "namespace "], decl_rules },
    }
  }
}

impl Default for CSharpChunker {
  fn default() -> Self {
    Self::new()
  }
}

impl Chunker for CSharpChunker {
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
  fn detects_class_and_method() {
    let content = "using System;\n\npublic class Calculator\n{\n    public int Add(int a, int b)\n    {\n        return a + b;\n    }\n}\n";
    let estimator = TokenEstimator::new();
    let ctx = ChunkContext { content, file_path: "Calculator.cs", language: Some("csharp"), estimator: &estimator, max_tokens: DEFAULT_MAX_TOKENS };
    let drafts = CSharpChunker::new().chunk(&ctx);
    assert!(drafts.iter().any(|d| d.kind == ChunkKind::CodeClass && d.symbols.contains(&"Calculator".to_string())));
  }
}
