//! Universal fallback chunker for content with no dedicated structural
//! strategy. Splits on blank-line paragraph boundaries, falling back to
//! raw line grouping when no paragraph breaks exist at all.

use engram_core::types::ChunkKind;

use crate::common::{assign_ordinals, estimate, is_blank, split_lines, ChunkDraft};
use crate::registry::StrategyDescriptor;
use crate::{ChunkContext, Chunker, DEFAULT_MAX_TOKENS};

pub struct PlaintextChunker {
  strategy: StrategyDescriptor,
}

impl PlaintextChunker {
  pub fn new() -> Self {
    Self {
      strategy: StrategyDescriptor {
        id: "plaintext".to_string(),
        display_name: "Plain text".to_string(),
        supported_languages: Vec::new(),
        default_max_tokens: Some(DEFAULT_MAX_TOKENS),
        description: Some("Fallback chunker: splits on blank-line paragraphs, then raw line groups.".to_string()),
      },
    }
  }
}

impl Default for PlaintextChunker {
  fn default() -> Self {
    Self::new()
  }
}

fn paragraph_ranges(lines: &[&str]) -> Vec<(usize, usize)> {
  let mut ranges = Vec::new();
  let mut i = 0usize;
  while i < lines.len() {
    if is_blank(lines[i]) {
      i += 1;
      continue;
    }
    let start = i;
    let mut end = i;
    while end + 1 < lines.len() && !is_blank(lines[end + 1]) {
      end += 1;
    }
    ranges.push((start, end));
    i = end + 1;
  }
  ranges
}

/// Splits an oversize paragraph into consecutive line groups bounded by
/// `max_tokens`, always advancing by at least one line.
fn split_paragraph(lines: &[&str], start: usize, end: usize, ctx: &ChunkContext, drafts: &mut Vec<ChunkDraft>) {
  let region = &lines[start..=end];
  let full = region.join("\n");
  if estimate(ctx.estimator, &full) <= ctx.max_tokens {
    push_block(region, start, ctx, drafts);
    return;
  }

  let mut cursor = 0usize;
  while cursor < region.len() {
    let mut piece_end = cursor;
    while piece_end + 1 < region.len() {
      let candidate = region[cursor..=piece_end + 1].join("\n");
      if estimate(ctx.estimator, &candidate) > ctx.max_tokens {
        break;
      }
      piece_end += 1;
    }
    push_block(&region[cursor..=piece_end], start + cursor, ctx, drafts);
    cursor = piece_end + 1;
  }
}

fn push_block(lines: &[&str], region_start: usize, ctx: &ChunkContext, drafts: &mut Vec<ChunkDraft>) {
  let content = lines.join("\n");
  drafts.push(ChunkDraft {
    ordinal: 0,
    kind: ChunkKind::Paragraph,
    start_line: Some((region_start + 1) as u32),
    end_line: Some((region_start + lines.len()) as u32),
    token_estimate: estimate(ctx.estimator, &content),
    content,
    summary: None,
    symbols: Vec::new(),
    language: None,
    imports: Vec::new(),
    calls: Vec::new(),
  });
}

impl Chunker for PlaintextChunker {
  fn strategy(&self) -> &StrategyDescriptor {
    &self.strategy
  }

  fn chunk(&self, ctx: &ChunkContext) -> Vec<ChunkDraft> {
    let lines = split_lines(ctx.content);
    if lines.is_empty() || ctx.content.trim().is_empty() {
      return Vec::new();
    }

    let mut drafts = Vec::new();
    let ranges = paragraph_ranges(&lines);
    if ranges.is_empty() {
      push_block(&lines, 0, ctx, &mut drafts);
    } else {
      for (start, end) in ranges {
        split_paragraph(&lines, start, end, ctx, &mut drafts);
      }
    }

    assign_ordinals(&mut drafts);
    drafts
  }
}
