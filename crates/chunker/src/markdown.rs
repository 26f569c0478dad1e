//! Markdown chunker: splits on ATX headings and fenced code blocks.

use engram_core::types::ChunkKind;

use crate::common::{assign_ordinals, estimate, is_blank, split_lines, ChunkDraft};
use crate::registry::StrategyDescriptor;
use crate::{ChunkContext, Chunker, DEFAULT_MAX_TOKENS};

pub struct MarkdownChunker {
  strategy: StrategyDescriptor,
}

impl MarkdownChunker {
  pub fn new() -> Self {
    Self {
      strategy: StrategyDescriptor {
        id: "markdown".to_string(),
        display_name: "Markdown".to_string(),
        supported_languages: vec!["markdown".to_string()],
        default_max_tokens: Some(DEFAULT_MAX_TOKENS),
        description: Some("Splits on ATX headings and fenced code blocks.".to_string()),
      },
    }
  }
}

impl Default for MarkdownChunker {
  fn default() -> Self {
    Self::new()
  }
}

/// `1..6 #`s followed by a space or end-of-line counts as an ATX heading.
fn heading_level(trimmed: &str) -> Option<(usize, String)> {
  let hashes = trimmed.chars().take_while(|&c| c == '#').count();
  if hashes == 0 || hashes > 6 {
    return None;
  }
  let after = &trimmed[hashes..];
  if !after.is_empty() && !after.starts_with(' ') {
    return None;
  }
  Some((hashes, after.trim().to_string()))
}

/// A fence opens with `>=3` of the same char (`` ` `` or `~`).
fn fence_char(trimmed: &str) -> Option<char> {
  let c = trimmed.chars().next()?;
  if c != '`' && c != '~' {
    return None;
  }
  let run = trimmed.chars().take_while(|&x| x == c).count();
  if run >= 3 {
    Some(c)
  } else {
    None
  }
}

fn flush_section(lines: &[&str], start: usize, end: usize, title: Option<String>, ctx: &ChunkContext, drafts: &mut Vec<ChunkDraft>) {
  if start > end || start >= lines.len() {
    return;
  }
  let mut end = end.min(lines.len() - 1);
  while end > start && is_blank(lines[end]) {
    end -= 1;
  }
  if start == end && is_blank(lines[start]) {
    return;
  }

  let region = &lines[start..=end];
  let full = region.join("\n");
  let tokens = estimate(ctx.estimator, &full);

  if tokens <= ctx.max_tokens {
    drafts.push(ChunkDraft {
      ordinal: 0,
      kind: ChunkKind::MarkdownSection,
      start_line: Some((start + 1) as u32),
      end_line: Some((end + 1) as u32),
      token_estimate: tokens,
      content: full,
      summary: title,
      symbols: Vec::new(),
      language: None,
      imports: Vec::new(),
      calls: Vec::new(),
    });
    return;
  }

  // Oversize: split preferring blank-line boundaries, else the last line
  // before overflow.
  let mut pieces: Vec<(usize, usize)> = Vec::new();
  let mut piece_start = 0usize;
  let mut cursor = 0usize;
  while cursor < region.len() {
    let text = region[piece_start..=cursor].join("\n");
    if cursor > piece_start && estimate(ctx.estimator, &text) > ctx.max_tokens {
      let mut split_at = cursor - 1;
      for back in (piece_start..cursor).rev() {
        if is_blank(region[back]) {
          split_at = back;
          break;
        }
      }
      let split_at = split_at.max(piece_start);
      pieces.push((piece_start, split_at));
      piece_start = split_at + 1;
      continue;
    }
    cursor += 1;
  }
  if piece_start <= region.len() - 1 {
    pieces.push((piece_start, region.len() - 1));
  }

  let total = pieces.len();
  for (idx, (ps, pe)) in pieces.into_iter().enumerate() {
    if ps > pe {
      continue;
    }
    let text = region[ps..=pe].join("\n");
    let summary = match (&title, total) {
      (Some(t), n) if n > 1 => Some(format!("{t} (part {}/{})", idx + 1, n)),
      (Some(t), _) => Some(t.clone()),
      (None, n) if n > 1 => Some(format!("part {}/{}", idx + 1, n)),
      (None, _) => None,
    };
    drafts.push(ChunkDraft {
      ordinal: 0,
      kind: ChunkKind::MarkdownSection,
      start_line: Some((start + ps + 1) as u32),
      end_line: Some((start + pe + 1) as u32),
      token_estimate: estimate(ctx.estimator, &text),
      content: text,
      summary,
      symbols: Vec::new(),
      language: None,
      imports: Vec::new(),
      calls: Vec::new(),
    });
  }
}

impl Chunker for MarkdownChunker {
  fn strategy(&self) -> &StrategyDescriptor {
    &self.strategy
  }

  fn chunk(&self, ctx: &ChunkContext) -> Vec<ChunkDraft> {
    let lines = split_lines(ctx.content);
    if lines.is_empty() || ctx.content.trim().is_empty() {
      return Vec::new();
    }

    let mut drafts = Vec::new();
    let mut section_start = 0usize;
    let mut section_title: Option<String> = None;
    let mut i = 0usize;

    while i < lines.len() {
      let trimmed = lines[i].trim_start();
      if let Some(fch) = fence_char(trimmed) {
        if i > section_start {
          flush_section(&lines, section_start, i - 1, section_title.clone(), ctx, &mut drafts);
        }
        let open_run = trimmed.chars().take_while(|&c| c == fch).count();
        let label = lines[i].trim().to_string();
        let mut end = lines.len() - 1;
        for (j, line) in lines.iter().enumerate().skip(i + 1) {
          let t = line.trim_start();
          if !t.is_empty() && t.chars().all(|c| c == fch) && t.chars().count() >= open_run {
            end = j;
            break;
          }
        }
        let content = lines[i..=end].join("\n");
        drafts.push(ChunkDraft {
          ordinal: 0,
          kind: ChunkKind::CodeBlock,
          start_line: Some((i + 1) as u32),
          end_line: Some((end + 1) as u32),
          token_estimate: estimate(ctx.estimator, &content),
          content,
          summary: Some(label),
          symbols: Vec::new(),
          language: None,
          imports: Vec::new(),
          calls: Vec::new(),
        });
        i = end + 1;
        section_start = i;
        section_title = None;
        continue;
      }

      if let Some((_level, title)) = heading_level(trimmed) {
        if i > section_start {
          flush_section(&lines, section_start, i - 1, section_title.clone(), ctx, &mut drafts);
        }
        section_start = i;
        section_title = Some(title);
        i += 1;
        continue;
      }

      i += 1;
    }

    flush_section(&lines, section_start, lines.len() - 1, section_title, ctx, &mut drafts);
    assign_ordinals(&mut drafts);
    drafts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::estimator::TokenEstimator;

  #[test]
  fn heading_and_fenced_code_scenario() {
    let content = "# Title\n\npara\n\n```kt\nval x=1\n```\n";
    let estimator = TokenEstimator::new();
    let ctx = ChunkContext { content, file_path: "doc.md", language: Some("markdown"), estimator: &estimator, max_tokens: DEFAULT_MAX_TOKENS };
    let drafts = MarkdownChunker::new().chunk(&ctx);
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].kind, ChunkKind::MarkdownSection);
    assert_eq!(drafts[0].summary.as_deref(), Some("Title"));
    assert_eq!(drafts[0].start_line, Some(1));
    assert_eq!(drafts[0].end_line, Some(3));
    assert_eq!(drafts[1].kind, ChunkKind::CodeBlock);
    assert_eq!(drafts[1].start_line, Some(5));
    assert_eq!(drafts[1].end_line, Some(7));
  }

  #[test]
  fn multiple_headings_produce_multiple_sections() {
    let content = "# One\ntext one\n\n## Two\ntext two\n";
    let estimator = TokenEstimator::new();
    let ctx = ChunkContext { content, file_path: "doc.md", language: Some("markdown"), estimator: &estimator, max_tokens: DEFAULT_MAX_TOKENS };
    let drafts = MarkdownChunker::new().chunk(&ctx);
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].summary.as_deref(), Some("One"));
    assert_eq!(drafts[1].summary.as_deref(), Some("Two"));
  }

  #[test]
  fn empty_input_yields_empty_list() {
    let estimator = TokenEstimator::new();
    let ctx = ChunkContext { content: "", file_path: "doc.md", language: Some("markdown"), estimator: &estimator, max_tokens: DEFAULT_MAX_TOKENS };
    assert!(MarkdownChunker::new().chunk(&ctx).is_empty());
  }
}
