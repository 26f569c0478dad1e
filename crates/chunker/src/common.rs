use engram_core::estimator::{ModelFamily, TokenEstimator};
use engram_core::types::{Chunk, ChunkKind};
use uuid::Uuid;

/// A chunk before it has an owning file. The incremental indexer assigns
/// `chunk_id`/`file_id`/`created_at` once a `FileRecord` exists.
#[derive(Debug, Clone)]
pub struct ChunkDraft {
  pub ordinal: u32,
  pub kind: ChunkKind,
  pub start_line: Option<u32>,
  pub end_line: Option<u32>,
  pub token_estimate: u32,
  pub content: String,
  pub summary: Option<String>,
  pub symbols: Vec<String>,
  pub language: Option<String>,
  pub imports: Vec<String>,
  pub calls: Vec<String>,
}

impl ChunkDraft {
  pub fn into_chunk(self, file_id: Uuid) -> Chunk {
    Chunk {
      chunk_id: Uuid::now_v7(),
      file_id,
      ordinal: self.ordinal,
      kind: self.kind,
      start_line: self.start_line,
      end_line: self.end_line,
      token_estimate: self.token_estimate,
      content: self.content,
      summary: self.summary,
      created_at: chrono::Utc::now(),
      symbols: self.symbols,
      language: self.language,
      imports: self.imports,
      calls: self.calls,
    }
  }
}

/// Assigns dense, 0-based ordinals in emission order. Every chunker calls
/// this as its final step so `(file_id, ordinal)` density holds.
pub fn assign_ordinals(drafts: &mut [ChunkDraft]) {
  for (i, d) in drafts.iter_mut().enumerate() {
    d.ordinal = i as u32;
  }
}

pub fn split_lines(content: &str) -> Vec<&str> {
  if content.is_empty() {
    return Vec::new();
  }
  content.split('\n').collect()
}

pub fn is_blank(line: &str) -> bool {
  line.trim().is_empty()
}

pub fn estimate(estimator: &TokenEstimator, text: &str) -> u32 {
  estimator.estimate(text, ModelFamily::Default)
}

/// Small explicit state machine tracking brace/paren depth, string/template
/// literal state, and comment state, one character at a time. Used by every
/// C-style (brace-delimited) structural chunker to find block boundaries
/// without being fooled by braces inside strings or comments.
#[derive(Debug, Clone, Default)]
pub struct BraceScanner {
  pub brace_depth: i32,
  pub paren_depth: i32,
  pub in_string: Option<char>,
  pub in_line_comment: bool,
  pub in_block_comment: bool,
  escape_next: bool,
}

impl BraceScanner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn at_top(&self) -> bool {
    self.brace_depth <= 0 && self.in_string.is_none() && !self.in_line_comment && !self.in_block_comment
  }

  /// Advances the scanner by one character. `next` is a single-character
  /// lookahead used to recognize two-character comment delimiters.
  pub fn step(&mut self, c: char, next: Option<char>) {
    if self.escape_next {
      self.escape_next = false;
      return;
    }
    if self.in_line_comment {
      if c == '\n' {
        self.in_line_comment = false;
      }
      return;
    }
    if self.in_block_comment {
      if c == '*' && next == Some('/') {
        self.in_block_comment = false;
      }
      return;
    }
    if let Some(delim) = self.in_string {
      if c == '\\' {
        self.escape_next = true;
        return;
      }
      if c == delim {
        self.in_string = None;
      }
      return;
    }
    match c {
      '/' if next == Some('/') => self.in_line_comment = true,
      '/' if next == Some('*') => self.in_block_comment = true,
      '"' | '\'' | '`' => self.in_string = Some(c),
      '{' => self.brace_depth += 1,
      '}' => self.brace_depth -= 1,
      '(' => self.paren_depth += 1,
      ')' => self.paren_depth -= 1,
      _ => {}
    }
  }
}

/// Scans `lines` starting at `start_idx` (the line containing the opening
/// brace) and returns the index of the line where brace depth returns to
/// zero. Falls back to the last line if the block is never closed.
pub fn find_brace_block_end(lines: &[&str], start_idx: usize) -> usize {
  let mut scanner = BraceScanner::new();
  let mut opened = false;
  for (i, line) in lines.iter().enumerate().skip(start_idx) {
    let chars: Vec<char> = line.chars().collect();
    for (ci, &c) in chars.iter().enumerate() {
      let next = chars.get(ci + 1).copied();
      scanner.step(c, next);
      if scanner.brace_depth > 0 {
        opened = true;
      }
    }
    if opened && scanner.brace_depth <= 0 {
      return i;
    }
  }
  lines.len().saturating_sub(1)
}

/// Splits an oversize declaration into consecutive pieces along line
/// boundaries, preferring blank-line breaks, with overlap (>=1 line,
/// default 15% of a piece's line count) so cross-piece context survives.
/// Always advances by at least one line per iteration regardless of how
/// the boundary search resolves, which rules out the zero-progress loop
/// hazard documented for very large top-level declarations.
pub fn oversize_split(
  name: &str,
  kind: ChunkKind,
  lines: &[&str],
  start_line: u32,
  max_tokens: u32,
  estimator: &TokenEstimator,
) -> Vec<ChunkDraft> {
  if lines.is_empty() {
    return Vec::new();
  }
  let full = lines.join("\n");
  let total_tokens = estimate(estimator, &full);
  if total_tokens <= max_tokens {
    return vec![ChunkDraft {
      ordinal: 0,
      kind,
      start_line: Some(start_line),
      end_line: Some(start_line + lines.len() as u32 - 1),
      token_estimate: total_tokens,
      content: full,
      summary: Some(name.to_string()),
      symbols: vec![name.to_string()],
      language: None,
      imports: Vec::new(),
      calls: Vec::new(),
    }];
  }

  let n_pieces = ((total_tokens as f64) / (max_tokens as f64)).ceil().max(1.0) as usize;
  let base_piece_lines = ((lines.len() as f64) / (n_pieces as f64)).ceil().max(1.0) as usize;
  let overlap = ((base_piece_lines as f64) * 0.15).ceil().max(1.0) as usize;

  let mut drafts = Vec::new();
  let mut cursor = 0usize;
  loop {
    let mut end = (cursor + base_piece_lines).min(lines.len());
    if end < lines.len() {
      let search_back = base_piece_lines.min(8);
      for back in 0..search_back {
        let candidate = end.saturating_sub(back);
        if candidate > cursor && candidate < lines.len() && is_blank(lines[candidate.saturating_sub(1)]) {
          end = candidate;
          break;
        }
      }
    }
    let end = end.max(cursor + 1).min(lines.len());
    let piece_lines = &lines[cursor..end];
    let piece_text = piece_lines.join("\n");
    drafts.push(ChunkDraft {
      ordinal: 0,
      kind,
      start_line: Some(start_line + cursor as u32),
      end_line: Some(start_line + end as u32 - 1),
      token_estimate: estimate(estimator, &piece_text),
      content: piece_text,
      summary: None,
      symbols: vec![name.to_string()],
      language: None,
      imports: Vec::new(),
      calls: Vec::new(),
    });
    if end >= lines.len() {
      break;
    }
    let next_cursor = end.saturating_sub(overlap).max(cursor + 1);
    cursor = next_cursor;
  }

  let total_parts = drafts.len();
  for (i, d) in drafts.iter_mut().enumerate() {
    d.summary = Some(format!("{name} (part {}/{})", i + 1, total_parts));
  }
  drafts
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn brace_scanner_ignores_braces_in_strings() {
    let mut s = BraceScanner::new();
    for (i, c) in "fn f() { let x = \"{}\"; }".chars().enumerate() {
      let next = "fn f() { let x = \"{}\"; }".chars().nth(i + 1);
      s.step(c, next);
    }
    assert_eq!(s.brace_depth, 0);
  }

  #[test]
  fn oversize_split_always_advances() {
    let estimator = TokenEstimator::new();
    let lines: Vec<&str> = vec!["x"; 500];
    let drafts = oversize_split("Big", ChunkKind::CodeClass, &lines, 1, 10, &estimator);
    assert!(!drafts.is_empty());
    // total coverage without gaps: last draft's end_line reaches the end.
    let last = drafts.last().unwrap();
    assert_eq!(last.end_line, Some(lines.len() as u32));
  }

  #[test]
  fn oversize_split_single_piece_when_small() {
    let estimator = TokenEstimator::new();
    let lines = vec!["short", "lines"];
    let drafts = oversize_split("Small", ChunkKind::CodeFunction, &lines, 1, 400, &estimator);
    assert_eq!(drafts.len(), 1);
  }
}
