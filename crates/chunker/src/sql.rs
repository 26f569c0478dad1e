//! SQL chunker: splits on statement-terminating semicolons, tracking
//! `BEGIN`/`END` depth so routine bodies (functions/procedures/triggers)
//! are not split on their internal semicolons — the routine-aware variant
//! the component's open questions take as canonical.

use engram_core::types::ChunkKind;

use crate::common::{assign_ordinals, estimate, ChunkDraft};
use crate::registry::StrategyDescriptor;
use crate::{ChunkContext, Chunker, DEFAULT_MAX_TOKENS};

pub struct SqlChunker {
  strategy: StrategyDescriptor,
}

impl SqlChunker {
  pub fn new() -> Self {
    Self {
      strategy: StrategyDescriptor {
        id: "sql".to_string(),
        display_name: "SQL".to_string(),
        supported_languages: vec!["sql".to_string()],
        default_max_tokens: Some(DEFAULT_MAX_TOKENS),
        description: Some("Splits SQL source into statements, tracking BEGIN/END depth for routine bodies.".to_string()),
      },
    }
  }
}

impl Default for SqlChunker {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Default)]
struct ScanState {
  in_string: Option<char>,
  in_line_comment: bool,
  in_block_comment: bool,
}

impl ScanState {
  fn at_top(&self) -> bool {
    self.in_string.is_none() && !self.in_line_comment && !self.in_block_comment
  }

  fn step(&mut self, c: char, next: Option<char>) {
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
      if c == delim {
        self.in_string = None;
      }
      return;
    }
    match c {
      '-' if next == Some('-') => self.in_line_comment = true,
      '/' if next == Some('*') => self.in_block_comment = true,
      '\'' | '"' => self.in_string = Some(c),
      _ => {}
    }
  }
}

/// Splits `content` into `(start, end)` inclusive char-index ranges, one per
/// statement, honoring routine `BEGIN`/`END` depth.
fn split_statements(content: &str) -> Vec<(usize, usize)> {
  let chars: Vec<char> = content.chars().collect();
  let mut state = ScanState::default();
  let mut stmt_start = 0usize;
  let mut word = String::new();
  let mut stmt_word_count = 0usize;
  let mut pending_create = false;
  let mut detected_routine = false;
  let mut seen_initial_begin = false;
  let mut depth: i32 = 0;
  let mut ready = false;
  let mut result = Vec::new();

  for i in 0..chars.len() {
    let c = chars[i];
    let next = chars.get(i + 1).copied();
    let was_top = state.at_top();
    state.step(c, next);
    let now_top = state.at_top();

    if was_top {
      if c.is_alphanumeric() || c == '_' {
        word.push(c);
      } else if !word.is_empty() {
        let upper = word.to_uppercase();
        stmt_word_count += 1;
        if stmt_word_count == 1 && upper == "CREATE" {
          pending_create = true;
        } else if pending_create {
          if matches!(upper.as_str(), "FUNCTION" | "PROCEDURE" | "TRIGGER") {
            detected_routine = true;
          }
          pending_create = false;
        }
        if upper == "BEGIN" {
          depth += 1;
          seen_initial_begin = true;
          ready = false;
        } else if upper == "END" && seen_initial_begin {
          depth -= 1;
          if depth <= 0 {
            depth = 0;
            ready = true;
          }
        }
        word.clear();
      }

      if now_top && c == ';' {
        let terminate = if detected_routine { ready } else { true };
        if terminate {
          result.push((stmt_start, i));
          stmt_start = i + 1;
          word.clear();
          stmt_word_count = 0;
          pending_create = false;
          detected_routine = false;
          seen_initial_begin = false;
          depth = 0;
          ready = false;
        }
      }
    }
  }

  if stmt_start < chars.len() {
    let region: String = chars[stmt_start..].iter().collect();
    if !region.trim().is_empty() {
      result.push((stmt_start, chars.len().saturating_sub(1)));
    }
  }
  result
}

fn skip_leading_comments(s: &str) -> &str {
  let mut rest = s.trim_start();
  loop {
    if let Some(r) = rest.strip_prefix("--") {
      match r.find('\n') {
        Some(nl) => {
          rest = r[nl + 1..].trim_start();
          continue;
        }
        None => return "",
      }
    } else if let Some(r) = rest.strip_prefix("/*") {
      match r.find("*/") {
        Some(end) => {
          rest = r[end + 2..].trim_start();
          continue;
        }
        None => return "",
      }
    }
    break;
  }
  rest
}

/// `"<TYPE> <name>"` where TYPE is the uppercased clause and name the first
/// identifier after it; falls back to the first token (<=20 chars).
fn label_for(stmt: &str) -> String {
  let code = skip_leading_comments(stmt);
  let tokens: Vec<&str> = code.split_whitespace().collect();
  if tokens.is_empty() {
    return String::new();
  }
  let upper0 = tokens[0].to_uppercase();
  if matches!(upper0.as_str(), "CREATE" | "ALTER" | "DROP") && tokens.len() >= 2 {
    let clause = format!("{} {}", upper0, tokens[1].to_uppercase());
    let mut idx = 2;
    while idx < tokens.len() {
      let tu = tokens[idx].to_uppercase();
      if matches!(tu.as_str(), "IF" | "NOT" | "EXISTS" | "OR" | "REPLACE") {
        idx += 1;
        continue;
      }
      break;
    }
    let name = tokens
      .get(idx)
      .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric() && c != '_' && c != '.'))
      .unwrap_or("");
    return if name.is_empty() { clause } else { format!("{clause} {name}") };
  }
  tokens[0].chars().take(20).collect()
}

fn char_line_starts(content: &str) -> Vec<usize> {
  let mut starts = vec![0usize];
  for (i, c) in content.chars().enumerate() {
    if c == '\n' {
      starts.push(i + 1);
    }
  }
  starts
}

fn line_of(line_starts: &[usize], char_idx: usize) -> u32 {
  match line_starts.binary_search(&char_idx) {
    Ok(i) => (i + 1) as u32,
    Err(i) => i.max(1) as u32,
  }
}

impl Chunker for SqlChunker {
  fn strategy(&self) -> &StrategyDescriptor {
    &self.strategy
  }

  fn chunk(&self, ctx: &ChunkContext) -> Vec<ChunkDraft> {
    if ctx.content.trim().is_empty() {
      return Vec::new();
    }
    let ranges = split_statements(ctx.content);
    let chars: Vec<char> = ctx.content.chars().collect();
    let line_starts = char_line_starts(ctx.content);
    let mut drafts = Vec::new();

    for (start, end) in ranges {
      if start > end || start >= chars.len() {
        continue;
      }
      let end = end.min(chars.len() - 1);
      let text: String = chars[start..=end].iter().collect();
      if text.trim().is_empty() {
        continue;
      }
      let label = label_for(&text);
      drafts.push(ChunkDraft {
        ordinal: 0,
        kind: ChunkKind::SqlStatement,
        start_line: Some(line_of(&line_starts, start)),
        end_line: Some(line_of(&line_starts, end)),
        token_estimate: estimate(ctx.estimator, text.trim()),
        content: text.trim().to_string(),
        summary: if label.is_empty() { None } else { Some(label) },
        symbols: Vec::new(),
        language: Some("sql".to_string()),
        imports: Vec::new(),
        calls: Vec::new(),
      });
    }

    assign_ordinals(&mut drafts);
    drafts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::estimator::TokenEstimator;

  fn ctx<'a>(content: &'a str, estimator: &'a engram_core::estimator::TokenEstimator) -> ChunkContext<'a> {
    ChunkContext { content, file_path: "q.sql", language: Some("sql"), estimator, max_tokens: DEFAULT_MAX_TOKENS }
  }

  #[test]
  fn routine_with_internal_semicolon_is_one_statement() {
    let estimator = TokenEstimator::new();
    let content = "CREATE PROCEDURE p() BEGIN SELECT 1; END;";
    let drafts = SqlChunker::new().chunk(&ctx(content, &estimator));
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].kind, ChunkKind::SqlStatement);
  }

  #[test]
  fn simple_statements_split_on_semicolon() {
    let estimator = TokenEstimator::new();
    let content = "CREATE TABLE foo (id INT);\nALTER TABLE foo ADD COLUMN bar INT;\n";
    let drafts = SqlChunker::new().chunk(&ctx(content, &estimator));
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].summary.as_deref(), Some("CREATE TABLE foo"));
    assert_eq!(drafts[1].summary.as_deref(), Some("ALTER TABLE foo"));
  }

  #[test]
  fn leading_comment_is_preserved_as_prefix() {
    let estimator = TokenEstimator::new();
    let content = "-- note\nCREATE TABLE foo (id INT);\n";
    let drafts = SqlChunker::new().chunk(&ctx(content, &estimator));
    assert_eq!(drafts.len(), 1);
    assert!(drafts[0].content.starts_with("-- note"));
  }
}
