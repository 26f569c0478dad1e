//! Indentation-based structural chunker for Python. Unlike the brace-delimited
//! languages this walks indentation width directly (tabs counted as 4
//! spaces, per the component's Python note) rather than sharing
//! `brace_common`'s brace-depth engine.

use engram_core::types::ChunkKind;

use crate::common::{assign_ordinals, estimate, is_blank, oversize_split, split_lines, ChunkDraft};
use crate::registry::StrategyDescriptor;
use crate::{ChunkContext, Chunker, DEFAULT_MAX_TOKENS};

pub struct PythonChunker {
  strategy: StrategyDescriptor,
}

impl PythonChunker {
  pub fn new() -> Self {
    Self {
      strategy: StrategyDescriptor {
        id: "python".to_string(),
        display_name: "Python".to_string(),
        supported_languages: vec!["python".to_string()],
        default_max_tokens: Some(DEFAULT_MAX_TOKENS),
        description: Some("Indentation-based structural chunker for Python modules.".to_string()),
      },
    }
  }
}

impl Default for PythonChunker {
  fn default() -> Self {
    Self::new()
  }
}

/// Tabs count as 4 spaces, per the component's Python note.
fn indent_width(line: &str) -> usize {
  let mut width = 0usize;
  for c in line.chars() {
    match c {
      ' ' => width += 1,
      '\t' => width += 4,
      _ => break,
    }
  }
  width
}

fn triple_quote_delim(trimmed: &str) -> Option<&'static str> {
  if trimmed.starts_with("\"\"\"") {
    Some("\"\"\"")
  } else if trimmed.starts_with("'''") {
    Some("'''")
  } else {
    None
  }
}

/// Returns the inclusive index where a triple-quoted string starting at
/// `start_idx` closes. Handles the single-line `"""doc"""` case.
fn find_docstring_end(lines: &[&str], start_idx: usize, delim: &str) -> usize {
  let first = lines[start_idx].trim();
  if let Some(pos) = first.find(delim) {
    let after = &first[pos + delim.len()..];
    if after.contains(delim) {
      return start_idx;
    }
  }
  for (i, line) in lines.iter().enumerate().skip(start_idx + 1) {
    if line.contains(delim) {
      return i;
    }
  }
  lines.len() - 1
}

fn parse_decl(trimmed: &str) -> Option<(ChunkKind, String)> {
  if let Some(rest) = trimmed.strip_prefix("class ") {
    let name: String = rest.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
    return if name.is_empty() { None } else { Some((ChunkKind::CodeClass, name)) };
  }
  let rest = trimmed.strip_prefix("async def ").or_else(|| trimmed.strip_prefix("def "))?;
  let name: String = rest.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
  if name.is_empty() {
    None
  } else {
    Some((ChunkKind::CodeFunction, name))
  }
}

/// Walks backward over contiguous `@decorator` lines at the same (zero)
/// indent, stopping at `floor`.
fn decorator_start(lines: &[&str], decl_idx: usize, floor: usize) -> usize {
  let mut j = decl_idx;
  while j > floor {
    let prev = lines[j - 1];
    if prev.trim().starts_with('@') && indent_width(prev) == 0 {
      j -= 1;
    } else {
      break;
    }
  }
  j
}

/// Finds the inclusive end of an indented block starting right after
/// `decl_idx`: the last line before indentation returns to zero, with
/// trailing blank lines trimmed off.
fn find_indent_block_end(lines: &[&str], decl_idx: usize) -> usize {
  let mut end = decl_idx;
  let mut j = decl_idx + 1;
  while j < lines.len() {
    if is_blank(lines[j]) {
      j += 1;
      continue;
    }
    if indent_width(lines[j]) == 0 {
      break;
    }
    end = j;
    j += 1;
  }
  while end > decl_idx && is_blank(lines[end]) {
    end -= 1;
  }
  end
}

fn emit_block(lines: &[&str], start: usize, end: usize, ctx: &ChunkContext, drafts: &mut Vec<ChunkDraft>) {
  if start > end {
    return;
  }
  let region = &lines[start..=end];
  if region.iter().all(|l| l.trim().is_empty()) {
    return;
  }
  let mut split = oversize_split("block", ChunkKind::CodeBlock, region, (start + 1) as u32, ctx.max_tokens, ctx.estimator);
  for d in &mut split {
    d.language = Some("python".to_string());
  }
  drafts.extend(split);
}

impl Chunker for PythonChunker {
  fn strategy(&self) -> &StrategyDescriptor {
    &self.strategy
  }

  fn chunk(&self, ctx: &ChunkContext) -> Vec<ChunkDraft> {
    let lines = split_lines(ctx.content);
    if lines.is_empty() || ctx.content.trim().is_empty() {
      return Vec::new();
    }

    let mut drafts = Vec::new();
    let mut cursor = 0usize;
    while cursor < lines.len() && is_blank(lines[cursor]) {
      cursor += 1;
    }

    if cursor < lines.len() {
      if let Some(delim) = triple_quote_delim(lines[cursor].trim()) {
        let end = find_docstring_end(&lines, cursor, delim);
        let content = lines[cursor..=end].join("\n");
        drafts.push(ChunkDraft {
          ordinal: 0,
          kind: ChunkKind::Docstring,
          start_line: Some((cursor + 1) as u32),
          end_line: Some((end + 1) as u32),
          token_estimate: estimate(ctx.estimator, &content),
          content,
          summary: Some("Module docstring".to_string()),
          symbols: Vec::new(),
          language: Some("python".to_string()),
          imports: Vec::new(),
          calls: Vec::new(),
        });
        cursor = end + 1;
      }
    }

    let mut covered_until = cursor;
    let mut i = cursor;
    while i < lines.len() {
      if is_blank(lines[i]) || indent_width(lines[i]) != 0 {
        i += 1;
        continue;
      }
      let trimmed = lines[i].trim();
      let Some((kind, name)) = parse_decl(trimmed) else {
        i += 1;
        continue;
      };

      let content_start = decorator_start(&lines, i, covered_until);
      if content_start > covered_until {
        emit_block(&lines, covered_until, content_start - 1, ctx, &mut drafts);
      }

      let body_end = find_indent_block_end(&lines, i);

      // a function/class docstring is the first statement in the body.
      let mut body_scan = i + 1;
      while body_scan <= body_end && is_blank(lines[body_scan.min(body_end)]) && body_scan < body_end {
        body_scan += 1;
      }
      if body_scan <= body_end {
        if let Some(delim) = triple_quote_delim(lines[body_scan].trim()) {
          let doc_end = find_docstring_end(&lines, body_scan, delim).min(body_end);
          let doc_content = lines[body_scan..=doc_end].join("\n");
          let label_kind = if kind == ChunkKind::CodeClass { "Class" } else { "Function" };
          drafts.push(ChunkDraft {
            ordinal: 0,
            kind: ChunkKind::Docstring,
            start_line: Some((body_scan + 1) as u32),
            end_line: Some((doc_end + 1) as u32),
            token_estimate: estimate(ctx.estimator, &doc_content),
            content: doc_content,
            summary: Some(format!("{label_kind} {name} docstring")),
            symbols: vec![name.clone()],
            language: Some("python".to_string()),
            imports: Vec::new(),
            calls: Vec::new(),
          });
        }
      }

      let decl_lines = &lines[content_start..=body_end];
      let start_line = (content_start + 1) as u32;
      let mut split = oversize_split(&name, kind, decl_lines, start_line, ctx.max_tokens, ctx.estimator);
      let label_kind = if kind == ChunkKind::CodeClass { "Class" } else { "Function" };
      let total = split.len();
      for (idx, d) in split.iter_mut().enumerate() {
        d.language = Some("python".to_string());
        d.symbols = vec![name.clone()];
        d.summary = Some(if total == 1 {
          format!("{label_kind} {name}")
        } else {
          format!("{label_kind} {name} (part {}/{})", idx + 1, total)
        });
      }
      drafts.extend(split);

      covered_until = body_end + 1;
      i = body_end + 1;
    }

    if covered_until < lines.len() {
      emit_block(&lines, covered_until, lines.len() - 1, ctx, &mut drafts);
    }

    assign_ordinals(&mut drafts);
    drafts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use engram_core::estimator::TokenEstimator;

  #[test]
  fn docstring_plus_function_scenario() {
    let content = "\"\"\"Module doc\"\"\"\ndef f(x):\n    \"\"\"F doc\"\"\"\n    return x";
    let estimator = TokenEstimator::new();
    let ctx = ChunkContext { content, file_path: "m.py", language: Some("python"), estimator: &estimator, max_tokens: DEFAULT_MAX_TOKENS };
    let drafts = PythonChunker::new().chunk(&ctx);
    assert_eq!(drafts.len(), 3);
    assert_eq!(drafts[0].kind, ChunkKind::Docstring);
    assert_eq!(drafts[0].summary.as_deref(), Some("Module docstring"));
    assert_eq!(drafts[1].kind, ChunkKind::Docstring);
    assert_eq!(drafts[1].summary.as_deref(), Some("Function f docstring"));
    assert_eq!(drafts[2].kind, ChunkKind::CodeFunction);
    assert_eq!(drafts[2].summary.as_deref(), Some("Function f"));
  }

  #[test]
  fn decorator_is_included_in_declaration() {
    let content = "@staticmethod\ndef g():\n    pass\n";
    let estimator = TokenEstimator::new();
    let ctx = ChunkContext { content, file_path: "m.py", language: Some("python"), estimator: &estimator, max_tokens: DEFAULT_MAX_TOKENS };
    let drafts = PythonChunker::new().chunk(&ctx);
    let func = drafts.iter().find(|d| d.kind == ChunkKind::CodeFunction).unwrap();
    assert!(func.content.contains("@staticmethod"));
  }

  #[test]
  fn class_with_tabs_does_not_panic() {
    let content = "class Foo:\n\tdef bar(self):\n\t\treturn 1\n";
    let estimator = TokenEstimator::new();
    let ctx = ChunkContext { content, file_path: "m.py", language: Some("python"), estimator: &estimator, max_tokens: DEFAULT_MAX_TOKENS };
    let drafts = PythonChunker::new().chunk(&ctx);
    assert!(drafts.iter().any(|d| d.kind == ChunkKind::CodeClass));
  }

  #[test]
  fn empty_input_yields_empty_list() {
    let estimator = TokenEstimator::new();
    let ctx = ChunkContext { content: "", file_path: "m.py", language: Some("python"), estimator: &estimator, max_tokens: DEFAULT_MAX_TOKENS };
    assert!(PythonChunker::new().chunk(&ctx).is_empty());
  }
}
