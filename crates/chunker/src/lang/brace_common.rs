//! Shared engine behind the brace-delimited structural chunkers
//! (Kotlin/C#/TypeScript, and Java's heuristic fallback). Each language
//! module supplies a `BraceLangSpec` describing its header prefixes and
//! ordered declaration-matching rules; this module does header detection,
//! declaration/doc-comment boundary finding, oversize splitting and
//! uncovered-region emission once, the way the teacher's chunker shares a
//! single `chunk_by_definitions`/`chunk_by_lines` pair across languages.

use regex::Regex;

use engram_core::types::ChunkKind;

use crate::common::{assign_ordinals, estimate, find_brace_block_end, is_blank, oversize_split, split_lines, ChunkDraft};
use crate::{ChunkContext, HEADER_TOKEN_CEILING};

pub struct DeclRule {
  pub regex: Regex,
  pub kind: ChunkKind,
}

pub struct BraceLangSpec {
  pub language_slug: &'static str,
  pub header_prefixes: Vec<&'static str>,
  pub decl_rules: Vec<DeclRule>,
}

pub fn chunk_brace_lang(ctx: &ChunkContext, spec: &BraceLangSpec) -> Vec<ChunkDraft> {
  let lines = split_lines(ctx.content);
  if lines.is_empty() || ctx.content.trim().is_empty() {
    return Vec::new();
  }

  let mut drafts = Vec::new();
  let mut header_end: Option<usize> = None;
  for (i, line) in lines.iter().enumerate() {
    let t = line.trim();
    if t.is_empty() {
      if header_end.is_some() {
        continue;
      }
      break;
    }
    if spec.header_prefixes.iter().any(|p| t.starts_with(p)) {
      header_end = Some(i);
    } else {
      break;
    }
  }

  let mut covered_until = 0usize;
  if let Some(h_end) = header_end {
    let header_lines = &lines[0..=h_end];
    let text = header_lines.join("\n");
    let tokens = estimate(ctx.estimator, &text);
    if tokens <= HEADER_TOKEN_CEILING {
      drafts.push(ChunkDraft {
        ordinal: 0,
        kind: ChunkKind::CodeHeader,
        start_line: Some(1),
        end_line: Some((h_end + 1) as u32),
        token_estimate: tokens,
        content: text,
        summary: Some("header".to_string()),
        symbols: Vec::new(),
        language: Some(spec.language_slug.to_string()),
        imports: header_lines.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
        calls: Vec::new(),
      });
      covered_until = h_end + 1;
    }
  }

  let mut cursor = covered_until;
  while cursor < lines.len() {
    let trimmed = lines[cursor].trim();
    if trimmed.is_empty() {
      cursor += 1;
      continue;
    }
    let matched = spec
      .decl_rules
      .iter()
      .find_map(|rule| rule.regex.captures(trimmed).map(|c| (rule.kind, c.get(1).map(|m| m.as_str().to_string()).unwrap_or_default())));

    if let Some((kind, name)) = matched {
      if name.is_empty() {
        cursor += 1;
        continue;
      }
      let (doc_start, _doc) = capture_leading_doc(&lines, cursor, covered_until);
      let decl_end = find_decl_end(&lines, cursor);
      let content_start = doc_start.min(cursor);

      if content_start > covered_until {
        emit_block(&lines, covered_until, content_start - 1, ctx, &mut drafts, spec.language_slug);
      }

      let decl_lines = &lines[content_start..=decl_end];
      let start_line = (content_start + 1) as u32;
      let mut split = oversize_split(&name, kind, decl_lines, start_line, ctx.max_tokens, ctx.estimator);
      for d in &mut split {
        d.language = Some(spec.language_slug.to_string());
        if d.symbols.is_empty() {
          d.symbols.push(name.clone());
        }
      }
      drafts.extend(split);
      covered_until = decl_end + 1;
      cursor = decl_end + 1;
    } else {
      cursor += 1;
    }
  }

  if covered_until < lines.len() {
    emit_block(&lines, covered_until, lines.len() - 1, ctx, &mut drafts, spec.language_slug);
  }

  assign_ordinals(&mut drafts);
  drafts
}

/// Walks backward from `start_idx` over contiguous comment lines, stopping
/// at `floor` (the first line not yet covered by an earlier chunk). Returns
/// the index the doc comment (if any) begins at.
fn capture_leading_doc(lines: &[&str], start_idx: usize, floor: usize) -> (usize, Option<String>) {
  if start_idx <= floor {
    return (start_idx, None);
  }
  let mut j = start_idx;
  let mut doc_lines = Vec::new();
  while j > floor {
    let prev = lines[j - 1].trim();
    if prev.is_empty() {
      break;
    }
    if prev.starts_with("//") || prev.starts_with("/*") || prev.starts_with('*') {
      doc_lines.push(lines[j - 1]);
      j -= 1;
      if prev.starts_with("/**") || prev.starts_with("/*") {
        break;
      }
    } else {
      break;
    }
  }
  if doc_lines.is_empty() {
    (start_idx, None)
  } else {
    doc_lines.reverse();
    (j, Some(doc_lines.join("\n")))
  }
}

/// Finds the inclusive end of a declaration starting at `start_idx`: the
/// matching brace close if one opens, otherwise the first statement
/// terminator or blank line.
fn find_decl_end(lines: &[&str], start_idx: usize) -> usize {
  for (offset, line) in lines.iter().enumerate().skip(start_idx) {
    if line.contains('{') {
      return find_brace_block_end(lines, offset);
    }
    if line.trim_end().ends_with(';') {
      return offset;
    }
    if offset > start_idx && is_blank(line) {
      return offset - 1;
    }
  }
  lines.len().saturating_sub(1)
}

fn emit_block(lines: &[&str], start: usize, end: usize, ctx: &ChunkContext, drafts: &mut Vec<ChunkDraft>, language_slug: &str) {
  if start > end {
    return;
  }
  let region = &lines[start..=end];
  if region.iter().all(|l| l.trim().is_empty()) {
    return;
  }
  let mut split = oversize_split("block", ChunkKind::CodeBlock, region, (start + 1) as u32, ctx.max_tokens, ctx.estimator);
  for d in &mut split {
    d.language = Some(language_slug.to_string());
  }
  drafts.extend(split);
}
