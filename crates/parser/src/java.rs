use tree_sitter::{Node, Parser};

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaDefinitionKind {
  Class,
  Interface,
  Enum,
  Record,
  Method,
  Constructor,
}

#[derive(Debug, Clone)]
pub struct JavaDefinition {
  pub kind: JavaDefinitionKind,
  pub name: String,
  /// 1-based, inclusive.
  pub start_line: u32,
  /// 1-based, inclusive.
  pub end_line: u32,
  pub doc_comment: Option<String>,
  pub modifiers: Vec<String>,
}

const DEFINITION_NODE_KINDS: &[(&str, JavaDefinitionKind)] = &[
  ("class_declaration", JavaDefinitionKind::Class),
  ("interface_declaration", JavaDefinitionKind::Interface),
  ("enum_declaration", JavaDefinitionKind::Enum),
  ("record_declaration", JavaDefinitionKind::Record),
  ("method_declaration", JavaDefinitionKind::Method),
  ("constructor_declaration", JavaDefinitionKind::Constructor),
];

pub struct JavaParser {
  parser: Parser,
}

impl JavaParser {
  pub fn new() -> Result<Self, ParseError> {
    let mut parser = Parser::new();
    let language = tree_sitter_java::LANGUAGE;
    parser.set_language(&language.into()).map_err(|e| ParseError::Language(e.to_string()))?;
    Ok(Self { parser })
  }

  /// Parses `source` and returns every class/interface/enum/record/method/
  /// constructor definition found, in document order. Returns an empty
  /// list (never an error) if the parser rejects the input or the tree
  /// contains syntax errors, per the chunker's fallback contract.
  pub fn parse(&mut self, source: &str) -> Vec<JavaDefinition> {
    let Some(tree) = self.parser.parse(source, None) else {
      return Vec::new();
    };
    let root = tree.root_node();
    if root.has_error() {
      return Vec::new();
    }
    let mut out = Vec::new();
    collect(root, source.as_bytes(), &mut out);
    out
  }
}

fn collect(node: Node, source: &[u8], out: &mut Vec<JavaDefinition>) {
  if let Some((_, kind)) = DEFINITION_NODE_KINDS.iter().find(|(k, _)| *k == node.kind()) {
    if let Some(def) = build_definition(node, source, *kind) {
      out.push(def);
    }
  }
  let mut cursor = node.walk();
  for child in node.children(&mut cursor) {
    collect(child, source, out);
  }
}

fn build_definition(node: Node, source: &[u8], kind: JavaDefinitionKind) -> Option<JavaDefinition> {
  let name_node = node.child_by_field_name("name")?;
  let name = name_node.utf8_text(source).ok()?.to_string();

  let modifiers = node
    .child_by_field_name("modifiers")
    .map(|m| text_of(m, source).split_whitespace().map(|s| s.to_string()).collect())
    .unwrap_or_default();

  let doc_comment = leading_doc_comment(node, source);

  Some(JavaDefinition {
    kind,
    name,
    start_line: node.start_position().row as u32 + 1,
    end_line: node.end_position().row as u32 + 1,
    doc_comment,
    modifiers,
  })
}

fn text_of<'a>(node: Node, source: &'a [u8]) -> &'a str {
  node.utf8_text(source).unwrap_or("")
}

/// Looks at the previous named sibling (skipping modifiers/annotations) for
/// a `/** ... */` Javadoc comment directly preceding the definition.
fn leading_doc_comment(node: Node, source: &[u8]) -> Option<String> {
  let mut sibling = node.prev_sibling();
  while let Some(s) = sibling {
    if s.kind() == "line_comment" {
      sibling = s.prev_sibling();
      continue;
    }
    if s.kind() == "block_comment" {
      let text = text_of(s, source);
      if text.starts_with("/**") {
        return Some(text.to_string());
      }
      return None;
    }
    return None;
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_class_and_method() {
    let src = "package a;\n\n/** Does a thing. */\npublic class Foo {\n  public void bar() {\n    System.out.println(1);\n  }\n}\n";
    let mut parser = JavaParser::new().unwrap();
    let defs = parser.parse(src);
    let class = defs.iter().find(|d| d.kind == JavaDefinitionKind::Class).expect("class");
    assert_eq!(class.name, "Foo");
    assert!(class.doc_comment.as_deref().unwrap().contains("Does a thing"));

    let method = defs.iter().find(|d| d.kind == JavaDefinitionKind::Method).expect("method");
    assert_eq!(method.name, "bar");
  }

  #[test]
  fn malformed_input_yields_empty() {
    let src = "public class Foo { this is not valid java &&&& {{{";
    let mut parser = JavaParser::new().unwrap();
    let defs = parser.parse(src);
    assert!(defs.is_empty());
  }

  #[test]
  fn extracts_interface_and_enum() {
    let src = "interface Shape { double area(); }\nenum Color { RED, GREEN, BLUE }\n";
    let mut parser = JavaParser::new().unwrap();
    let defs = parser.parse(src);
    assert!(defs.iter().any(|d| d.kind == JavaDefinitionKind::Interface && d.name == "Shape"));
    assert!(defs.iter().any(|d| d.kind == JavaDefinitionKind::Enum && d.name == "Color"));
  }
}
