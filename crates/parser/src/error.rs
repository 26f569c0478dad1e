use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
  #[error("tree-sitter language could not be loaded: {0}")]
  Language(String),
  #[error("source could not be parsed")]
  Unparseable,
}
