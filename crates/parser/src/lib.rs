//! AST-based definition extraction for Java, used by the Java chunker as the
//! preferred path when the parser can produce a clean tree. Every other
//! structural chunker relies on the heuristic brace/indent tracking in
//! `engram-chunker` instead.

mod error;
mod java;

pub use error::ParseError;
pub use java::{JavaDefinition, JavaDefinitionKind, JavaParser};
