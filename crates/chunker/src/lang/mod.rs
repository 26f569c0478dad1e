mod brace_common;
mod csharp;
mod java;
mod kotlin;
mod python;
mod typescript;

pub use csharp::CSharpChunker;
pub use java::JavaChunker;
pub use kotlin::KotlinChunker;
pub use python::PythonChunker;
pub use typescript::TypeScriptChunker;
