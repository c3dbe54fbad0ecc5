//! Compiler facade: parsed sources and compiled programs.

pub mod program;
pub mod source;

pub use program::{is_relative, normalize, Program};
pub use source::{is_declaration_path, ModuleStatement, SourceFile, StatementKind};
