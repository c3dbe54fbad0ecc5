//! Parsed source files.
//!
//! The parser is a line scanner that extracts top-level import/export
//! statements with the spans of their module specifiers. That is the
//! entire surface the diagnostic passes need; everything else in the
//! file is opaque text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostics::{codes, Diagnostic, Span};

/// Fixed per-record overhead added to the text length when estimating
/// cache memory usage.
pub const SOURCE_OVERHEAD_BYTES: u64 = 256;

/// Kind of a top-level module statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Import,
    Export,
}

/// One top-level `import`/`export` statement.
///
/// `specifier` is `None` for bare re-exports (`export {x};`), which
/// carry no module specifier. `spec_span` covers the quoted literal,
/// quotes included.
#[derive(Debug, Clone)]
pub struct ModuleStatement {
    pub kind: StatementKind,
    pub specifier: Option<String>,
    pub spec_span: Span,
}

/// A parsed source file. Immutable after construction; the caches hand
/// out `Arc<SourceFile>` and replace records whole.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    /// Hex digest of the file content as loaded.
    pub digest: String,
    pub statements: Vec<ModuleStatement>,
    parse_errors: Vec<Diagnostic>,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn parse(path: impl Into<PathBuf>, text: String, digest: String) -> Arc<SourceFile> {
        let path = path.into();
        let line_starts = compute_line_starts(&text);
        let mut statements = Vec::new();
        let mut parse_errors = Vec::new();
        scan_statements(&path, &text, &mut statements, &mut parse_errors);
        Arc::new(SourceFile { path, text, digest, statements, parse_errors, line_starts })
    }

    /// Syntactic diagnostics found while scanning.
    pub fn parse_errors(&self) -> &[Diagnostic] {
        &self.parse_errors
    }

    /// Estimated memory footprint for cache accounting.
    pub fn estimated_size(&self) -> u64 {
        self.text.len() as u64 + SOURCE_OVERHEAD_BYTES
    }

    /// Whether this is a declaration-only file (`.d.ts`).
    pub fn is_declaration(&self) -> bool {
        is_declaration_path(&self.path)
    }

    /// 1-based line and column for a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }
}

pub fn is_declaration_path(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".d.ts")
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

fn scan_statements(
    path: &Path,
    text: &str,
    statements: &mut Vec<ModuleStatement>,
    parse_errors: &mut Vec<Diagnostic>,
) {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        scan_line(path, line, offset, statements, parse_errors);
        offset += line.len();
    }
}

fn scan_line(
    path: &Path,
    line: &str,
    line_offset: usize,
    statements: &mut Vec<ModuleStatement>,
    parse_errors: &mut Vec<Diagnostic>,
) {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();

    let kind = if is_keyword_statement(trimmed, "import") {
        StatementKind::Import
    } else if is_keyword_statement(trimmed, "export") {
        StatementKind::Export
    } else {
        return;
    };

    // The specifier is the quoted literal after `from`, or directly
    // after `import` for side-effect imports.
    let search_from = match find_from_clause(trimmed) {
        Some(idx) => idx,
        None if kind == StatementKind::Import => "import".len(),
        // Bare re-export such as `export {x};`.
        None => {
            statements.push(ModuleStatement { kind, specifier: None, spec_span: Span::empty() });
            return;
        }
    };

    let rest = &trimmed[search_from..];
    let quote_rel = match rest.find(|c| c == '\'' || c == '"') {
        Some(i) => i,
        None if kind == StatementKind::Import => {
            // `import {x} from` with nothing quotable, or a type-only
            // import without a specifier. Not a module statement.
            return;
        }
        None => {
            statements.push(ModuleStatement { kind, specifier: None, spec_span: Span::empty() });
            return;
        }
    };

    let quote_abs = search_from + quote_rel;
    let quote_char = rest.as_bytes()[quote_rel] as char;
    let after_quote = &trimmed[quote_abs + 1..];

    match after_quote.find(quote_char) {
        Some(end_rel) => {
            let specifier = after_quote[..end_rel].to_string();
            // Span covers the literal including both quotes.
            let start = line_offset + indent + quote_abs;
            let len = end_rel + 2;
            statements.push(ModuleStatement {
                kind,
                specifier: Some(specifier),
                spec_span: Span::new(start, len),
            });
        }
        None => {
            let start = line_offset + indent + quote_abs;
            parse_errors.push(Diagnostic::error(
                path,
                Span::new(start, trimmed.len() - quote_abs),
                codes::UNTERMINATED_STRING_LITERAL,
                "Unterminated string literal.",
            ));
        }
    }
}

fn is_keyword_statement(trimmed: &str, keyword: &str) -> bool {
    if !trimmed.starts_with(keyword) {
        return false;
    }
    matches!(
        trimmed.as_bytes().get(keyword.len()),
        Some(b' ') | Some(b'\t') | Some(b'{') | Some(b'*') | Some(b'\'') | Some(b'"')
    )
}

/// Byte index just past a ` from ` clause, if the line has one.
fn find_from_clause(trimmed: &str) -> Option<usize> {
    let idx = trimmed.find(" from ")?;
    Some(idx + " from ".len())
}
