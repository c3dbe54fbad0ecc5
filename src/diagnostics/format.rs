//! Terminal rendering of diagnostics.
//!
//! Output is grouped by file in the order diagnostics were produced,
//! one line per finding, with 1-based line and column resolved through
//! the program's parsed sources.

use super::Diagnostic;
use crate::compiler::Program;

/// Render all diagnostics for one target as a single block.
pub fn format(target: &str, diagnostics: &[Diagnostic], program: Option<&Program>) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", target));
    for d in diagnostics {
        out.push_str(&format_one(d, program));
        out.push('\n');
    }
    out.push_str(&format!(
        "{} error(s), {} warning(s)\n",
        diagnostics.iter().filter(|d| d.severity == super::Severity::Error).count(),
        diagnostics.iter().filter(|d| d.severity == super::Severity::Warning).count(),
    ));
    out
}

/// Render one diagnostic: `path(line,col): severity TS<code>: message`
/// for file diagnostics, `severity TS<code>: message` for global ones.
pub fn format_one(d: &Diagnostic, program: Option<&Program>) -> String {
    match &d.file {
        Some(path) => {
            let location = program
                .and_then(|p| p.source(path))
                .map(|sf| {
                    let (line, col) = sf.line_col(d.span.start);
                    format!("({},{})", line, col)
                })
                .unwrap_or_default();
            format!(
                "{}{}: {} TS{}: {}",
                path.display(),
                location,
                d.severity,
                d.code,
                d.message
            )
        }
        None => format!("{} TS{}: {}", d.severity, d.code, d.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerOptions;
    use crate::diagnostics::{codes, Span};
    use crate::loader::MemoryLoader;
    use std::path::PathBuf;

    fn program_with(files: &[(&str, &str)]) -> Program {
        let mut loader = MemoryLoader::default();
        for (path, text) in files {
            loader.add(path, *text);
        }
        let list = files.iter().map(|(p, _)| PathBuf::from(p)).collect();
        Program::create(
            list,
            CompilerOptions { root_dir: PathBuf::from("/root") },
            &mut loader,
            None,
        )
    }

    #[test]
    fn file_diagnostic_renders_line_and_column() {
        let program = program_with(&[("/root/a.ts", "import {x} from './b';\n")]);
        let d = Diagnostic::error(
            "/root/a.ts",
            Span::new(16, 5),
            codes::CANNOT_FIND_MODULE,
            "Cannot find module './b'.",
        );
        let line = format_one(&d, Some(&program));
        assert_eq!(line, "/root/a.ts(1,17): error TS2307: Cannot find module './b'.");
    }

    #[test]
    fn global_diagnostic_renders_without_location() {
        let d = Diagnostic::global(codes::FILE_NOT_FOUND, "File '/root/x.ts' not found.");
        assert_eq!(
            format_one(&d, None),
            "error TS6053: File '/root/x.ts' not found."
        );
    }

    #[test]
    fn block_carries_target_and_counts() {
        let d = Diagnostic::global(codes::FILE_NOT_FOUND, "File '/root/x.ts' not found.");
        let block = format("//lib:a", &[d], None);
        assert!(block.starts_with("=== //lib:a ===\n"));
        assert!(block.contains("1 error(s), 0 warning(s)"));
    }
}
