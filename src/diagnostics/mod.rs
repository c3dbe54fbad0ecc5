//! Diagnostic model shared by the compiler facade and all check passes.

pub mod expected;
pub mod format;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Stable diagnostic codes.
///
/// Codes that mirror TypeScript's registry keep the same numbers so
/// downstream tooling keyed on `TS<code>` keeps working.
pub mod codes {
    /// "Cannot find module '...'". Also used for strict-deps
    /// violations: an undeclared transitive dependency has the same
    /// remedy as a missing module.
    pub const CANNOT_FIND_MODULE: u32 = 2307;
    /// "Unterminated string literal."
    pub const UNTERMINATED_STRING_LITERAL: u32 = 1002;
    /// "An import path cannot end with a '.ts' extension."
    pub const IMPORT_PATH_WITH_TS_EXTENSION: u32 = 2691;
    /// "File '...' not found."
    pub const FILE_NOT_FOUND: u32 = 6053;
    /// Import resolves outside the configured root directory.
    pub const OUTSIDE_ROOT_DIR: u32 = 6059;
    /// An expected diagnostic (per the target's allow-list) was not
    /// produced by the build. Local to this worker.
    pub const EXPECTED_DIAGNOSTIC_MISSING: u32 = 9000;
}

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Half-open character span within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn empty() -> Self {
        Self { start: 0, len: 0 }
    }
}

/// One immutable diagnostic finding.
///
/// `file` is `None` for global and option-level diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: Option<PathBuf>,
    pub span: Span,
    pub severity: Severity,
    pub code: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn error(file: impl Into<PathBuf>, span: Span, code: u32, message: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            span,
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(file: impl Into<PathBuf>, span: Span, code: u32, message: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            span,
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn global(code: u32, message: impl Into<String>) -> Self {
        Self {
            file: None,
            span: Span::empty(),
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_diagnostics_have_no_file() {
        let d = Diagnostic::global(codes::FILE_NOT_FOUND, "File '/x.ts' not found.");
        assert!(d.file.is_none());
        assert_eq!(d.span, Span::empty());
        assert_eq!(d.severity, Severity::Error);
    }

    #[test]
    fn severity_ordering_puts_error_above_warning() {
        assert!(Severity::Error > Severity::Warning);
    }
}
