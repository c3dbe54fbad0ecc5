//! Conformance rules.
//!
//! A small set of named rules over module statements, each individually
//! disableable per target. The whole pass is skipped for transpile-only
//! builds.

use std::collections::BTreeSet;

use crate::compiler::{is_relative, normalize, Program, SourceFile};
use crate::diagnostics::{codes, Diagnostic};
use crate::pipeline::DiagnosticPass;

/// Rule: import paths must not carry a `.ts`/`.tsx` extension. The
/// runtime module loader fails on extension-suffixed specifiers.
pub const RULE_NO_TS_EXTENSION: &str = "no-ts-extension";

/// Rule: relative imports must stay under the configured root.
pub const RULE_NO_ROOT_ESCAPE: &str = "no-root-escape";

pub struct ConformancePass {
    disabled: BTreeSet<String>,
}

impl ConformancePass {
    pub fn new(disabled: BTreeSet<String>) -> Self {
        Self { disabled }
    }

    fn enabled(&self, rule: &str) -> bool {
        !self.disabled.contains(rule)
    }
}

impl DiagnosticPass for ConformancePass {
    fn name(&self) -> &str {
        "conformance"
    }

    fn check_file(
        &self,
        program: &Program,
        file: &SourceFile,
        _so_far: &[Diagnostic],
    ) -> Vec<Diagnostic> {
        let mut result = Vec::new();
        for stmt in &file.statements {
            let Some(spec) = stmt.specifier.as_deref() else { continue };

            if self.enabled(RULE_NO_TS_EXTENSION)
                && (spec.ends_with(".ts") || spec.ends_with(".tsx"))
            {
                result.push(Diagnostic::error(
                    &file.path,
                    stmt.spec_span,
                    codes::IMPORT_PATH_WITH_TS_EXTENSION,
                    format!("An import path cannot end with a '.ts' extension: '{}'.", spec),
                ));
            }

            if self.enabled(RULE_NO_ROOT_ESCAPE) && is_relative(spec) {
                let base = file.path.parent().unwrap_or(std::path::Path::new("/"));
                let resolved = normalize(&base.join(spec));
                if !resolved.starts_with(&program.options().root_dir) {
                    result.push(Diagnostic::warning(
                        &file.path,
                        stmt.spec_span,
                        codes::OUTSIDE_ROOT_DIR,
                        format!(
                            "Import '{}' resolves outside rootDir '{}'.",
                            spec,
                            program.options().root_dir.display()
                        ),
                    ));
                }
            }
        }
        result
    }
}
