//! Strict dependency checking.
//!
//! Enforces that a compiled file only imports from the declaring files
//! of its direct, declared dependencies. An import of a transitively
//! available file gets the same diagnostic code as a missing module:
//! from the user's perspective the remedy is identical, declare the
//! dependency.
//!
//! Ambient/global declarations are not checked: a specifier that
//! resolves to no declaring file is skipped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::compiler::{Program, SourceFile};
use crate::diagnostics::{codes, Diagnostic};

/// Configuration for one target's strict-deps check.
#[derive(Debug, Clone, Default)]
pub struct StrictDepsConfig {
    /// Declaring files of the target's direct dependencies.
    pub allowed_deps: Vec<PathBuf>,
    /// Path prefixes exempt from checking, e.g. packaged modules the
    /// build system pulls in implicitly.
    pub ignored_prefixes: Vec<PathBuf>,
    /// Root directory for relative-path display in messages.
    pub root_dir: PathBuf,
}

/// Strip a trailing source/declaration extension so that `.ts`,
/// `.tsx`, and `.d.ts` variants of the same module compare equal.
fn strip_ext(path: &Path) -> String {
    let s = path.to_string_lossy();
    for ext in [".d.tsx", ".d.ts", ".tsx", ".ts"] {
        if let Some(stripped) = s.strip_suffix(ext) {
            return stripped.to_string();
        }
    }
    s.into_owned()
}

/// Lexical path relative to `root`, walking up with `..` components
/// when the path lies outside it.
fn display_relative(root: &Path, path: &Path) -> String {
    if let Ok(rel) = path.strip_prefix(root) {
        return rel.to_string_lossy().into_owned();
    }
    let root_comps: Vec<_> = root.components().collect();
    let path_comps: Vec<_> = path.components().collect();
    let common = root_comps
        .iter()
        .zip(path_comps.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..root_comps.len() {
        out.push("..");
    }
    for comp in &path_comps[common..] {
        out.push(comp.as_os_str());
    }
    out.to_string_lossy().into_owned()
}

/// Check every top-level import/export statement of `file` against the
/// allowed declaring files. Deterministic and side-effect-free.
pub fn check_module_deps(
    program: &Program,
    file: &SourceFile,
    config: &StrictDepsConfig,
) -> Vec<Diagnostic> {
    let allowed: HashSet<String> =
        config.allowed_deps.iter().map(|d| strip_ext(d)).collect();

    let mut result = Vec::new();
    for stmt in &file.statements {
        // Bare re-exports carry no module specifier.
        let Some(spec) = stmt.specifier.as_deref() else { continue };

        // Resolve to the declaring file; unresolved specifiers are
        // ambient and not checked here.
        let Some(decl_file) = program.resolve_module(&file.path, spec) else { continue };

        if allowed.contains(&strip_ext(&decl_file)) {
            continue;
        }
        if config.ignored_prefixes.iter().any(|p| decl_file.starts_with(p)) {
            continue;
        }

        let import_name = display_relative(&config.root_dir, Path::new(&strip_ext(&decl_file)));
        result.push(Diagnostic::error(
            &file.path,
            stmt.spec_span,
            codes::CANNOT_FIND_MODULE,
            format!(
                "transitive dependency on {} not allowed. \
                 Please add the missing target to your rule's deps.",
                import_name
            ),
        ));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerOptions;
    use crate::loader::MemoryLoader;
    use std::sync::Arc;

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

    fn config(allowed: &[&str]) -> StrictDepsConfig {
        StrictDepsConfig {
            allowed_deps: allowed.iter().map(PathBuf::from).collect(),
            ignored_prefixes: Vec::new(),
            root_dir: PathBuf::from("/root"),
        }
    }

    fn source(program: &Program, path: &str) -> Arc<SourceFile> {
        Arc::clone(program.source(Path::new(path)).unwrap())
    }

    #[test]
    fn allowed_import_produces_no_diagnostic() {
        let program = program_with(&[
            ("/root/a.ts", "import {x} from './b';\n"),
            ("/root/b.ts", "export const x = 1;\n"),
        ]);
        let sf = source(&program, "/root/a.ts");
        let diags = check_module_deps(&program, &sf, &config(&["/root/b.ts"]));
        assert!(diags.is_empty());
    }

    #[test]
    fn undeclared_import_produces_one_diagnostic() {
        let program = program_with(&[
            ("/root/a.ts", "import {x} from './b';\n"),
            ("/root/b.ts", "export const x = 1;\n"),
        ]);
        let sf = source(&program, "/root/a.ts");
        let diags = check_module_deps(&program, &sf, &config(&["/root/other.ts"]));

        assert_eq!(diags.len(), 1);
        let d = &diags[0];
        assert_eq!(d.code, codes::CANNOT_FIND_MODULE);
        assert!(d.message.contains("transitive dependency on b not allowed"));
        assert!(d.message.contains("deps"));
        // Anchored at the specifier span.
        assert_eq!(&sf.text[d.span.start..d.span.start + d.span.len], "'./b'");
    }

    #[test]
    fn extension_variants_compare_equal() {
        let program = program_with(&[
            ("/root/a.ts", "import {x} from './b';\n"),
            ("/root/b.ts", "export const x = 1;\n"),
        ]);
        let sf = source(&program, "/root/a.ts");
        // Allowed set lists the declaration variant; the resolved file
        // is the source variant.
        for allowed in ["/root/b.d.ts", "/root/b.tsx", "/root/b.ts"] {
            let diags = check_module_deps(&program, &sf, &config(&[allowed]));
            assert!(diags.is_empty(), "variant {} should be allowed", allowed);
        }
    }

    #[test]
    fn ignored_prefix_exempts_any_import() {
        let program = program_with(&[
            ("/root/a.ts", "import {x} from 'dep';\n"),
            ("/root/node_modules/dep/index.d.ts", "export declare const x: number;\n"),
        ]);
        let sf = source(&program, "/root/a.ts");
        let mut cfg = config(&[]);
        cfg.ignored_prefixes = vec![PathBuf::from("/root/node_modules")];
        let diags = check_module_deps(&program, &sf, &cfg);
        assert!(diags.is_empty());
    }

    #[test]
    fn unresolved_specifier_is_skipped() {
        let program = program_with(&[("/root/a.ts", "import * as fs from 'fs';\n")]);
        let sf = source(&program, "/root/a.ts");
        let diags = check_module_deps(&program, &sf, &config(&[]));
        assert!(diags.is_empty());
    }

    #[test]
    fn bare_reexport_is_skipped() {
        let program = program_with(&[("/root/a.ts", "export {x};\n")]);
        let sf = source(&program, "/root/a.ts");
        let diags = check_module_deps(&program, &sf, &config(&[]));
        assert!(diags.is_empty());
    }

    #[test]
    fn export_from_is_checked() {
        let program = program_with(&[
            ("/root/a.ts", "export * from './b';\n"),
            ("/root/b.ts", "export const x = 1;\n"),
        ]);
        let sf = source(&program, "/root/a.ts");
        let diags = check_module_deps(&program, &sf, &config(&[]));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn check_is_idempotent() {
        let program = program_with(&[
            ("/root/a.ts", "import {x} from './b';\nimport {y} from './c';\n"),
            ("/root/b.ts", "export const x = 1;\n"),
            ("/root/c.ts", "export const y = 1;\n"),
        ]);
        let sf = source(&program, "/root/a.ts");
        let cfg = config(&["/root/b.ts"]);
        let first = check_module_deps(&program, &sf, &cfg);
        let second = check_module_deps(&program, &sf, &cfg);
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn violation_outside_root_is_displayed_relative() {
        let program = program_with(&[
            ("/root/a.ts", "import {x} from '../other/b';\n"),
            ("/other/b.ts", "export const x = 1;\n"),
        ]);
        let sf = source(&program, "/root/a.ts");
        let diags = check_module_deps(&program, &sf, &config(&[]));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("transitive dependency on ../other/b not allowed"));
    }

    #[test]
    fn relative_display_walks_up_shared_prefix() {
        let program = program_with(&[
            ("/ws/pkg/lib/a.ts", "import {x} from '../../vendor/b';\n"),
            ("/ws/vendor/b.ts", "export const x = 1;\n"),
        ]);
        let sf = source(&program, "/ws/pkg/lib/a.ts");
        let cfg = StrictDepsConfig {
            allowed_deps: Vec::new(),
            ignored_prefixes: Vec::new(),
            root_dir: PathBuf::from("/ws/pkg"),
        };
        let diags = check_module_deps(&program, &sf, &cfg);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("../vendor/b"));
    }
}
