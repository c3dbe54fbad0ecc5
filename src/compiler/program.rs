//! Compiled units.
//!
//! A `Program` is the compiled representation of one file set under
//! one option set. Construction takes the previous program for the
//! same target as an incremental hint: parsed units whose content
//! digest is unchanged are carried over, everything else is loaded
//! through the supplied loader. An absent or incompatible previous
//! program silently degrades to a cold build.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::config::CompilerOptions;
use crate::diagnostics::{codes, Diagnostic};
use crate::loader::FileLoader;

use super::source::SourceFile;

/// Extension variants tried when resolving a module specifier.
const RESOLVE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts"];

#[derive(Debug)]
pub struct Program {
    options: CompilerOptions,
    file_list: Vec<PathBuf>,
    sources: HashMap<PathBuf, Arc<SourceFile>>,
    /// Diagnostics for inputs that could not be read. Reported with
    /// the build's other diagnostics; unrelated cached records stay
    /// valid.
    load_diagnostics: Vec<Diagnostic>,
    reused: usize,
}

impl Program {
    /// Construct a program, reusing parsed units from `old` where the
    /// content digest is unchanged and the options are compatible.
    pub fn create(
        file_list: Vec<PathBuf>,
        options: CompilerOptions,
        loader: &mut dyn FileLoader,
        old: Option<&Program>,
    ) -> Program {
        let old = old.filter(|p| p.options == options);
        let mut sources = HashMap::new();
        let mut load_diagnostics = Vec::new();
        let mut reused = 0;

        for path in &file_list {
            let loaded = match loader.load(path) {
                Ok(sf) => sf,
                Err(e) => {
                    load_diagnostics.push(Diagnostic::global(
                        codes::FILE_NOT_FOUND,
                        format!("File '{}' not found: {}.", path.display(), e),
                    ));
                    continue;
                }
            };
            let source = match old.and_then(|p| p.source(path)) {
                Some(prev) if prev.digest == loaded.digest => {
                    reused += 1;
                    Arc::clone(prev)
                }
                _ => loaded,
            };
            sources.insert(path.clone(), source);
        }

        Program { options, file_list, sources, load_diagnostics, reused }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Ordered input file list, as resolved from the configuration.
    pub fn files(&self) -> &[PathBuf] {
        &self.file_list
    }

    pub fn source(&self, path: &Path) -> Option<&Arc<SourceFile>> {
        self.sources.get(path)
    }

    /// Number of parsed units carried over from the previous program.
    pub fn reused_files(&self) -> usize {
        self.reused
    }

    /// Global diagnostics: unreadable inputs.
    pub fn global_diagnostics(&self) -> &[Diagnostic] {
        &self.load_diagnostics
    }

    /// Syntactic diagnostics for one file.
    pub fn syntactic_diagnostics(&self, file: &SourceFile) -> Vec<Diagnostic> {
        file.parse_errors().to_vec()
    }

    /// Semantic diagnostics for one file: relative imports that
    /// resolve to nothing. Bare specifiers that fail to resolve are
    /// treated as ambient modules and skipped.
    pub fn semantic_diagnostics(&self, file: &SourceFile) -> Vec<Diagnostic> {
        let mut result = Vec::new();
        for stmt in &file.statements {
            let Some(spec) = stmt.specifier.as_deref() else { continue };
            if !is_relative(spec) {
                continue;
            }
            if self.resolve_module(&file.path, spec).is_none() {
                result.push(Diagnostic::error(
                    &file.path,
                    stmt.spec_span,
                    codes::CANNOT_FIND_MODULE,
                    format!("Cannot find module '{}'.", spec),
                ));
            }
        }
        result
    }

    /// Resolve a module specifier to the file that declares it, within
    /// this program's file set.
    pub fn resolve_module(&self, from: &Path, specifier: &str) -> Option<PathBuf> {
        let candidates = if is_relative(specifier) {
            let base = from.parent().unwrap_or(Path::new("/"));
            vec![normalize(&base.join(specifier))]
        } else {
            // Bare specifiers resolve against the packaged-modules
            // tree under the root.
            vec![normalize(&self.options.root_dir.join("node_modules").join(specifier))]
        };

        for candidate in candidates {
            if let Some(found) = self.probe(&candidate) {
                return Some(found);
            }
        }
        None
    }

    fn probe(&self, candidate: &Path) -> Option<PathBuf> {
        if self.sources.contains_key(candidate) {
            return Some(candidate.to_path_buf());
        }
        let raw = candidate.as_os_str().to_string_lossy();
        for ext in RESOLVE_EXTENSIONS {
            let with_ext = PathBuf::from(format!("{}{}", raw, ext));
            if self.sources.contains_key(&with_ext) {
                return Some(with_ext);
            }
        }
        for index in &["index.ts", "index.tsx", "index.d.ts"] {
            let with_index = candidate.join(index);
            if self.sources.contains_key(&with_index) {
                return Some(with_index);
            }
        }
        None
    }
}

pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Normalize `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;

    fn options() -> CompilerOptions {
        CompilerOptions { root_dir: PathBuf::from("/root") }
    }

    fn program_with(files: &[(&str, &str)]) -> Program {
        let mut loader = MemoryLoader::default();
        for (path, text) in files {
            loader.add(path, *text);
        }
        let list = files.iter().map(|(p, _)| PathBuf::from(p)).collect();
        Program::create(list, options(), &mut loader, None)
    }

    #[test]
    fn resolves_relative_import_with_extension_probing() {
        let program = program_with(&[
            ("/root/a.ts", "import {x} from './b';\n"),
            ("/root/b.ts", "export const x = 1;\n"),
        ]);
        let resolved = program.resolve_module(Path::new("/root/a.ts"), "./b");
        assert_eq!(resolved, Some(PathBuf::from("/root/b.ts")));
    }

    #[test]
    fn resolves_parent_relative_import() {
        let program = program_with(&[
            ("/root/sub/a.ts", "import {x} from '../b';\n"),
            ("/root/b.d.ts", "export declare const x: number;\n"),
        ]);
        let resolved = program.resolve_module(Path::new("/root/sub/a.ts"), "../b");
        assert_eq!(resolved, Some(PathBuf::from("/root/b.d.ts")));
    }

    #[test]
    fn resolves_bare_specifier_under_node_modules() {
        let program = program_with(&[
            ("/root/a.ts", "import {x} from 'dep';\n"),
            ("/root/node_modules/dep/index.d.ts", "export declare const x: number;\n"),
        ]);
        let resolved = program.resolve_module(Path::new("/root/a.ts"), "dep");
        assert_eq!(resolved, Some(PathBuf::from("/root/node_modules/dep/index.d.ts")));
    }

    #[test]
    fn unresolved_relative_import_is_semantic_error() {
        let program = program_with(&[("/root/a.ts", "import {x} from './missing';\n")]);
        let sf = program.source(Path::new("/root/a.ts")).unwrap().clone();
        let diags = program.semantic_diagnostics(&sf);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::CANNOT_FIND_MODULE);
        assert!(diags[0].message.contains("./missing"));
    }

    #[test]
    fn unresolved_bare_specifier_is_ambient() {
        let program = program_with(&[("/root/a.ts", "import * as fs from 'fs';\n")]);
        let sf = program.source(Path::new("/root/a.ts")).unwrap().clone();
        assert!(program.semantic_diagnostics(&sf).is_empty());
    }

    #[test]
    fn missing_input_becomes_global_diagnostic() {
        let mut loader = MemoryLoader::default();
        loader.add("/root/a.ts", "export const a = 1;\n");
        let program = Program::create(
            vec![PathBuf::from("/root/a.ts"), PathBuf::from("/root/gone.ts")],
            options(),
            &mut loader,
            None,
        );
        assert_eq!(program.global_diagnostics().len(), 1);
        assert_eq!(program.global_diagnostics()[0].code, codes::FILE_NOT_FOUND);
        // The readable input is still part of the program.
        assert!(program.source(Path::new("/root/a.ts")).is_some());
    }

    #[test]
    fn reuses_unchanged_units_from_old_program() {
        let first = program_with(&[
            ("/root/a.ts", "import {x} from './b';\n"),
            ("/root/b.ts", "export const x = 1;\n"),
        ]);

        let mut loader = MemoryLoader::default();
        loader.add("/root/a.ts", "import {x} from './b';\n");
        loader.add("/root/b.ts", "export const x = 1;\n");
        let second = Program::create(
            first.files().to_vec(),
            options(),
            &mut loader,
            Some(&first),
        );
        assert_eq!(second.reused_files(), 2);
        // Object identity is preserved for unchanged units.
        let a = Path::new("/root/a.ts");
        assert!(Arc::ptr_eq(first.source(a).unwrap(), second.source(a).unwrap()));
    }

    #[test]
    fn incompatible_options_degrade_to_cold_build() {
        let first = program_with(&[("/root/a.ts", "export const a = 1;\n")]);
        let mut loader = MemoryLoader::default();
        loader.add("/root/a.ts", "export const a = 1;\n");
        let other_options = CompilerOptions { root_dir: PathBuf::from("/elsewhere") };
        let second = Program::create(
            first.files().to_vec(),
            other_options,
            &mut loader,
            Some(&first),
        );
        assert_eq!(second.reused_files(), 0);
    }

    #[test]
    fn normalize_collapses_dot_components() {
        assert_eq!(normalize(Path::new("/root/sub/../b.ts")), PathBuf::from("/root/b.ts"));
        assert_eq!(normalize(Path::new("/root/./a.ts")), PathBuf::from("/root/a.ts"));
    }
}
