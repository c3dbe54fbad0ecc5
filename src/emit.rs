//! Emission step.
//!
//! Runs only on a diagnostics-free build. Each side-channel output is
//! gated by its own configuration field: a dependency manifest, a
//! generated-externs file (optionally one per declaration-only input),
//! and per-module marker files. The emitter is a trait so builds can
//! run with a different strategy, or none, supplied at configuration
//! time.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::compiler::Program;
use crate::config::BuildOptions;

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn write_file(path: &Path, contents: &str) -> Result<(), EmitError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| EmitError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut f = fs::File::create(path).map_err(|source| EmitError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    f.write_all(contents.as_bytes()).map_err(|source| EmitError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Root-relative module name without its source extension.
fn module_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let s = rel.to_string_lossy();
    for ext in [".d.ts", ".tsx", ".ts", ".js"] {
        if let Some(stripped) = s.strip_suffix(ext) {
            return stripped.to_string();
        }
    }
    s.into_owned()
}

pub trait Emitter {
    fn emit(
        &self,
        program: &Program,
        compilation_targets: &[PathBuf],
        options: &BuildOptions,
    ) -> Result<(), EmitError>;
}

/// The built-in emitter.
#[derive(Default)]
pub struct DefaultEmitter;

impl DefaultEmitter {
    pub fn new() -> Self {
        Self
    }

    fn emit_manifest(
        &self,
        program: &Program,
        targets: &[PathBuf],
        path: &Path,
    ) -> Result<(), EmitError> {
        let root = &program.options().root_dir;
        let mut manifest = String::new();
        for target in targets {
            manifest.push_str(&module_name(root, target));
            manifest.push('\n');
        }
        write_file(path, &manifest)
    }

    fn emit_externs(
        &self,
        program: &Program,
        path: &Path,
        per_declaration: bool,
        options: &BuildOptions,
    ) -> Result<(), EmitError> {
        let root = &program.options().root_dir;
        let declarations: Vec<&PathBuf> = program
            .files()
            .iter()
            .filter(|p| crate::compiler::is_declaration_path(p))
            .collect();

        if per_declaration {
            // `path` is a directory; one externs file per declaration
            // input.
            for decl in declarations {
                let name = module_name(root, decl).replace('/', "_");
                let out = path.join(format!("{}.externs.js", name));
                let body = format!(
                    "/** @externs generated for {} from {} */\n",
                    options.target,
                    decl.display()
                );
                write_file(&out, &body)?;
            }
            Ok(())
        } else {
            let mut body = format!("/** @externs generated for {} */\n", options.target);
            for decl in declarations {
                body.push_str(&format!("/** from {} */\n", decl.display()));
            }
            write_file(path, &body)
        }
    }

    fn emit_markers(
        &self,
        program: &Program,
        targets: &[PathBuf],
        dir: &Path,
    ) -> Result<(), EmitError> {
        let root = &program.options().root_dir;
        for target in targets {
            let name = module_name(root, target).replace('/', "_");
            write_file(&dir.join(format!("{}.marker", name)), "")?;
        }
        Ok(())
    }
}

impl Emitter for DefaultEmitter {
    fn emit(
        &self,
        program: &Program,
        compilation_targets: &[PathBuf],
        options: &BuildOptions,
    ) -> Result<(), EmitError> {
        if let Some(manifest_path) = &options.manifest_path {
            self.emit_manifest(program, compilation_targets, manifest_path)?;
        }
        if let Some(externs_path) = &options.externs_path {
            self.emit_externs(program, externs_path, options.externs_per_declaration, options)?;
        }
        if let Some(marker_dir) = &options.module_marker_dir {
            self.emit_markers(program, compilation_targets, marker_dir)?;
        }
        Ok(())
    }
}
