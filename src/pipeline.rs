//! Diagnostics pipeline.
//!
//! Check layers are explicit `DiagnosticPass` values invoked in order
//! by the pipeline, not proxies wrapped around the program. Each pass
//! sees the accumulated diagnostics read-only and returns only its own
//! additions, so composition is append-only: no pass can suppress or
//! reorder what an inner layer found, and installing an optional pass
//! never changes the base type-check results.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crate::compiler::{Program, SourceFile};
use crate::config::BuildConfig;
use crate::diagnostics::Diagnostic;
use crate::strict_deps::{check_module_deps, StrictDepsConfig};

pub trait DiagnosticPass {
    fn name(&self) -> &str;

    /// Return this pass's findings for one file. `so_far` holds the
    /// diagnostics accumulated by earlier layers for the same file,
    /// read-only.
    fn check_file(
        &self,
        program: &Program,
        file: &SourceFile,
        so_far: &[Diagnostic],
    ) -> Vec<Diagnostic>;
}

/// Ordered, append-only composition of diagnostic passes over one
/// program.
#[derive(Default)]
pub struct DiagnosticsPipeline {
    passes: Vec<Box<dyn DiagnosticPass>>,
}

impl DiagnosticsPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pass: Box<dyn DiagnosticPass>) {
        self.passes.push(pass);
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Gather all diagnostics for the program: global ones first, then
    /// per file in the given order: syntactic, semantic, then each
    /// installed pass's additions.
    pub fn gather(&self, program: &Program, check_files: &[PathBuf]) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = program.global_diagnostics().to_vec();

        for path in check_files {
            let Some(file) = program.source(path) else { continue };
            let file_start = diagnostics.len();
            diagnostics.extend(program.syntactic_diagnostics(file));
            diagnostics.extend(program.semantic_diagnostics(file));
            for pass in &self.passes {
                let additions = pass.check_file(program, file, &diagnostics[file_start..]);
                diagnostics.extend(additions);
            }
        }
        diagnostics
    }
}

/// Strict-deps layer. Checks compilation targets; dependency files are
/// only checked when the independent widening toggle is set.
pub struct StrictDepsPass {
    config: StrictDepsConfig,
    compilation_targets: BTreeSet<PathBuf>,
    check_dependencies: bool,
}

impl StrictDepsPass {
    pub fn new(
        config: StrictDepsConfig,
        compilation_targets: impl IntoIterator<Item = PathBuf>,
        check_dependencies: bool,
    ) -> Self {
        Self {
            config,
            compilation_targets: compilation_targets.into_iter().collect(),
            check_dependencies,
        }
    }
}

impl DiagnosticPass for StrictDepsPass {
    fn name(&self) -> &str {
        "strict-deps"
    }

    fn check_file(
        &self,
        program: &Program,
        file: &SourceFile,
        _so_far: &[Diagnostic],
    ) -> Vec<Diagnostic> {
        if !self.check_dependencies && !self.compilation_targets.contains(&file.path) {
            return Vec::new();
        }
        check_module_deps(program, file, &self.config)
    }
}

/// Factory for optional extra passes, looked up by name from the build
/// configuration. A configured name missing from the registry is a
/// configuration error surfaced eagerly, before any cache mutation.
type PassFactory = Box<dyn Fn(&BuildConfig) -> Box<dyn DiagnosticPass>>;

#[derive(Default)]
pub struct PassRegistry {
    factories: HashMap<String, PassFactory>,
}

impl PassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&BuildConfig) -> Box<dyn DiagnosticPass> + 'static,
    ) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn create(&self, name: &str, config: &BuildConfig) -> Option<Box<dyn DiagnosticPass>> {
        self.factories.get(name).map(|f| f(config))
    }
}
