//! Per-request build orchestration.
//!
//! One request moves through Idle -> FilesResolved -> ProgramReady ->
//! Checked -> (Emitted | Failed). A malformed request is rejected
//! before any cache mutation; a failed check still persists the new
//! program and file records, since the parsed content is valid even
//! when checking is not.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{FileCache, ProgramCache};
use crate::compiler::{normalize, Program};
use crate::config::{
    load_build_config, strip_params_prefix, BuildConfig, BuildOptions, ConfigError,
};
use crate::conformance::ConformancePass;
use crate::diagnostics::expected::{filter_expected, target_may_expect};
use crate::diagnostics::format::format;
use crate::emit::{EmitError, Emitter};
use crate::loader::{expand_sources, CachedFileLoader, FileLoader, UncachedFileLoader};
use crate::pipeline::{DiagnosticsPipeline, PassRegistry, StrictDepsPass};
use crate::strict_deps::StrictDepsConfig;
use crate::worker::debug;

/// Process-lifetime caches, constructed once and passed into every
/// request by reference.
#[derive(Default)]
pub struct Caches {
    pub files: FileCache,
    pub programs: ProgramCache,
}

impl Caches {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("build failed with {count} diagnostic(s)")]
    Diagnostics { count: usize },
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("internal error: {0}")]
    Internal(String),
}

fn is_compilation_target(options: &BuildOptions, file: &Path) -> bool {
    options.compilation_target_src.iter().any(|t| t == file)
}

fn build_pipeline(
    config: &BuildConfig,
    registry: &PassRegistry,
) -> Result<DiagnosticsPipeline, BuildError> {
    let opts = &config.build_options;
    let root = &config.compiler_options.root_dir;
    let mut pipeline = DiagnosticsPipeline::new();

    if !opts.disable_strict_deps {
        let strict = StrictDepsConfig {
            allowed_deps: opts.allowed_strict_deps.clone(),
            ignored_prefixes: opts.effective_ignored_prefixes(root),
            root_dir: root.clone(),
        };
        pipeline.push(Box::new(StrictDepsPass::new(
            strict,
            opts.compilation_target_src.iter().cloned(),
            opts.strict_deps_for_dependencies,
        )));
    }

    if let Some(name) = &opts.extra_pass {
        // Validated against the registry before any cache mutation;
        // absence here is an impossible state.
        let pass = registry
            .create(name, config)
            .ok_or_else(|| BuildError::Internal(format!("extra pass '{}' vanished from registry", name)))?;
        pipeline.push(pass);
    }

    pipeline.push(Box::new(ConformancePass::new(
        opts.disabled_conformance_rules.clone(),
    )));

    Ok(pipeline)
}

/// Run a single build. Potentially called many times per process when
/// running as a persistent worker; all diagnostics go to `out`.
pub fn run_one_build(
    caches: &mut Caches,
    registry: &PassRegistry,
    emitter: &dyn Emitter,
    args: &[String],
    inputs: Option<&HashMap<String, String>>,
    out: &mut dyn Write,
) -> Result<(), BuildError> {
    // Idle: reject bad requests before touching any cache.
    if args.len() != 1 {
        return Err(ConfigError::Arguments.into());
    }
    let config_path = strip_params_prefix(&args[0]);
    let config = load_build_config(Path::new(config_path))?;
    let opts = &config.build_options;

    if let Some(name) = &opts.extra_pass {
        if !registry.contains(name) {
            return Err(ConfigError::UnknownExtraPass(name.clone()).into());
        }
    }

    match opts.max_cache_size_mb {
        Some(mb) => caches.files.set_max_size(mb * (1 << 20)),
        None => caches.files.reset_max_size(),
    }
    caches.files.reset_stats();
    caches.programs.reset_stats();
    caches.programs.trace_stats();

    // Idle -> FilesResolved.
    let files = expand_sources(&config.files);
    debug(&format!("[build] {}: {} input file(s)", opts.target, files.len()));

    // FilesResolved -> ProgramReady. The previous program for the same
    // target is an incremental hint; its absence means a cold build.
    let old = caches.programs.get(&opts.target);
    let program = if let Some(inputs) = inputs {
        let digests: HashMap<PathBuf, String> = inputs
            .iter()
            .map(|(path, digest)| (normalize(Path::new(path)), digest.clone()))
            .collect();
        caches.files.update(digests);
        let mut loader = CachedFileLoader::new(&mut caches.files);
        Arc::new(build_program(&files, &config, &mut loader, old.as_deref()))
    } else {
        let mut loader = UncachedFileLoader::new();
        Arc::new(build_program(&files, &config, &mut loader, old.as_deref()))
    };

    caches.programs.put(&opts.target, Arc::clone(&program));
    caches.files.set_protected(caches.programs.tracked_files());
    debug(&format!("[build] {}: {} unit(s) reused", opts.target, program.reused_files()));

    let compilation_targets: Vec<PathBuf> = program
        .files()
        .iter()
        .filter(|f| is_compilation_target(opts, f))
        .cloned()
        .collect();

    // ProgramReady -> Checked. Transpile-only passes skip type-check
    // gating entirely.
    if !opts.transpile_only {
        let pipeline = build_pipeline(&config, registry)?;
        let check_files: Vec<PathBuf> = if opts.check_all_loaded_files {
            program.files().to_vec()
        } else {
            compilation_targets.clone()
        };
        let mut diagnostics = pipeline.gather(&program, &check_files);

        if target_may_expect(&opts.target) {
            diagnostics = filter_expected(&opts.expected_diagnostics, diagnostics);
        } else if !opts.expected_diagnostics.is_empty() {
            let _ = writeln!(
                out,
                "warning: target {} may not use expectedDiagnostics; ignoring",
                opts.target
            );
        }

        if !diagnostics.is_empty() {
            let _ = write!(out, "{}", format(&opts.target, &diagnostics, Some(program.as_ref())));
            return Err(BuildError::Diagnostics { count: diagnostics.len() });
        }
    }

    // Checked -> Emitted. Emission diagnostics abort this target only.
    emitter.emit(&program, &compilation_targets, opts)?;
    caches.programs.print_stats();
    Ok(())
}

fn build_program(
    files: &[PathBuf],
    config: &BuildConfig,
    loader: &mut dyn FileLoader,
    old: Option<&Program>,
) -> Program {
    Program::create(
        files.to_vec(),
        config.compiler_options.clone(),
        loader,
        old,
    )
}
