//! tsbuild - persistent incremental TypeScript build worker
//!
//! This crate implements a compiler wrapper that serves many build
//! requests from one long-lived process, carrying parsed sources and
//! compiled programs across requests, and layering strict dependency
//! checking and conformance rules over the base type check.

pub mod build;
pub mod cache;
pub mod compiler;
pub mod config;
pub mod conformance;
pub mod diagnostics;
pub mod emit;
pub mod loader;
pub mod pipeline;
pub mod strict_deps;
pub mod worker;

pub use build::{run_one_build, BuildError, Caches};
pub use cache::{FileCache, ProgramCache};
pub use compiler::Program;
pub use config::{load_build_config, BuildConfig, BuildOptions, CompilerOptions, ConfigError};
pub use diagnostics::{Diagnostic, Severity};
pub use pipeline::{DiagnosticPass, DiagnosticsPipeline, PassRegistry};
pub use worker::Worker;
