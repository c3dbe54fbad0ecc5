//! Build configuration loading.
//!
//! One build request names a single JSON configuration file. The
//! format is deliberately narrow: `compilerOptions`, `buildOptions`,
//! and `files`. Parsing the full tsconfig surface is out of scope;
//! the fields here are the ones the worker acts on.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that make a request unusable before any cache mutation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("expected one argument: path to the build configuration file")]
    Arguments,
    #[error("cannot read configuration file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed configuration in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("unknown extra diagnostic pass '{0}'")]
    UnknownExtraPass(String),
}

/// Options consumed by the compiler facade.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompilerOptions {
    /// Root directory for module resolution and relative-path display.
    pub root_dir: PathBuf,
}

/// Worker-specific options, parallel to the compiler's own.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BuildOptions {
    /// Identifier of the compilation unit this request builds.
    pub target: String,
    /// Files whose diagnostics are surfaced to the caller. Other files
    /// in `files` are loaded only to supply declarations.
    pub compilation_target_src: Vec<PathBuf>,
    /// Declaring files of the target's direct, declared dependencies.
    pub allowed_strict_deps: Vec<PathBuf>,
    /// Path prefixes exempt from strict-deps checking.
    pub ignored_files_prefixes: Vec<PathBuf>,
    /// Prefix of packaged third-party modules; imports resolving under
    /// it are implicitly declared.
    pub node_modules_prefix: Option<PathBuf>,
    /// Disable the strict-deps layer entirely.
    pub disable_strict_deps: bool,
    /// Also run strict-deps over transitively loaded files. The wider
    /// type-check toggle below does not imply this one.
    pub strict_deps_for_dependencies: bool,
    /// Type-check every loaded file, not just the compilation targets.
    pub check_all_loaded_files: bool,
    /// Transpile-only pass: no type-check gating, conformance skipped.
    pub transpile_only: bool,
    /// Conformance rule identifiers disabled for this target.
    pub disabled_conformance_rules: BTreeSet<String>,
    /// Optional extra diagnostic pass, validated eagerly against the
    /// registry. Absent is valid.
    pub extra_pass: Option<String>,
    /// File cache budget; unset means unbounded.
    pub max_cache_size_mb: Option<u64>,
    /// Regex allow-list of diagnostics expected (and filtered) for
    /// this target.
    pub expected_diagnostics: Vec<String>,
    /// Dependency manifest output path.
    pub manifest_path: Option<PathBuf>,
    /// Generated-externs output path (a directory when
    /// `externsPerDeclaration` is set).
    pub externs_path: Option<PathBuf>,
    /// Emit one externs file per declaration-only input.
    pub externs_per_declaration: bool,
    /// Directory receiving one marker file per compiled module.
    pub module_marker_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuildConfig {
    pub compiler_options: CompilerOptions,
    pub build_options: BuildOptions,
    /// Ordered root file (or directory) paths.
    pub files: Vec<PathBuf>,
}

/// Strip the leading run of `@` from a params-file style argument.
pub fn strip_params_prefix(arg: &str) -> &str {
    arg.trim_start_matches('@')
}

/// Load and validate a build configuration file.
pub fn load_build_config(path: &Path) -> Result<BuildConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let config: BuildConfig =
        serde_json::from_str(&text).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &BuildConfig) -> Result<(), ConfigError> {
    if config.build_options.target.is_empty() {
        return Err(ConfigError::Invalid("buildOptions.target must be set".into()));
    }
    if config.files.is_empty() {
        return Err(ConfigError::Invalid("files must not be empty".into()));
    }
    if !config.compiler_options.root_dir.is_absolute() {
        return Err(ConfigError::Invalid(format!(
            "compilerOptions.rootDir must be absolute, got {}",
            config.compiler_options.root_dir.display()
        )));
    }
    Ok(())
}

impl BuildOptions {
    /// Effective ignored prefixes: the configured ones plus the
    /// packaged-modules prefix and its mirror under the root.
    pub fn effective_ignored_prefixes(&self, root_dir: &Path) -> Vec<PathBuf> {
        let mut prefixes = self.ignored_files_prefixes.clone();
        if let Some(nm) = &self.node_modules_prefix {
            prefixes.push(nm.clone());
            prefixes.push(root_dir.join("node_modules"));
        }
        prefixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("tsconfig.json");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    fn minimal(root: &str) -> String {
        format!(
            r#"{{
                "compilerOptions": {{ "rootDir": "{root}" }},
                "buildOptions": {{ "target": "//lib:a", "compilationTargetSrc": ["{root}/a.ts"] }},
                "files": ["{root}/a.ts"]
            }}"#
        )
    }

    #[test]
    fn strips_leading_at_signs() {
        assert_eq!(strip_params_prefix("@@/path/tsconfig.json"), "/path/tsconfig.json");
        assert_eq!(strip_params_prefix("/plain"), "/plain");
    }

    #[test]
    fn loads_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, &minimal("/root"));
        let config = load_build_config(&path).unwrap();
        assert_eq!(config.build_options.target, "//lib:a");
        assert_eq!(config.compiler_options.root_dir, PathBuf::from("/root"));
        assert!(!config.build_options.disable_strict_deps);
    }

    #[test]
    fn rejects_missing_file() {
        let err = load_build_config(Path::new("/nonexistent/tsconfig.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "{not json");
        let err = load_build_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn rejects_empty_target() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{
            "compilerOptions": { "rootDir": "/root" },
            "buildOptions": { "compilationTargetSrc": [] },
            "files": ["/root/a.ts"]
        }"#;
        let path = write_config(&dir, body);
        let err = load_build_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_relative_root_dir() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{
            "compilerOptions": { "rootDir": "relative" },
            "buildOptions": { "target": "//lib:a" },
            "files": ["/root/a.ts"]
        }"#;
        let path = write_config(&dir, body);
        let err = load_build_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn node_modules_prefix_expands_ignored_prefixes() {
        let opts = BuildOptions {
            node_modules_prefix: Some(PathBuf::from("/external/npm/node_modules")),
            ..Default::default()
        };
        let prefixes = opts.effective_ignored_prefixes(Path::new("/root"));
        assert!(prefixes.contains(&PathBuf::from("/external/npm/node_modules")));
        assert!(prefixes.contains(&PathBuf::from("/root/node_modules")));
    }
}
