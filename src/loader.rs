//! File loading strategies.
//!
//! Two loaders implement the same trait: the cached loader consults
//! and refreshes the process-wide [`FileCache`] and is used when the
//! caller supplied content digests (it can prove freshness); the
//! uncached loader always re-reads disk and is used for one-shot
//! invocations where no cross-request cache is meaningful. The choice
//! is made once per request from whether a digest map was supplied.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::cache::FileCache;
use crate::compiler::SourceFile;

/// Source extensions recognized when expanding directories.
const SOURCE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js"];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Hex SHA-256 digest of file content.
pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub trait FileLoader {
    fn load(&mut self, path: &Path) -> Result<Arc<SourceFile>, LoadError>;
}

fn read_and_parse(path: &Path) -> Result<Arc<SourceFile>, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let digest = digest_bytes(&bytes);
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(SourceFile::parse(path, text, digest))
}

/// Loader backed by the cross-request file cache.
pub struct CachedFileLoader<'a> {
    cache: &'a mut FileCache,
}

impl<'a> CachedFileLoader<'a> {
    pub fn new(cache: &'a mut FileCache) -> Self {
        Self { cache }
    }
}

impl FileLoader for CachedFileLoader<'_> {
    fn load(&mut self, path: &Path) -> Result<Arc<SourceFile>, LoadError> {
        if let Some(cached) = self.cache.get(path) {
            return Ok(cached);
        }
        let parsed = read_and_parse(path)?;
        self.cache.put(Arc::clone(&parsed));
        Ok(parsed)
    }
}

/// Loader that always re-reads from disk.
#[derive(Default)]
pub struct UncachedFileLoader;

impl UncachedFileLoader {
    pub fn new() -> Self {
        Self
    }
}

impl FileLoader for UncachedFileLoader {
    fn load(&mut self, path: &Path) -> Result<Arc<SourceFile>, LoadError> {
        read_and_parse(path)
    }
}

/// In-memory loader for tests and callers that supply content directly
/// instead of reading disk.
#[derive(Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
    /// Number of load calls served, for reuse assertions.
    pub loads: usize,
}

impl MemoryLoader {
    pub fn add(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl FileLoader for MemoryLoader {
    fn load(&mut self, path: &Path) -> Result<Arc<SourceFile>, LoadError> {
        self.loads += 1;
        match self.files.get(path) {
            Some(text) => Ok(SourceFile::parse(
                path,
                text.clone(),
                digest_bytes(text.as_bytes()),
            )),
            None => Err(LoadError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            }),
        }
    }
}

fn has_source_extension(path: &Path) -> bool {
    let name = path.to_string_lossy();
    SOURCE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Expand requested root paths: directories are replaced by their
/// contained source files in a stable order, plain paths are kept when
/// they carry a source extension. A root that exists as neither is
/// kept as well, so the mistyped path fails at load time with a
/// diagnostic instead of yielding a silently empty build.
pub fn expand_sources(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for root in roots {
        if root.is_dir() {
            for entry in WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if entry.file_type().is_file() && has_source_extension(path) {
                    out.push(path.to_path_buf());
                }
            }
        } else if has_source_extension(root) || !root.exists() {
            out.push(root.clone());
        }
    }
    out
}
