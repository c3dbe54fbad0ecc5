//! Cross-request cache of parsed source files.
//!
//! Records are keyed by absolute path and replaced whole; the cache
//! never holds two records for one path with different digests. A
//! record is only served when the caller has proved its digest fresh
//! via [`FileCache::update`]. An optional byte budget triggers
//! least-recently-used eviction, skipping records that back the most
//! recently built program of any still-tracked target.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compiler::SourceFile;

#[derive(Debug)]
struct Record {
    source: Arc<SourceFile>,
    size: u64,
    last_used: u64,
}

/// Cache usage counters, reset per build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCacheStats {
    pub hits: usize,
    pub misses: usize,
    pub evictions: usize,
}

#[derive(Debug, Default)]
pub struct FileCache {
    records: HashMap<PathBuf, Record>,
    /// Digests the caller has proved fresh for this request.
    expected_digests: HashMap<PathBuf, String>,
    /// Paths backing the latest program of a still-tracked target.
    protected: HashSet<PathBuf>,
    max_bytes: Option<u64>,
    used_bytes: u64,
    tick: u64,
    stats: FileCacheStats,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record caller-supplied digests proving which cached records are
    /// fresh for the current request. Proofs from earlier requests are
    /// discarded: a path omitted from this map is not served until a
    /// later request proves it again. Records whose stored digest
    /// contradicts a new proof are dropped outright.
    pub fn update(&mut self, digests: HashMap<PathBuf, String>) {
        let contradicted: Vec<PathBuf> = digests
            .iter()
            .filter(|(path, digest)| {
                self.records
                    .get(*path)
                    .is_some_and(|r| r.source.digest != **digest)
            })
            .map(|(path, _)| path.clone())
            .collect();
        for path in contradicted {
            if let Some(record) = self.records.remove(&path) {
                self.used_bytes -= record.size;
            }
        }
        self.expected_digests = digests;
    }

    /// Fetch a record if it is provably fresh.
    pub fn get(&mut self, path: &Path) -> Option<Arc<SourceFile>> {
        let expected = match self.expected_digests.get(path) {
            Some(d) => d,
            None => {
                self.stats.misses += 1;
                return None;
            }
        };
        match self.records.get_mut(path) {
            Some(record) if record.source.digest == *expected => {
                self.tick += 1;
                record.last_used = self.tick;
                self.stats.hits += 1;
                Some(Arc::clone(&record.source))
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Insert a parsed file, overwriting any record for the same path.
    pub fn put(&mut self, source: Arc<SourceFile>) {
        let path = source.path.clone();
        let size = source.estimated_size();
        self.tick += 1;
        if let Some(old) = self.records.remove(&path) {
            self.used_bytes -= old.size;
        }
        self.used_bytes += size;
        self.records.insert(path, Record { source, size, last_used: self.tick });
        self.evict_to_budget();
    }

    /// Set the byte budget and evict down to it immediately.
    pub fn set_max_size(&mut self, bytes: u64) {
        self.max_bytes = Some(bytes);
        self.evict_to_budget();
    }

    /// Remove the budget; no further eviction happens.
    pub fn reset_max_size(&mut self) {
        self.max_bytes = None;
    }

    /// Mark the records backing still-tracked programs. Protected
    /// records are exempt from eviction.
    pub fn set_protected(&mut self, paths: HashSet<PathBuf>) {
        self.protected = paths;
    }

    pub fn stats(&self) -> FileCacheStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = FileCacheStats::default();
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.records.contains_key(path)
    }

    fn evict_to_budget(&mut self) {
        let Some(budget) = self.max_bytes else { return };
        if self.used_bytes <= budget {
            return;
        }
        // Oldest first, protected records skipped.
        let mut candidates: Vec<(PathBuf, u64)> = self
            .records
            .iter()
            .filter(|(path, _)| !self.protected.contains(*path))
            .map(|(path, record)| (path.clone(), record.last_used))
            .collect();
        candidates.sort_by_key(|(_, last_used)| *last_used);

        for (path, _) in candidates {
            if self.used_bytes <= budget {
                break;
            }
            if let Some(record) = self.records.remove(&path) {
                self.used_bytes -= record.size;
                self.stats.evictions += 1;
            }
        }
    }
}
