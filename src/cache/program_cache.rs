//! Cross-request cache of compiled programs.
//!
//! One live entry per target, replaced whole after a build completes
//! (success or failure). The cache performs no diff logic itself; it
//! only hands back the exact previous program as an incremental hint
//! for construction.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::compiler::Program;
use crate::worker::debug;

#[derive(Debug)]
struct Entry {
    program: Arc<Program>,
    last_used: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramCacheStats {
    pub hits: usize,
    pub misses: usize,
}

#[derive(Debug, Default)]
pub struct ProgramCache {
    entries: HashMap<String, Entry>,
    tick: u64,
    stats: ProgramCacheStats,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent program for a target, unmodified.
    pub fn get(&mut self, target: &str) -> Option<Arc<Program>> {
        self.tick += 1;
        match self.entries.get_mut(target) {
            Some(entry) => {
                entry.last_used = self.tick;
                self.stats.hits += 1;
                Some(Arc::clone(&entry.program))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store the newly built program for a target, replacing any
    /// previous entry.
    pub fn put(&mut self, target: &str, program: Arc<Program>) {
        self.tick += 1;
        self.entries.insert(
            target.to_string(),
            Entry { program, last_used: self.tick },
        );
    }

    /// Union of input files across all tracked programs. These back
    /// the entries most likely to be reused and are protected from
    /// file-cache eviction.
    pub fn tracked_files(&self) -> HashSet<PathBuf> {
        self.entries
            .values()
            .flat_map(|e| e.program.files().iter().cloned())
            .collect()
    }

    pub fn stats(&self) -> ProgramCacheStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = ProgramCacheStats::default();
    }

    /// Observability hook; no behavioral effect.
    pub fn trace_stats(&self) {
        debug(&format!(
            "[cache] programs tracked: {}, hits: {}, misses: {}",
            self.entries.len(),
            self.stats.hits,
            self.stats.misses
        ));
    }

    /// Observability hook; no behavioral effect.
    pub fn print_stats(&self) {
        self.trace_stats();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
