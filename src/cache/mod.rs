//! Process-lifetime caches shared across build requests.

pub mod file_cache;
pub mod program_cache;

pub use file_cache::{FileCache, FileCacheStats};
pub use program_cache::{ProgramCache, ProgramCacheStats};
