//! Cache manager for retrieved statements and price variations.
//!
//! Opens the SQLite cache at a platform-specific default location.

use hobart_data::cache::SqliteCache;
use hobart_data::error::DataError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Cache shared between concurrent retrieval tasks.
pub(crate) type SharedCache = Arc<Mutex<SqliteCache>>;

/// Get the default cache directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/hobart/`
/// - macOS: `~/Library/Caches/hobart/`
/// - Windows: `%LOCALAPPDATA%\hobart\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hobart")
}

/// Get the cache database path.
pub(crate) fn get_cache_path() -> PathBuf {
    default_cache_dir().join("hobart.db")
}

/// Open the cache, creating the directory if needed.
pub(crate) fn open_cache() -> Result<SqliteCache, DataError> {
    let cache_path = get_cache_path();

    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    SqliteCache::new(&cache_path)
}

/// Open the cache for a build, or run without one if it cannot be opened.
pub(crate) fn open_shared_cache(use_cache: bool) -> Option<SharedCache> {
    if !use_cache {
        return None;
    }

    match open_cache() {
        Ok(cache) => Some(Arc::new(Mutex::new(cache))),
        Err(e) => {
            warn!(
                path = %get_cache_path().display(),
                error = %e,
                "cache unavailable, continuing without it"
            );
            None
        }
    }
}
