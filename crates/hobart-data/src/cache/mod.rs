//! Caching layer for retrieved data.

pub mod sqlite;

pub use sqlite::{CacheStats, SqliteCache};
