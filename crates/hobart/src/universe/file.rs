//! Universe read from a plain symbol list.
//!
//! One symbol per line. Blank lines and `#` comments are ignored, symbols
//! are upper-cased and repeated symbols keep their first position.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors loading a universe.
#[derive(Debug, Error)]
pub enum UniverseError {
    /// The symbol list could not be read.
    #[error("Failed to read universe {path}: {source}")]
    Io {
        /// Path of the symbol list.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The symbol list contains no symbols.
    #[error("Universe {0} contains no symbols")]
    Empty(PathBuf),
}

/// Ordered list of symbols loaded from text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUniverse {
    symbols: Vec<String>,
}

impl FileUniverse {
    /// Parse a symbol list.
    pub fn parse(text: &str) -> Self {
        let mut seen = HashSet::new();
        let symbols = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|symbol| !symbol.is_empty())
            .map(str::to_ascii_uppercase)
            .filter(|symbol| seen.insert(symbol.clone()))
            .collect();

        Self { symbols }
    }

    /// Build a universe from symbols already in hand.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text: Vec<String> = symbols.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse(&text.join("\n"))
    }

    /// Load a symbol list from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`UniverseError::Io`] if the file cannot be read and
    /// [`UniverseError::Empty`] if it names no symbol.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, UniverseError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| UniverseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let universe = Self::parse(&text);
        if universe.symbols.is_empty() {
            return Err(UniverseError::Empty(path.to_path_buf()));
        }
        debug!(path = %path.display(), symbols = universe.symbols.len(), "loaded universe");

        Ok(universe)
    }

    /// Symbols in file order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the universe is empty.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
