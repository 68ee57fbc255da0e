//! Universe management.
//!
//! A universe is the ordered list of symbols a dataset is built over. Row
//! order in the dataset follows universe order.

pub mod file;

pub use file::{FileUniverse, UniverseError};

/// Trait for symbol universes.
pub trait Universe {
    /// Get all symbols in the universe, in scan order.
    fn symbols(&self) -> Vec<String>;

    /// Check if a symbol is in the universe.
    fn contains(&self, symbol: &str) -> bool {
        self.symbols().iter().any(|s| s == symbol)
    }

    /// Get the number of symbols.
    fn size(&self) -> usize {
        self.symbols().len()
    }
}

impl Universe for FileUniverse {
    fn symbols(&self) -> Vec<String> {
        FileUniverse::symbols(self).to_vec()
    }
}
