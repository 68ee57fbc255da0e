//! Error types for dataset assembly.

use thiserror::Error;

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Errors that can occur while assembling or cleaning a dataset.
///
/// Per-entity problems (failed retrieval, no filing for the fiscal year,
/// absent indicators) are not errors; they surface as dropped entities or
/// missing cells. These variants cover configuration and structural misuse.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Row length does not match the indicator count
    #[error("Row for {entity} has {actual} values, expected {expected}")]
    RowLength {
        /// Entity the row belongs to
        entity: String,
        /// Number of indicator columns
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// Entity already present in the matrix
    #[error("Duplicate entity: {0}")]
    DuplicateEntity(String),

    /// No outcome available for a retained entity
    #[error("No price variation for {0}")]
    MissingOutcome(String),

    /// Matrix shape error
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
