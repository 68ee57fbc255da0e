#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod universe;

// Re-export main types from sub-crates
pub use hobart_data as data;
pub use hobart_dataset as dataset;
pub use hobart_output as output;

// Re-export common universe types
pub use universe::{FileUniverse, Universe, UniverseError};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
