#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod assemble;
pub mod builder;
pub mod clean;
pub mod config;
pub mod entity;
pub mod error;
pub mod json;
pub mod label;
pub mod matrix;

pub use align::{AlignmentIndex, AlignmentPolicy, DateAligner};
pub use assemble::IndicatorAssembler;
pub use builder::{BuildOutput, DatasetBuilder, DropReason, DroppedEntity, RetrievalFailure};
pub use clean::{CleanOutput, ColumnDropReason, DatasetCleaner, DroppedColumn};
pub use config::{DatasetConfig, IndicatorList, SparsityThresholds, Threshold};
pub use entity::{EntityDocumentSet, StatementFamily};
pub use error::{DatasetError, Result};
pub use label::{Label, label};
pub use matrix::{CleanedMatrix, Outcome, RawMatrix};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
