#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod fmp;
pub mod yahoo;

pub use cache::{CacheStats, SqliteCache};
pub use error::{DataError, Result};
pub use fmp::{FmpClient, FmpConfig};
pub use yahoo::PriceVariationProvider;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
