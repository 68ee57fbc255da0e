//! Financial Modeling Prep statement retrieval.
//!
//! Each entity is described by six annual statement documents, fetched from
//! the v3 API and kept as untyped JSON so that schema changes upstream never
//! break retrieval.
//!
//! # Example
//!
//! ```no_run
//! use hobart_data::fmp::{FmpClient, FmpConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FmpClient::new(FmpConfig::new("demo"))?;
//!     let documents = client.fetch_document_set("AAPL").await?;
//!     println!("{} dates", documents.extract("date").len());
//!     Ok(())
//! }
//! ```

pub mod client;

pub use client::{FMP_BASE_URL, FmpClient, FmpConfig, check_error_payload, endpoint, parse_body};
