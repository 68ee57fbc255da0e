//! Yahoo Finance price data.

pub mod quotes;

pub use quotes::{PriceVariationProvider, price_variation};
