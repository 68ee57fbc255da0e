//! Integration module for dataset builds.
//!
//! This module wires retrieval, caching and the dataset pipeline together
//! for the command-line interface.

pub(crate) mod cache_manager;
pub(crate) mod pipeline;
pub(crate) mod retrieval;
