//! Concurrent retrieval of statement documents and price variations.
//!
//! Requests run with bounded concurrency but results come back in symbol
//! order, so row order in the dataset follows the universe. The SQLite cache
//! is consulted first unless a refresh is forced.

use super::cache_manager::SharedCache;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use hobart_data::cache::SqliteCache;
use hobart_data::{FmpClient, PriceVariationProvider};
use hobart_dataset::{EntityDocumentSet, RetrievalFailure};
use indicatif::ProgressBar;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Default number of concurrent entity fetches.
pub(crate) const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for data fetching.
#[derive(Debug, Clone)]
pub(crate) struct FetchConfig {
    /// Whether to use the cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cached entries, still store new ones).
    pub force_refresh: bool,
    /// Entities fetched at once.
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl FetchConfig {
    const fn in_flight(&self) -> usize {
        if self.concurrency == 0 { 1 } else { self.concurrency }
    }
}

/// Run `f` against the cache. A poisoned lock skips the cache.
fn with_cache<T>(cache: &SharedCache, f: impl FnOnce(&SqliteCache) -> T) -> Option<T> {
    match cache.lock() {
        Ok(guard) => Some(f(&guard)),
        Err(e) => {
            warn!(error = %e, "cache lock poisoned, skipping cache");
            None
        }
    }
}

/// Cached document set for `symbol`, unless refreshing or absent.
pub(crate) fn cached_document_set(
    cache: &SharedCache,
    symbol: &str,
    config: &FetchConfig,
) -> Option<EntityDocumentSet> {
    if config.force_refresh {
        return None;
    }
    match with_cache(cache, |c| c.get_document_set(symbol))? {
        Ok(set) => set,
        Err(e) => {
            warn!(symbol, error = %e, "failed to read cached statements");
            None
        }
    }
}

/// Cached price variation for `symbol`, unless refreshing or absent.
pub(crate) fn cached_price_variation(
    cache: &SharedCache,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    config: &FetchConfig,
) -> Option<f64> {
    if config.force_refresh {
        return None;
    }
    with_cache(cache, |c| c.get_price_variation(symbol, start, end))?
        .ok()
        .flatten()
}

/// Retrieve the statement documents of every symbol, in symbol order.
///
/// A symbol whose documents cannot be retrieved yields a
/// [`RetrievalFailure`] instead of stopping the batch.
pub(crate) async fn fetch_document_sets(
    client: &FmpClient,
    symbols: &[String],
    cache: Option<&SharedCache>,
    config: &FetchConfig,
    progress: Option<&ProgressBar>,
) -> Vec<Result<EntityDocumentSet, RetrievalFailure>> {
    stream::iter(symbols.iter().cloned())
        .map(|symbol| async move {
            if let Some(set) = cache.and_then(|c| cached_document_set(c, &symbol, config)) {
                debug!(symbol = %symbol, "statements served from cache");
                return Ok(set);
            }

            match client.fetch_document_set(&symbol).await {
                Ok(set) => {
                    let stored = cache.and_then(|c| with_cache(c, |c| c.put_document_set(&set)));
                    if let Some(Err(e)) = stored {
                        warn!(symbol = %symbol, error = %e, "failed to cache statements");
                    }
                    Ok(set)
                }
                Err(e) => Err(RetrievalFailure::new(symbol, e)),
            }
        })
        .buffered(config.in_flight())
        .inspect(|_| {
            if let Some(pb) = progress {
                pb.inc(1);
            }
        })
        .collect()
        .await
}

/// Price variation over `[start, end]` for every symbol that has one.
///
/// Symbols without usable quotes are logged and left out of the map.
pub(crate) async fn fetch_price_variations(
    provider: &PriceVariationProvider,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    cache: Option<&SharedCache>,
    config: &FetchConfig,
    progress: Option<&ProgressBar>,
) -> HashMap<String, f64> {
    let results: Vec<(String, Option<f64>)> = stream::iter(symbols.iter().cloned())
        .map(|symbol| async move {
            if let Some(value) =
                cache.and_then(|c| cached_price_variation(c, &symbol, start, end, config))
            {
                return (symbol, Some(value));
            }

            match provider.fetch_price_variation(&symbol, start, end).await {
                Ok(value) => {
                    let stored = cache.and_then(|c| {
                        with_cache(c, |c| c.put_price_variation(&symbol, start, end, value))
                    });
                    if let Some(Err(e)) = stored {
                        warn!(symbol = %symbol, error = %e, "failed to cache price variation");
                    }
                    (symbol, Some(value))
                }
                Err(e) => {
                    let report = || warn!(symbol = %symbol, error = %e, "no price variation");
                    match progress {
                        Some(pb) => pb.suspend(report),
                        None => report(),
                    }
                    (symbol, None)
                }
            }
        })
        .buffered(config.in_flight())
        .inspect(|_| {
            if let Some(pb) = progress {
                pb.inc(1);
            }
        })
        .collect()
        .await;

    results
        .into_iter()
        .filter_map(|(symbol, value)| value.map(|v| (symbol, v)))
        .collect()
}
