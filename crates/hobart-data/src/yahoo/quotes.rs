//! Price history and price variation from Yahoo Finance.

use crate::error::{DataError, Result};
use chrono::{NaiveDate, NaiveTime};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;
use yahoo_finance_api as yahoo;

const SECONDS_PER_DAY: i64 = 86_400;

/// Yahoo Finance price provider with rate limiting.
pub struct PriceVariationProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for PriceVariationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceVariationProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl PriceVariationProvider {
    /// Create a provider with the default delay of 250 ms after each request.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(250))
    }

    /// Create a provider with a custom delay after each request.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    /// Fetch daily quotes for `symbol` between `start` and `end`, inclusive.
    ///
    /// # Returns
    /// A Polars DataFrame with columns: symbol, date, close, adjusted_close
    pub async fn fetch_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end.and_time(NaiveTime::MIN).and_utc().timestamp() + SECONDS_PER_DAY;
        let start_time = time::OffsetDateTime::from_unix_timestamp(start_ts)
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(end_ts)
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await;

        // Applied whether or not the request succeeded.
        sleep(self.rate_limit_delay).await;

        let quotes = response?
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
                reason: "No quotes returned from Yahoo Finance".to_string(),
            });
        }
        debug!(symbol, quotes = quotes.len(), "fetched quotes");

        let timestamps: Vec<i64> = quotes.iter().map(|q| q.timestamp).collect();
        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        let adj_closes: Vec<f64> = quotes.iter().map(|q| q.adjclose).collect();

        let df = DataFrame::new(vec![
            Series::new("symbol".into(), vec![symbol; quotes.len()]).into(),
            Series::new("timestamp".into(), timestamps).into(),
            Series::new("close".into(), closes).into(),
            Series::new("adjusted_close".into(), adj_closes).into(),
        ])?;

        let df = df
            .lazy()
            .with_column(
                (col("timestamp") * lit(1_000_000_000))
                    .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                    .cast(DataType::Date)
                    .alias("date"),
            )
            .sort(["timestamp"], SortMultipleOptions::default())
            .select(&[
                col("symbol"),
                col("date"),
                col("close"),
                col("adjusted_close"),
            ])
            .collect()?;

        Ok(df)
    }

    /// Percentage change of the adjusted close of `symbol` over the range.
    pub async fn fetch_price_variation(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64> {
        let quotes = self.fetch_quotes(symbol, start, end).await?;
        price_variation(symbol, &quotes)
    }
}

/// Percentage change from the first to the last adjusted close in `quotes`,
/// which must be in chronological order.
///
/// `(last - first) / first * 100`. Null and non-finite closes are skipped.
///
/// # Errors
/// Returns `DataError::NoData` when there is no usable close or the first
/// close is not positive.
pub fn price_variation(symbol: &str, quotes: &DataFrame) -> Result<f64> {
    let column = quotes.column("adjusted_close")?;
    let closes = column.as_materialized_series().f64()?;
    let mut usable = closes.into_iter().flatten().filter(|c| c.is_finite());

    let no_data = |reason: &str| DataError::NoData {
        symbol: symbol.to_string(),
        reason: reason.to_string(),
    };

    let first = usable.next().ok_or_else(|| no_data("no adjusted close"))?;
    let last = usable.last().unwrap_or(first);
    if first <= 0.0 {
        return Err(no_data("non-positive first adjusted close"));
    }

    Ok((last - first) / first * 100.0)
}
