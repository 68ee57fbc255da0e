//! Financial Modeling Prep statements client with rate limiting.

use crate::error::{DataError, Result};
use hobart_dataset::{EntityDocumentSet, StatementFamily};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// FMP v3 API base URL
pub const FMP_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Default rate limit: one request every 300 ms
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(300);

/// Default number of annual records requested per statement
const DEFAULT_LIMIT: usize = 10;

/// Key of the error object the API returns instead of data
const ERROR_MESSAGE_KEY: &str = "Error Message";

const USER_AGENT: &str = "Hobart/0.1";

/// Connection settings for [`FmpClient`].
#[derive(Clone)]
pub struct FmpConfig {
    /// API key sent as the `apikey` query parameter
    pub api_key: String,
    /// Base URL, overridable for tests and mirrors
    pub base_url: String,
    /// Number of annual records per statement
    pub limit: usize,
    /// Minimum duration between requests
    pub min_interval: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl FmpConfig {
    /// Default settings for `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: FMP_BASE_URL.to_string(),
            limit: DEFAULT_LIMIT,
            min_interval: DEFAULT_RATE_LIMIT,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the number of annual records requested per statement.
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the minimum duration between requests.
    pub const fn with_rate_limit(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }
}

impl std::fmt::Debug for FmpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FmpConfig")
            .field("base_url", &self.base_url)
            .field("limit", &self.limit)
            .field("min_interval", &self.min_interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Rate limiter shared by all requests of a client
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// Path segment of the endpoint serving `family`.
pub const fn endpoint(family: StatementFamily) -> &'static str {
    match family {
        StatementFamily::Income => "income-statement",
        StatementFamily::BalanceSheet => "balance-sheet-statement",
        StatementFamily::CashFlow => "cash-flow-statement",
        StatementFamily::Ratios => "ratios",
        StatementFamily::KeyMetrics => "key-metrics",
        StatementFamily::Growth => "financial-growth",
    }
}

/// Reject symbols that would break the request path.
pub fn validate_symbol(symbol: &str) -> Result<()> {
    if symbol.is_empty() {
        return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
    {
        return Err(DataError::InvalidSymbol(symbol.to_string()));
    }
    Ok(())
}

/// Turn an API error object into an error, pass anything else through.
///
/// The API answers some failures (unknown key, exhausted quota) with HTTP 200
/// and a body of the form `{"Error Message": "..."}`.
pub fn check_error_payload(body: Value) -> Result<Value> {
    match body.get(ERROR_MESSAGE_KEY) {
        Some(message) => Err(DataError::Api(
            message
                .as_str()
                .map_or_else(|| message.to_string(), str::to_string),
        )),
        None => Ok(body),
    }
}

/// Parse a response body and reject API error objects.
///
/// # Errors
/// Returns `DataError::Parse` when the body is not JSON, for example an HTML
/// maintenance page, and `DataError::Api` for an error object.
pub fn parse_body(text: &str) -> Result<Value> {
    let body: Value = serde_json::from_str(text)
        .map_err(|e| DataError::Parse(format!("response is not JSON: {e}")))?;
    check_error_payload(body)
}

/// Statements client for the six annual statement families.
pub struct FmpClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    config: FmpConfig,
}

impl FmpClient {
    /// Create a client.
    ///
    /// # Errors
    /// Returns `DataError::MissingApiKey` for a blank key.
    pub fn new(config: FmpConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(DataError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(config.min_interval))),
            config,
        })
    }

    /// Settings in use.
    pub const fn config(&self) -> &FmpConfig {
        &self.config
    }

    /// Request URL for one statement family of `symbol`.
    pub fn family_url(&self, symbol: &str, family: StatementFamily) -> String {
        format!(
            "{}/{}/{}?period=annual&limit={}&apikey={}",
            self.config.base_url.trim_end_matches('/'),
            endpoint(family),
            symbol,
            self.config.limit,
            self.config.api_key
        )
    }

    /// GET `url` and parse the body as JSON.
    ///
    /// # Errors
    /// Non-success statuses, unparseable bodies and API error objects are all
    /// errors.
    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        self.rate_limiter.lock().await.wait().await;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                url: strip_query(url).to_string(),
            });
        }

        let text = response.text().await?;
        parse_body(&text)
    }

    /// Fetch one statement family of `symbol`.
    pub async fn fetch_family(&self, symbol: &str, family: StatementFamily) -> Result<Value> {
        validate_symbol(symbol)?;
        debug!(symbol, %family, "fetching statement");
        self.fetch_json(&self.family_url(symbol, family)).await
    }

    /// Fetch all six statement families of `symbol`, in family order.
    ///
    /// Fails on the first family that cannot be retrieved.
    pub async fn fetch_document_set(&self, symbol: &str) -> Result<EntityDocumentSet> {
        let mut documents = EntityDocumentSet::new(symbol);
        for family in StatementFamily::ALL {
            let document = self.fetch_family(symbol, family).await?;
            documents.set_document(family, document);
        }
        Ok(documents)
    }
}

impl std::fmt::Debug for FmpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FmpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}
