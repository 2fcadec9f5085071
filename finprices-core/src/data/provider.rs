//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over upstream price sources (EastMoney
//! fund NAVs, Yahoo Finance history) so the aggregator can route symbols to
//! them without knowing their wire formats, and tests can swap in canned
//! transports.

use crate::domain::{PeriodError, PriceRecord, TimePeriod, TimeWindow};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for price fetching.
///
/// "No data" is not an error: a provider that recognizes nothing in the
/// upstream response returns an empty [`FetchResult`] with a
/// [`NoDataReason`] instead.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("upstream returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("malformed payload from {provider}: {detail}")]
    MalformedPayload { provider: String, detail: String },

    #[error("invalid time period: {0}")]
    InvalidPeriod(#[from] PeriodError),
}

/// Coarse classification of a [`DataError`], for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Connection, DNS, or timeout failure.
    Transport,
    /// Upstream answered with a non-2xx status.
    UpstreamStatus,
    /// Upstream answered 2xx but the body could not be decoded.
    MalformedPayload,
    /// Caller supplied something unusable.
    InvalidInput,
}

impl DataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Transport,
            Self::HttpStatus { .. } => ErrorKind::UpstreamStatus,
            Self::MalformedPayload { .. } => ErrorKind::MalformedPayload,
            Self::InvalidPeriod(_) => ErrorKind::InvalidInput,
        }
    }

    pub(crate) fn malformed(provider: &str, detail: impl Into<String>) -> Self {
        Self::MalformedPayload {
            provider: provider.to_string(),
            detail: detail.into(),
        }
    }
}

/// Parse a period token and resolve it against `now`.
pub fn resolve_window(token: &str, now: DateTime<FixedOffset>) -> Result<TimeWindow, DataError> {
    let period = TimePeriod::parse(token)?;
    Ok(period.resolve(now)?)
}

/// Why a provider produced no records for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoDataReason {
    /// The script marker carrying the data was absent.
    MarkerMissing,
    /// The tabular response lacked the expected named columns.
    MissingColumns,
    /// The response body was empty.
    EmptyBody,
}

/// Result of a successful fetch for a single symbol from a single provider.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub provider: String,
    pub records: Vec<PriceRecord>,
    /// Rows dropped because their date or price failed to decode.
    pub skipped_rows: usize,
    pub no_data: Option<NoDataReason>,
}

impl FetchResult {
    pub fn new(symbol: &str, provider: &str, records: Vec<PriceRecord>, skipped_rows: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            provider: provider.to_string(),
            records,
            skipped_rows,
            no_data: None,
        }
    }

    pub fn no_data(symbol: &str, provider: &str, reason: NoDataReason) -> Self {
        Self {
            no_data: Some(reason),
            ..Self::new(symbol, provider, Vec::new(), 0)
        }
    }
}

/// Trait for price providers (EastMoney, Yahoo Finance, ...).
///
/// Providers hold no mutable state. `matches` must be a cheap string test
/// with no I/O; `fetch_prices` issues exactly one request for the whole
/// window and never retries.
pub trait PriceProvider: Send + Sync {
    /// Registry name of this provider.
    fn name(&self) -> &str;

    /// Whether this provider can serve `symbol`.
    fn matches(&self, symbol: &str) -> bool;

    /// Fetch daily closing prices for `symbol`, restricted to `window`.
    fn fetch_prices(&self, symbol: &str, window: &TimeWindow) -> Result<FetchResult, DataError>;
}

/// Observability hook for multi-symbol fetches.
pub trait FetchProgress: Send + Sync {
    /// Called before a provider is asked for a symbol.
    fn on_start(&self, symbol: &str, provider: &str);

    /// Called when a provider fetch finishes, successfully or not.
    fn on_complete(&self, symbol: &str, provider: &str, result: &Result<FetchResult, DataError>);

    /// Called when no registered provider claims a symbol.
    fn on_unmatched(&self, symbol: &str);

    /// Called once the whole batch is done.
    fn on_batch_complete(&self, records: usize, skipped_rows: usize, fetches: usize);
}

/// Progress reporter that emits `tracing` events.
pub struct TracingProgress;

impl FetchProgress for TracingProgress {
    fn on_start(&self, symbol: &str, provider: &str) {
        tracing::debug!(symbol, provider, "fetching prices");
    }

    fn on_complete(&self, symbol: &str, provider: &str, result: &Result<FetchResult, DataError>) {
        match result {
            Ok(fetched) => {
                if fetched.skipped_rows > 0 {
                    tracing::warn!(
                        symbol,
                        provider,
                        skipped = fetched.skipped_rows,
                        "skipped rows with unparseable date or price"
                    );
                }
                if let Some(reason) = fetched.no_data {
                    tracing::warn!(symbol, provider, ?reason, "no data in upstream response");
                } else {
                    tracing::info!(symbol, provider, records = fetched.records.len(), "fetched");
                }
            }
            Err(e) => tracing::error!(symbol, provider, kind = ?e.kind(), "fetch failed: {e}"),
        }
    }

    fn on_unmatched(&self, symbol: &str) {
        tracing::warn!(symbol, "no provider matches symbol");
    }

    fn on_batch_complete(&self, records: usize, skipped_rows: usize, fetches: usize) {
        tracing::info!(records, skipped_rows, fetches, "price collection complete");
    }
}

/// Progress reporter that reports nothing.
pub struct NoProgress;

impl FetchProgress for NoProgress {
    fn on_start(&self, _symbol: &str, _provider: &str) {}

    fn on_complete(&self, _symbol: &str, _provider: &str, _result: &Result<FetchResult, DataError>) {}

    fn on_unmatched(&self, _symbol: &str) {}

    fn on_batch_complete(&self, _records: usize, _skipped_rows: usize, _fetches: usize) {}
}
