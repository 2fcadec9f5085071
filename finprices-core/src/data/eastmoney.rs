//! EastMoney fund net-worth provider.
//!
//! Serves fund symbols carrying the `.JJ` suffix. The upstream answers with a
//! JavaScript file, not JSON; the net-worth series is the array literal
//! assigned to `Data_netWorthTrend`, with millisecond epoch timestamps.

use super::http::Transport;
use super::provider::{DataError, FetchResult, NoDataReason, PriceProvider};
use crate::domain::{PriceRecord, TimeWindow};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

pub const EASTMONEY_BASE_URL: &str = "https://fund.eastmoney.com/pingzhongdata";

/// Market suffix marking a symbol as an EastMoney fund.
pub const FUND_SUFFIX: &str = ".JJ";

static NET_WORTH_TREND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"var Data_netWorthTrend = (.+?);").expect("net worth marker pattern")
});

/// One point of the net-worth trend array.
#[derive(Debug, Deserialize)]
struct NetWorthPoint {
    /// Epoch milliseconds.
    x: i64,
    /// Unit net worth; EastMoney occasionally emits `null`.
    y: Option<f64>,
}

/// EastMoney fund NAV provider.
pub struct EastMoneyProvider {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl EastMoneyProvider {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: EASTMONEY_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the script URL for a fund code, with a timestamp cache-buster.
    fn fund_url(&self, code: &str, window: &TimeWindow) -> String {
        let stamp = Utc::now().with_timezone(&window.offset()).format("%Y%m%d%H%M%S");
        format!("{}/{code}.js?v={stamp}", self.base_url)
    }

    /// Decode a pingzhongdata script body into price records.
    pub fn parse_body(
        &self,
        symbol: &str,
        body: &str,
        window: &TimeWindow,
    ) -> Result<FetchResult, DataError> {
        let Some(caps) = NET_WORTH_TREND.captures(body) else {
            return Ok(FetchResult::no_data(symbol, self.name(), NoDataReason::MarkerMissing));
        };

        let points: Vec<NetWorthPoint> = serde_json::from_str(&caps[1])
            .map_err(|e| DataError::malformed(self.name(), format!("net worth trend: {e}")))?;

        let mut records = Vec::with_capacity(points.len());
        let mut skipped = 0;
        for point in points {
            let secs = point.x / 1000;
            if !window.contains_timestamp(secs) {
                continue;
            }
            match (window.day_of(secs), point.y) {
                (Some(date), Some(price)) => records.push(PriceRecord::new(symbol, date, price)),
                _ => skipped += 1,
            }
        }

        Ok(FetchResult::new(symbol, self.name(), records, skipped))
    }
}

impl PriceProvider for EastMoneyProvider {
    fn name(&self) -> &str {
        "eastmoney"
    }

    fn matches(&self, symbol: &str) -> bool {
        symbol.ends_with(FUND_SUFFIX)
    }

    fn fetch_prices(&self, symbol: &str, window: &TimeWindow) -> Result<FetchResult, DataError> {
        let code = symbol.strip_suffix(FUND_SUFFIX).unwrap_or(symbol);
        let url = self.fund_url(code, window);

        let resp = self.transport.get(&url)?;
        if !resp.is_success() {
            return Err(DataError::HttpStatus {
                status: resp.status,
                url,
            });
        }

        self.parse_body(symbol, &resp.body, window)
    }
}
