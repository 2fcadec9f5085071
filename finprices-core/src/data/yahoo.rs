//! Yahoo Finance historical-download provider.
//!
//! Fetches daily history from Yahoo's v7 CSV download endpoint for Shanghai and
//! Shenzhen listings. Yahoo codes Shanghai as `.SS`, while the symbols users
//! write often say `.SH`, so `.SH` is remapped before the request.
//!
//! Yahoo has no official API and is subject to unannounced format changes:
//! columns are located by header name, and rows that fail to decode are
//! skipped and counted rather than failing the fetch.

use super::http::Transport;
use super::provider::{DataError, FetchResult, NoDataReason, PriceProvider};
use crate::domain::{PriceRecord, TimeWindow};
use chrono::NaiveDate;
use std::sync::Arc;

pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/download";

/// Suffixes this provider claims.
const MARKET_SUFFIXES: [&str; 3] = [".SS", ".SH", ".SZ"];

/// `(user suffix, Yahoo suffix)` remaps applied before building the URL.
const SUFFIX_ALIASES: [(&str, &str); 1] = [(".SH", ".SS")];

const DATE_COLUMN: &str = "Date";
const CLOSE_COLUMN: &str = "Close";

/// Yahoo Finance CSV history provider.
pub struct YahooProvider {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl YahooProvider {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: YAHOO_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Map a user symbol to Yahoo's exchange coding.
    pub fn upstream_code(symbol: &str) -> String {
        for (alias, canonical) in SUFFIX_ALIASES {
            if let Some(stem) = symbol.strip_suffix(alias) {
                return format!("{stem}{canonical}");
            }
        }
        symbol.to_string()
    }

    /// Build the download URL for a symbol and window.
    fn download_url(&self, symbol: &str, window: &TimeWindow) -> String {
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history&includeAdjustedClose=true",
            self.base_url,
            Self::upstream_code(symbol),
            window.period1(),
            window.period2(),
        )
    }

    /// Decode a history CSV body into price records.
    pub fn parse_csv(
        &self,
        symbol: &str,
        body: &str,
        window: &TimeWindow,
    ) -> Result<FetchResult, DataError> {
        if body.trim().is_empty() {
            return Ok(FetchResult::no_data(symbol, self.name(), NoDataReason::EmptyBody));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| DataError::malformed(self.name(), format!("CSV header: {e}")))?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h == name);
        let (Some(date_idx), Some(close_idx)) = (column(DATE_COLUMN), column(CLOSE_COLUMN)) else {
            return Ok(FetchResult::no_data(symbol, self.name(), NoDataReason::MissingColumns));
        };

        let mut records = Vec::new();
        let mut skipped = 0;
        for row in reader.records() {
            let parsed = row.ok().and_then(|row| {
                let date = NaiveDate::parse_from_str(row.get(date_idx)?, "%Y-%m-%d").ok()?;
                let price = row.get(close_idx)?.parse::<f64>().ok().filter(|p| p.is_finite())?;
                Some((date, price))
            });
            match parsed {
                Some((date, price)) if window.contains_date(date) => {
                    records.push(PriceRecord::new(symbol, date, price));
                }
                Some(_) => {}
                None => skipped += 1,
            }
        }

        Ok(FetchResult::new(symbol, self.name(), records, skipped))
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn matches(&self, symbol: &str) -> bool {
        MARKET_SUFFIXES.iter().any(|suffix| symbol.ends_with(suffix))
    }

    fn fetch_prices(&self, symbol: &str, window: &TimeWindow) -> Result<FetchResult, DataError> {
        let url = self.download_url(symbol, window);

        let resp = self.transport.get(&url)?;
        if !resp.is_success() {
            return Err(DataError::HttpStatus {
                status: resp.status,
                url,
            });
        }

        self.parse_csv(symbol, &resp.body, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::http::HttpResponse;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::Mutex;

    struct Canned {
        response: HttpResponse,
        urls: Mutex<Vec<String>>,
    }

    impl Transport for Canned {
        fn get(&self, url: &str) -> Result<HttpResponse, DataError> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(self.response.clone())
        }
    }

    fn canned(status: u16, body: &str) -> Arc<Canned> {
        Arc::new(Canned {
            response: HttpResponse {
                status,
                body: body.to_string(),
            },
            urls: Mutex::new(Vec::new()),
        })
    }

    fn window_2022() -> TimeWindow {
        let cst = FixedOffset::east_opt(8 * 3600).unwrap();
        TimeWindow::new(
            cst.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
            cst.with_ymd_and_hms(2022, 12, 31, 23, 59, 59).unwrap(),
        )
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const HISTORY: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2022-01-04,10.00,10.50,9.90,10.20,10.20,1000
2022-01-05,10.20,10.80,10.10,10.75,10.75,1200
";

    #[test]
    fn matches_exchange_suffixes() {
        let transport = canned(200, "");
        let p = YahooProvider::new(transport.clone());
        assert!(p.matches("600000.SS"));
        assert!(p.matches("600000.SH"));
        assert!(p.matches("000001.SZ"));
        assert!(!p.matches("000001.JJ"));
        assert!(!p.matches("AAPL"));
        assert!(transport.urls.lock().unwrap().is_empty());
    }

    #[test]
    fn sh_suffix_is_remapped_to_ss() {
        assert_eq!(YahooProvider::upstream_code("600000.SH"), "600000.SS");
        assert_eq!(YahooProvider::upstream_code("600000.SS"), "600000.SS");
        assert_eq!(YahooProvider::upstream_code("000001.SZ"), "000001.SZ");
    }

    #[test]
    fn url_carries_history_parameters() {
        let transport = canned(200, HISTORY);
        let p = YahooProvider::new(transport.clone()).with_base_url("http://yahoo.test");
        let w = window_2022();
        p.fetch_prices("600000.SH", &w).unwrap();

        let urls = transport.urls.lock().unwrap();
        let url = &urls[0];
        assert!(url.starts_with("http://yahoo.test/600000.SS?"));
        assert!(url.contains(&format!("period1={}", w.period1())));
        assert!(url.contains(&format!("period2={}", w.period2())));
        assert!(url.contains("interval=1d"));
        assert!(url.contains("events=history"));
    }

    #[test]
    fn parses_close_column_and_keeps_request_symbol() {
        let p = YahooProvider::new(canned(200, HISTORY));
        let result = p.fetch_prices("600000.SH", &window_2022()).unwrap();

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].symbol, "600000.SH");
        assert_eq!(result.records[0].date, d(2022, 1, 4));
        assert_eq!(result.records[1].price, 10.75);
    }

    #[test]
    fn reordered_columns_are_found_by_name() {
        let body = "Close,Volume,Date\n10.20,1000,2022-01-04\n";
        let p = YahooProvider::new(canned(200, body));
        let result = p.fetch_prices("000001.SZ", &window_2022()).unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].date, d(2022, 1, 4));
        assert_eq!(result.records[0].price, 10.20);
    }

    #[test]
    fn bad_rows_are_skipped_without_aborting() {
        let body = "\
Date,Close
2022-01-04,null
2022-01-05, 11.00
not-a-date,12.00
2022-01-07
2022-01-10,NaN
2022-01-11,13.50
";
        let p = YahooProvider::new(canned(200, body));
        let result = p.fetch_prices("000001.SZ", &window_2022()).unwrap();

        let prices: Vec<f64> = result.records.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![11.00, 13.50]);
        assert_eq!(result.skipped_rows, 4);
    }

    #[test]
    fn rows_outside_window_are_dropped_not_skipped() {
        let body = "Date,Close\n2021-12-31,9.00\n2022-01-04,10.00\n2023-01-03,11.00\n";
        let p = YahooProvider::new(canned(200, body));
        let result = p.fetch_prices("000001.SZ", &window_2022()).unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.skipped_rows, 0);
    }

    #[test]
    fn missing_columns_is_no_data() {
        let p = YahooProvider::new(canned(200, "Timestamp,Price\n2022-01-04,1.0\n"));
        let result = p.fetch_prices("000001.SZ", &window_2022()).unwrap();
        assert_eq!(result.no_data, Some(NoDataReason::MissingColumns));
    }

    #[test]
    fn empty_body_is_no_data() {
        let p = YahooProvider::new(canned(200, "\n"));
        let result = p.fetch_prices("000001.SZ", &window_2022()).unwrap();
        assert_eq!(result.no_data, Some(NoDataReason::EmptyBody));
    }

    #[test]
    fn unknown_symbol_status_is_an_error() {
        let p = YahooProvider::new(canned(404, "404 Not Found: No data found, symbol may be delisted"));
        let err = p.fetch_prices("999999.SZ", &window_2022()).unwrap_err();
        assert!(matches!(err, DataError::HttpStatus { status: 404, .. }));
    }
}
