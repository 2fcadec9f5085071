//! Time period tokens and the resolved `[from, to]` request window.
//!
//! A period token (`1D`, `3M`, `YTD`, `2021-10-10-2022-10-10`, ...) is parsed
//! into a [`TimePeriod`], then resolved against an explicit `now` into a
//! [`TimeWindow`]. Passing `now` in keeps resolution deterministic: `to` is
//! fixed at invocation time and tests can pin it.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

static RANGE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})-(\d{4}-\d{2}-\d{2})$").expect("range token pattern")
});

/// Errors from parsing or resolving a period token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("invalid date '{value}' in period range (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error("period range starts after it ends: {start} > {end}")]
    ReversedRange { start: NaiveDate, end: NaiveDate },

    #[error("period '{0}' falls outside the representable calendar")]
    OutOfRange(String),
}

/// A human-readable period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    OneDay,
    FiveDays,
    ThreeMonths,
    SixMonths,
    YearToDate,
    OneYear,
    FiveYears,
    /// Explicit inclusive day range.
    Range { start: NaiveDate, end: NaiveDate },
    /// Unrecognized token: everything from the epoch up to now.
    All,
}

impl TimePeriod {
    /// Parse a period token.
    ///
    /// Named tokens are case-insensitive. A token shaped like
    /// `YYYY-MM-DD-YYYY-MM-DD` must hold two real dates in order, otherwise
    /// it is an error. Any other token means "from the beginning".
    pub fn parse(token: &str) -> Result<Self, PeriodError> {
        let token = token.trim();
        let period = match token.to_ascii_uppercase().as_str() {
            "1D" => Self::OneDay,
            "5D" => Self::FiveDays,
            "3M" => Self::ThreeMonths,
            "6M" => Self::SixMonths,
            "YTD" => Self::YearToDate,
            "1Y" => Self::OneYear,
            "5Y" => Self::FiveYears,
            _ => match RANGE_TOKEN.captures(token) {
                Some(caps) => {
                    let start = parse_day(&caps[1])?;
                    let end = parse_day(&caps[2])?;
                    if start > end {
                        return Err(PeriodError::ReversedRange { start, end });
                    }
                    Self::Range { start, end }
                }
                None => {
                    tracing::warn!(token, "unrecognized time period, fetching from the beginning");
                    Self::All
                }
            },
        };
        Ok(period)
    }

    /// Resolve into a concrete window ending at `now` (or at the range end).
    pub fn resolve(self, now: DateTime<FixedOffset>) -> Result<TimeWindow, PeriodError> {
        let offset = *now.offset();
        let out_of_range = || PeriodError::OutOfRange(self.to_string());

        let from = match self {
            Self::OneDay => now.checked_sub_signed(Duration::days(1)),
            Self::FiveDays => now.checked_sub_signed(Duration::days(5)),
            Self::ThreeMonths => now.checked_sub_months(Months::new(3)),
            Self::SixMonths => now.checked_sub_months(Months::new(6)),
            Self::OneYear => now.checked_sub_months(Months::new(12)),
            Self::FiveYears => now.checked_sub_months(Months::new(60)),
            Self::YearToDate => NaiveDate::from_ymd_opt(now.year(), 1, 1)
                .and_then(|d| start_of_day(d, offset)),
            Self::All => Some(DateTime::<Utc>::default().with_timezone(&offset)),
            Self::Range { start, end } => {
                let from = start_of_day(start, offset).ok_or_else(out_of_range)?;
                let to = end
                    .and_hms_opt(23, 59, 59)
                    .and_then(|dt| offset.from_local_datetime(&dt).single())
                    .ok_or_else(out_of_range)?;
                return Ok(TimeWindow::new(from, to));
            }
        }
        .ok_or_else(out_of_range)?;

        Ok(TimeWindow::new(from, now))
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneDay => f.write_str("1D"),
            Self::FiveDays => f.write_str("5D"),
            Self::ThreeMonths => f.write_str("3M"),
            Self::SixMonths => f.write_str("6M"),
            Self::YearToDate => f.write_str("YTD"),
            Self::OneYear => f.write_str("1Y"),
            Self::FiveYears => f.write_str("5Y"),
            Self::Range { start, end } => write!(f, "{start}-{end}"),
            Self::All => f.write_str("ALL"),
        }
    }
}

/// Inclusive `[from, to]` window a fetch is restricted to.
///
/// Both ends carry the market offset; day truncation of upstream timestamps
/// happens in that offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    from: DateTime<FixedOffset>,
    to: DateTime<FixedOffset>,
}

impl TimeWindow {
    pub fn new(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> DateTime<FixedOffset> {
        self.from
    }

    pub fn to(&self) -> DateTime<FixedOffset> {
        self.to
    }

    pub fn offset(&self) -> FixedOffset {
        *self.to.offset()
    }

    /// Lower bound as unix seconds (`period1` upstream).
    pub fn period1(&self) -> i64 {
        self.from.timestamp()
    }

    /// Upper bound as unix seconds (`period2` upstream).
    pub fn period2(&self) -> i64 {
        self.to.timestamp()
    }

    /// Second-granularity containment, both ends inclusive.
    pub fn contains_timestamp(&self, secs: i64) -> bool {
        self.period1() <= secs && secs <= self.period2()
    }

    /// Day-granularity containment in the market offset, both ends inclusive.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.from.date_naive() <= date && date <= self.to.date_naive()
    }

    /// Calendar day of a unix timestamp in the market offset.
    pub fn day_of(&self, secs: i64) -> Option<NaiveDate> {
        DateTime::from_timestamp(secs, 0).map(|dt| dt.with_timezone(&self.offset()).date_naive())
    }
}

fn parse_day(value: &str) -> Result<NaiveDate, PeriodError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| PeriodError::InvalidDate {
        value: value.to_string(),
    })
}

fn start_of_day(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|dt| offset.from_local_datetime(&dt).single())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cst() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        cst().with_ymd_and_hms(y, m, d, h, 30, 0).unwrap()
    }

    #[test]
    fn named_tokens_are_case_insensitive() {
        assert_eq!(TimePeriod::parse("1d").unwrap(), TimePeriod::OneDay);
        assert_eq!(TimePeriod::parse("ytd").unwrap(), TimePeriod::YearToDate);
        assert_eq!(TimePeriod::parse(" 5Y ").unwrap(), TimePeriod::FiveYears);
    }

    #[test]
    fn one_year_is_one_calendar_year_back() {
        let now = at(2024, 2, 29, 15);
        let window = TimePeriod::OneYear.resolve(now).unwrap();
        assert_eq!(window.to(), now);
        assert_eq!(window.from(), at(2023, 2, 28, 15));
    }

    #[test]
    fn three_months_uses_calendar_months() {
        let now = at(2024, 5, 31, 10);
        let window = TimePeriod::ThreeMonths.resolve(now).unwrap();
        assert_eq!(window.from(), at(2024, 2, 29, 10));
    }

    #[test]
    fn five_days_subtracts_whole_days() {
        let now = at(2024, 3, 3, 9);
        let window = TimePeriod::FiveDays.resolve(now).unwrap();
        assert_eq!(window.from(), at(2024, 2, 27, 9));
    }

    #[test]
    fn ytd_starts_on_january_first() {
        let now = at(2024, 7, 14, 12);
        let window = TimePeriod::YearToDate.resolve(now).unwrap();
        assert_eq!(window.from(), cst().with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn unrecognized_token_starts_at_epoch() {
        let period = TimePeriod::parse("forever").unwrap();
        assert_eq!(period, TimePeriod::All);
        let window = period.resolve(at(2024, 1, 1, 0)).unwrap();
        assert_eq!(window.period1(), 0);
    }

    #[test]
    fn range_token_covers_whole_days() {
        let period = TimePeriod::parse("2021-10-10-2022-10-10").unwrap();
        let window = period.resolve(at(2024, 1, 1, 0)).unwrap();
        assert_eq!(window.from(), cst().with_ymd_and_hms(2021, 10, 10, 0, 0, 0).unwrap());
        assert_eq!(window.to(), cst().with_ymd_and_hms(2022, 10, 10, 23, 59, 59).unwrap());
    }

    #[test]
    fn range_with_impossible_date_is_rejected() {
        let err = TimePeriod::parse("2021-02-30-2022-10-10").unwrap_err();
        assert!(matches!(err, PeriodError::InvalidDate { .. }));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = TimePeriod::parse("2022-10-10-2021-10-10").unwrap_err();
        assert!(matches!(err, PeriodError::ReversedRange { .. }));
    }

    #[test]
    fn containment_is_inclusive() {
        let window = TimePeriod::OneDay.resolve(at(2024, 1, 2, 10)).unwrap();
        assert!(window.contains_timestamp(window.period1()));
        assert!(window.contains_timestamp(window.period2()));
        assert!(!window.contains_timestamp(window.period2() + 1));
        assert!(window.contains_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(window.contains_date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()));
        assert!(!window.contains_date(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()));
    }

    #[test]
    fn day_of_truncates_in_market_offset() {
        let window = TimePeriod::OneDay.resolve(at(2023, 11, 15, 10)).unwrap();
        // 2023-11-14T22:13:20Z is already the 15th in UTC+8.
        assert_eq!(
            window.day_of(1_700_000_000),
            NaiveDate::from_ymd_opt(2023, 11, 15)
        );
    }
}
