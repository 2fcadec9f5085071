//! PriceRecord: one (symbol, date, closing price) observation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Daily closing price for a symbol, normalized across providers.
///
/// `symbol` is the string the caller asked for (e.g. `000001.JJ`), never the
/// upstream's internal code. Records are plain values; nothing mutates them
/// after a provider produces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
}

impl PriceRecord {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            price,
        }
    }

    /// Ledger output order: date ascending, then symbol descending, then
    /// price ascending.
    ///
    /// Total: records that compare equal are identical. The price key only
    /// separates overlapping providers reporting the same symbol and day.
    pub fn ledger_order(a: &Self, b: &Self) -> Ordering {
        a.date
            .cmp(&b.date)
            .then_with(|| b.symbol.cmp(&a.symbol))
            .then_with(|| a.price.total_cmp(&b.price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn earlier_date_sorts_first() {
        let a = PriceRecord::new("A", d(2022, 1, 2), 1.0);
        let z = PriceRecord::new("Z", d(2022, 1, 1), 1.0);
        assert_eq!(PriceRecord::ledger_order(&z, &a), Ordering::Less);
    }

    #[test]
    fn same_date_sorts_symbol_descending() {
        let a = PriceRecord::new("A", d(2022, 1, 1), 1.0);
        let b = PriceRecord::new("B", d(2022, 1, 1), 2.0);
        assert_eq!(PriceRecord::ledger_order(&b, &a), Ordering::Less);
        assert_eq!(PriceRecord::ledger_order(&a, &a), Ordering::Equal);
    }

    #[test]
    fn same_date_and_symbol_sorts_price_ascending() {
        let low = PriceRecord::new("X.JJ", d(2024, 1, 2), 1.10);
        let high = PriceRecord::new("X.JJ", d(2024, 1, 2), 1.20);
        assert_eq!(PriceRecord::ledger_order(&low, &high), Ordering::Less);
        assert_eq!(PriceRecord::ledger_order(&high, &low), Ordering::Greater);

        let mut forward = vec![low.clone(), high.clone()];
        let mut reversed = vec![high, low];
        forward.sort_by(PriceRecord::ledger_order);
        reversed.sort_by(PriceRecord::ledger_order);
        assert_eq!(forward, reversed);
    }
}
