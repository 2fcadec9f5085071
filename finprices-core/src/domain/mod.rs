//! Domain types: price records and request windows.

pub mod price;
pub mod window;

pub use price::PriceRecord;
pub use window::{PeriodError, TimePeriod, TimeWindow};
