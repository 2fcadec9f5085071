//! finprices core: daily closing prices from public quote sources, rendered
//! as ledger price directives.
//!
//! This crate contains:
//! - Domain types (price records, time periods and resolved windows)
//! - The provider contract and the EastMoney and Yahoo providers
//! - The provider registry and the multi-symbol aggregator
//! - The hledger renderer
//! - Configuration and logging setup

pub mod config;
pub mod data;
pub mod domain;
pub mod logging;
pub mod render;

pub use config::{ConfigError, PriceConfig};
pub use data::{
    register_all_providers, AggregateReport, DataError, PriceAggregator, PriceProvider,
    ProviderRegistry,
};
pub use domain::{PriceRecord, TimePeriod, TimeWindow};
pub use render::{render, OutputFormat, RenderOptions};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across fetch tasks is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceRecord>();
        require_sync::<domain::PriceRecord>();
        require_send::<domain::TimeWindow>();
        require_sync::<domain::TimeWindow>();

        require_send::<data::ProviderRegistry>();
        require_sync::<data::ProviderRegistry>();
        require_send::<data::EastMoneyProvider>();
        require_sync::<data::EastMoneyProvider>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::ReqwestTransport>();
        require_sync::<data::ReqwestTransport>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_sync::<data::PriceAggregator<'static>>();
    }
}
