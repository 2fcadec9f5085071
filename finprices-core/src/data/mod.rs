//! Price acquisition: providers, transport, routing and aggregation.

pub mod aggregate;
pub mod eastmoney;
pub mod http;
pub mod provider;
pub mod registry;
pub mod yahoo;

pub use aggregate::{AggregateReport, PriceAggregator};
pub use eastmoney::EastMoneyProvider;
pub use http::{HttpResponse, ReqwestTransport, Transport};
pub use provider::{
    resolve_window, DataError, ErrorKind, FetchProgress, FetchResult, NoDataReason, NoProgress,
    PriceProvider, TracingProgress,
};
pub use registry::{register_all_providers, ProviderRegistry};
pub use yahoo::YahooProvider;
