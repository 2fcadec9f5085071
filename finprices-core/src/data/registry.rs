//! Provider registry: named providers in priority order.
//!
//! The registry is built once at startup by [`register_all_providers`] and
//! then only read. Iteration follows registration order, so when several
//! providers claim the same symbol they are queried in that order and their
//! records are unioned; the renderer's total order makes the output
//! independent of it.

use super::eastmoney::EastMoneyProvider;
use super::http::Transport;
use super::provider::PriceProvider;
use super::yahoo::YahooProvider;
use crate::config::PriceConfig;
use std::sync::Arc;

/// Ordered mapping from provider name to provider.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    entries: Vec<(String, Arc<dyn PriceProvider>)>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `name`.
    ///
    /// Re-registering a name replaces the earlier provider but keeps its
    /// position.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn PriceProvider>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = provider,
            None => self.entries.push((name, provider)),
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, provider: Arc<dyn PriceProvider>) -> Self {
        self.register(name, provider);
        self
    }

    /// Lazily yield every provider whose predicate accepts `symbol`.
    pub fn providers_matching<'a>(
        &'a self,
        symbol: &'a str,
    ) -> impl Iterator<Item = &'a dyn PriceProvider> + 'a {
        self.entries
            .iter()
            .map(|(_, p)| p.as_ref())
            .filter(move |p| p.matches(symbol))
    }

    pub fn get(&self, name: &str) -> Option<&dyn PriceProvider> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.as_ref())
    }

    /// Registered names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the default registry: EastMoney funds, then Yahoo exchanges.
pub fn register_all_providers(config: &PriceConfig, transport: Arc<dyn Transport>) -> ProviderRegistry {
    let eastmoney = EastMoneyProvider::new(transport.clone())
        .with_base_url(config.providers.eastmoney_base_url.clone());
    let yahoo =
        YahooProvider::new(transport).with_base_url(config.providers.yahoo_base_url.clone());

    ProviderRegistry::new()
        .with(eastmoney.name().to_string(), Arc::new(eastmoney))
        .with(yahoo.name().to_string(), Arc::new(yahoo))
}
