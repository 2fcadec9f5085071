//! Aggregator that routes each symbol to its providers and merges the results.

use super::provider::{DataError, FetchProgress, NoProgress};
use super::registry::ProviderRegistry;
use crate::domain::{PriceRecord, TimeWindow};
use rayon::prelude::*;

/// Merged output of a multi-symbol collection.
///
/// `records` is in symbol order, then provider order; it carries no
/// meaningful ordering. The renderer imposes the final order.
#[derive(Debug, Default)]
pub struct AggregateReport {
    pub records: Vec<PriceRecord>,
    /// Symbols no registered provider claimed.
    pub unmatched: Vec<String>,
    /// Rows providers dropped as undecodable, summed over all fetches.
    pub skipped_rows: usize,
    /// Provider fetches performed.
    pub fetches: usize,
}

/// Per-symbol result, private to one task until the merge.
#[derive(Default)]
struct SymbolOutcome {
    symbol: String,
    records: Vec<PriceRecord>,
    skipped_rows: usize,
    fetches: usize,
}

/// Collects prices for many symbols through a [`ProviderRegistry`].
pub struct PriceAggregator<'a> {
    registry: &'a ProviderRegistry,
    progress: &'a dyn FetchProgress,
    parallel: bool,
}

impl<'a> PriceAggregator<'a> {
    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self {
            registry,
            progress: &NoProgress,
            parallel: false,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn FetchProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch symbols concurrently on the rayon pool instead of one by one.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fetch every symbol from every matching provider.
    ///
    /// Any failed fetch aborts the whole collection with that error. A symbol
    /// no provider claims contributes nothing and is listed in
    /// [`AggregateReport::unmatched`].
    pub fn collect<S>(&self, symbols: &[S], window: &TimeWindow) -> Result<AggregateReport, DataError>
    where
        S: AsRef<str> + Sync,
    {
        let outcomes: Vec<SymbolOutcome> = if self.parallel {
            symbols
                .par_iter()
                .map(|s| self.collect_symbol(s.as_ref(), window))
                .collect::<Result<_, _>>()?
        } else {
            symbols
                .iter()
                .map(|s| self.collect_symbol(s.as_ref(), window))
                .collect::<Result<_, _>>()?
        };

        let mut report = AggregateReport::default();
        for outcome in outcomes {
            if outcome.fetches == 0 {
                report.unmatched.push(outcome.symbol);
                continue;
            }
            report.records.extend(outcome.records);
            report.skipped_rows += outcome.skipped_rows;
            report.fetches += outcome.fetches;
        }

        self.progress
            .on_batch_complete(report.records.len(), report.skipped_rows, report.fetches);
        Ok(report)
    }

    fn collect_symbol(&self, symbol: &str, window: &TimeWindow) -> Result<SymbolOutcome, DataError> {
        let mut outcome = SymbolOutcome {
            symbol: symbol.to_string(),
            ..SymbolOutcome::default()
        };

        for provider in self.registry.providers_matching(symbol) {
            self.progress.on_start(symbol, provider.name());
            let result = provider.fetch_prices(symbol, window);
            self.progress.on_complete(symbol, provider.name(), &result);

            let fetched = result?;
            outcome.records.extend(fetched.records);
            outcome.skipped_rows += fetched.skipped_rows;
            outcome.fetches += 1;
        }

        if outcome.fetches == 0 {
            self.progress.on_unmatched(symbol);
        }
        Ok(outcome)
    }
}
