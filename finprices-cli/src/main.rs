//! finance-prices: fetch daily closing prices and print ledger price
//! directives.
//!
//! ```text
//! finance-prices -p 3M 161725.JJ 600000.SH >> prices.journal
//! ```
//!
//! Directives go to stdout; diagnostics go to stderr.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use finprices_core::data::{
    register_all_providers, resolve_window, PriceAggregator, ReqwestTransport, TracingProgress,
};
use finprices_core::logging::init_logging;
use finprices_core::render::{render, OutputFormat, RenderOptions};
use finprices_core::PriceConfig;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "finance-prices",
    version,
    about = "Fetch daily closing prices and print hledger price directives"
)]
struct Cli {
    /// Symbols to fetch (e.g., 161725.JJ 600000.SH 000001.SZ).
    #[arg(required_unless_present = "list_providers")]
    symbols: Vec<String>,

    /// Output dialect. Only `hledger` is supported.
    #[arg(short, long, default_value = "hledger")]
    output: OutputFormat,

    /// Time period: 1D, 5D, 3M, 6M, YTD, 1Y, 5Y, or YYYY-MM-DD-YYYY-MM-DD.
    /// Anything else fetches from the beginning.
    #[arg(short = 'p', long, default_value = "1D")]
    time_period: String,

    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Commodity appended to prices. Overrides the config file.
    #[arg(long)]
    currency: Option<String>,

    /// Fetch symbols concurrently.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Per-request timeout in seconds. Default: wait indefinitely.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Separate columns with single tabs instead of aligning them.
    #[arg(long, default_value_t = false)]
    no_align: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print registered providers in priority order and exit.
    #[arg(long, default_value_t = false)]
    list_providers: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("warning: logging disabled: {e}");
    }

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let transport =
        ReqwestTransport::new(&config.http).context("failed to initialise HTTP client")?;
    let registry = register_all_providers(&config, Arc::new(transport));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if cli.list_providers {
        for name in registry.names() {
            writeln!(out, "{name}")?;
        }
        return Ok(());
    }

    let now = Utc::now().with_timezone(&config.market_offset()?);
    let window = resolve_window(&cli.time_period, now)
        .with_context(|| format!("invalid --time-period '{}'", cli.time_period))?;
    tracing::info!(
        period = %cli.time_period,
        from = %window.from(),
        to = %window.to(),
        "resolved time window"
    );

    let progress = TracingProgress;
    let report = PriceAggregator::new(&registry)
        .with_progress(&progress)
        .parallel(config.parallel)
        .collect(&cli.symbols, &window)
        .context("price collection failed")?;

    let options = RenderOptions {
        currency: config.currency.clone(),
        align: !cli.no_align,
        ..RenderOptions::default()
    };
    render(&report.records, cli.output, &options, &mut out).context("failed to write output")?;
    out.flush()?;

    Ok(())
}

/// Load the config file (if any) and apply CLI overrides.
fn load_config(cli: &Cli) -> Result<PriceConfig> {
    let mut config = match &cli.config {
        Some(path) => PriceConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PriceConfig::default(),
    };

    if let Some(currency) = &cli.currency {
        config.currency = currency.clone();
    }
    if cli.parallel {
        config.parallel = true;
    }
    if cli.timeout_secs.is_some() {
        config.http.timeout_secs = cli.timeout_secs;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}
