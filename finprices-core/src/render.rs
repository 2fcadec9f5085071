//! Ledger price-directive rendering.
//!
//! Output is one `P` directive per record, in hledger's price syntax:
//!
//! ```text
//! P	2024-01-02	"600000.SH"	7.05 CNY
//! ```
//!
//! Records are emitted in the total order date ascending, then symbol
//! descending, then price ascending, so the output is independent of fetch
//! order.

use crate::domain::PriceRecord;
use std::io::{self, Write};
use std::str::FromStr;
use thiserror::Error;

/// Output dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Hledger,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported output format `{0}` (expected: hledger)")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hledger" => Ok(Self::Hledger),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Rendering knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Commodity appended to every price.
    pub currency: String,
    /// Pad columns with tabs to a common tab stop.
    pub align: bool,
    /// Tab stop width used for alignment.
    pub tab_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            currency: "CNY".to_string(),
            align: true,
            tab_width: 4,
        }
    }
}

/// Sort records into ledger order. Stable.
pub fn sort_records(records: &mut [PriceRecord]) {
    records.sort_by(PriceRecord::ledger_order);
}

/// Render `records` as price directives into `writer`.
///
/// The input slice is left untouched; a sorted copy is rendered.
pub fn render<W: Write>(
    records: &[PriceRecord],
    format: OutputFormat,
    options: &RenderOptions,
    writer: &mut W,
) -> io::Result<()> {
    let mut sorted = records.to_vec();
    sort_records(&mut sorted);

    let rows: Vec<[String; 4]> = match format {
        OutputFormat::Hledger => sorted.iter().map(|r| hledger_row(r, &options.currency)).collect(),
    };

    if options.align && options.tab_width > 0 {
        write_aligned(&rows, options.tab_width, writer)
    } else {
        for row in &rows {
            writeln!(writer, "{}", row.join("\t"))?;
        }
        Ok(())
    }
}

fn hledger_row(record: &PriceRecord, currency: &str) -> [String; 4] {
    [
        "P".to_string(),
        record.date.format("%Y-%m-%d").to_string(),
        format!("\"{}\"", record.symbol),
        format!("{:.2} {currency}", record.price),
    ]
}

/// Write rows with every column but the last padded by tabs to a shared tab
/// stop. Each padded column is followed by at least one tab.
fn write_aligned<W: Write, const N: usize>(
    rows: &[[String; N]],
    tab_width: usize,
    writer: &mut W,
) -> io::Result<()> {
    let mut stops = [0usize; N];
    for row in rows {
        for (stop, cell) in stops.iter_mut().zip(row.iter()).take(N.saturating_sub(1)) {
            let needed = (cell.chars().count() / tab_width + 1) * tab_width;
            *stop = (*stop).max(needed);
        }
    }

    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            line.push_str(cell);
            if i + 1 < N {
                let gap = stops[i] - cell.chars().count();
                let tabs = gap.div_ceil(tab_width);
                line.extend(std::iter::repeat('\t').take(tabs));
            }
        }
        writeln!(writer, "{line}")?;
    }
    Ok(())
}
