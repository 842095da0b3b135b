//! Output table export — flattening resolved series into the final CSV.
//!
//! One file per run, named with the write-time timestamp. Columns are fixed:
//! `Date,Symbol,Open,High,Low,Close,Volume`. Rows are grouped by
//! ticker-processing order and, within a ticker, by ascending date. Dates
//! carry no timezone component.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use histfetch_core::domain::ResolvedSeries;
use std::path::{Path, PathBuf};

/// One row of the final output table. Built only at the write step.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Flatten accumulated series into output rows, preserving accumulation order.
pub fn flatten(series: &[ResolvedSeries]) -> Vec<OutputRow> {
    let total: usize = series.iter().map(|s| s.bars.len()).sum();
    let mut rows = Vec::with_capacity(total);
    for s in series {
        for bar in &s.bars {
            rows.push(OutputRow {
                date: bar.date,
                symbol: s.symbol.clone(),
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            });
        }
    }
    rows
}

/// Render output rows as CSV.
pub fn to_csv(rows: &[OutputRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["Date", "Symbol", "Open", "High", "Low", "Close", "Volume"])?;

    for row in rows {
        wtr.write_record([
            &row.date.to_string(),
            &row.symbol,
            &format!("{:.4}", row.open),
            &format!("{:.4}", row.high),
            &format!("{:.4}", row.low),
            &format!("{:.4}", row.close),
            &row.volume.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write the consolidated table for a run to `<dir>/<prefix>_<timestamp>.csv`.
///
/// The timestamp is taken at write time. Returns the path of the created file.
pub fn save_output(series: &[ResolvedSeries], dir: &Path, prefix: &str) -> Result<PathBuf> {
    let rows = flatten(series);
    let csv = to_csv(&rows)?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let filename = format!("{prefix}_{}.csv", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(filename);
    std::fs::write(&path, csv)
        .with_context(|| format!("failed to write output file {}", path.display()))?;

    Ok(path)
}
