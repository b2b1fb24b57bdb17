//! Command handler modules for mbo-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod backtest;
pub mod db;

use anyhow::{Context, Result};
use mbo_schemas::Candle;

/// Load a fixed-width CSV of 5-minute bars: `timestamp,open,high,low,close,volume`,
/// timestamp in UTC milliseconds, prices in integer cents. Every row is
/// treated as a completed bar.
pub fn load_bars_csv(path: &str) -> Result<Vec<Candle>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("open bars csv: {path}"))?;
    let mut bars = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read csv row {i} of {path}"))?;
        if record.len() < 6 {
            anyhow::bail!("csv row {i} of {path} has fewer than 6 columns");
        }
        let timestamp: i64 = record[0].trim().parse().with_context(|| format!("row {i}: bad timestamp"))?;
        let open: i64 = record[1].trim().parse().with_context(|| format!("row {i}: bad open"))?;
        let high: i64 = record[2].trim().parse().with_context(|| format!("row {i}: bad high"))?;
        let low: i64 = record[3].trim().parse().with_context(|| format!("row {i}: bad low"))?;
        let close: i64 = record[4].trim().parse().with_context(|| format!("row {i}: bad close"))?;
        let volume: u64 = record[5].trim().parse().with_context(|| format!("row {i}: bad volume"))?;
        let bar = Candle::new(timestamp, open, high, low, close, volume, true)
            .with_context(|| format!("row {i}: invalid bar"))?;
        bars.push(bar);
    }
    Ok(bars)
}
