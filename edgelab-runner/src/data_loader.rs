//! CSV bar loading — the reference `BarReader` implementation.
//!
//! Expected header: `ts,open,high,low,close,volume` with RFC 3339 UTC
//! timestamps. Rows must be chronological; insane OHLC rows are an
//! error, not silently dropped.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use edgelab_core::domain::Bar;
use edgelab_core::provider::{BarReader, MemoryBars, ProviderError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("insane OHLC values at row {row}")]
    InsaneBar { row: usize },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Deserialize)]
struct BarRow {
    ts: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Load an entire CSV file of minute bars.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();

    for (row, result) in reader.deserialize::<BarRow>().enumerate() {
        let record = result?;
        let bar = Bar {
            ts: record.ts,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        };
        if !bar.is_sane() {
            return Err(LoadError::InsaneBar { row: row + 1 });
        }
        bars.push(bar);
    }

    info!(path = %path.display(), bars = bars.len(), "loaded bar file");
    Ok(bars)
}

/// CSV-backed bar reader for a single symbol.
pub struct CsvBarReader {
    inner: MemoryBars,
}

impl CsvBarReader {
    /// Load the file once, up front. Out-of-order rows are rejected.
    pub fn open(symbol: impl Into<String>, path: &Path) -> Result<Self, LoadError> {
        let bars = load_bars_csv(path)?;
        Ok(Self {
            inner: MemoryBars::new(symbol, bars)?,
        })
    }
}

impl BarReader for CsvBarReader {
    fn read_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, ProviderError> {
        self.inner.read_bars(symbol, from, to)
    }
}
