//! Bar-series provider — the collaborator seam for historical data.
//!
//! The simulator never performs I/O; bars are loaded once, up front,
//! through this trait. Gaps (holidays, halts) are simply absent bars —
//! implementations must not synthesize business-day calendars.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::Bar;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("bars for {symbol} are not in chronological order at index {index}")]
    OutOfOrder { symbol: String, index: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed bar data: {0}")]
    Malformed(String),
}

/// Read-only access to an ordered bar series.
pub trait BarReader {
    /// Bars for `symbol` with session dates in `[from, to]`, in
    /// chronological order.
    fn read_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, ProviderError>;
}

/// In-memory bar store for one symbol.
#[derive(Debug, Clone)]
pub struct MemoryBars {
    symbol: String,
    bars: Vec<Bar>,
}

impl MemoryBars {
    /// Wrap a pre-sorted bar series. Rejects out-of-order input.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, ProviderError> {
        let symbol = symbol.into();
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].ts <= pair[0].ts {
                return Err(ProviderError::OutOfOrder {
                    symbol,
                    index: index + 1,
                });
            }
        }
        Ok(Self { symbol, bars })
    }
}

impl BarReader for MemoryBars {
    fn read_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, ProviderError> {
        if symbol != self.symbol {
            return Err(ProviderError::UnknownSymbol(symbol.to_string()));
        }
        Ok(self
            .bars
            .iter()
            .filter(|b| {
                let d = b.session_date();
                d >= from && d <= to
            })
            .cloned()
            .collect())
    }
}
