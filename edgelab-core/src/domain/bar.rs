//! Bar — the fundamental market data unit.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument over one minute.
///
/// Bars arrive ordered by timestamp, unique per instrument+timestamp.
/// Gaps (holidays, halts, sparse sessions) are simply absent bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Session date of the bar (UTC calendar date).
    pub fn session_date(&self) -> NaiveDate {
        self.ts.date_naive()
    }

    /// Time-of-day of the bar (UTC).
    pub fn time(&self) -> NaiveTime {
        self.ts.time()
    }

    /// Basic OHLC sanity check: high >= low, high/low bracket open and close.
    pub fn is_sane(&self) -> bool {
        !self.open.is_nan()
            && !self.high.is_nan()
            && !self.low.is_nan()
            && !self.close.is_nan()
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}
