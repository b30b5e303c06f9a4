//! OpeningRange — the high/low of a fixed time window at the session start.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::Bar;

/// High/low of the opening window for one trading day.
///
/// Derived once when the window closes, never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningRange {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
}

impl OpeningRange {
    pub fn size(&self) -> f64 {
        self.high - self.low
    }
}

/// Compute the opening range from one session's bars.
///
/// Only bars with `window_start <= t < window_end` participate; the
/// builder never reads bars outside the window. Returns `None` when no
/// bar falls inside the window (sparse or holiday session — expected,
/// not an error).
pub fn build_opening_range(
    day_bars: &[Bar],
    date: NaiveDate,
    window_start: NaiveTime,
    window_end: NaiveTime,
) -> Option<OpeningRange> {
    let mut high = f64::NEG_INFINITY;
    let mut low = f64::INFINITY;
    let mut seen = false;

    for bar in day_bars {
        let t = bar.time();
        if t < window_start {
            continue;
        }
        if t >= window_end {
            break; // bars are chronological; nothing later can qualify
        }
        high = high.max(bar.high);
        low = low.min(bar.low);
        seen = true;
    }

    seen.then_some(OpeningRange { date, high, low })
}
