//! Breakout detection — first qualifying break of the opening range.
//!
//! Scans bars strictly after the range window in chronological order and
//! returns as soon as a signal is declared: the detector never inspects
//! a bar after the signal bar.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, OpeningRange, TradeDirection};
use crate::strategy::{DirectionFilter, EntryRule};

/// A declared breakout for one day. Absence of a signal is `None` at the
/// call site — a day without a breakout contributes no trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakoutSignal {
    pub direction: TradeDirection,
    /// Index of the signal bar within the day's bars.
    pub signal_index: usize,
}

/// Find the first qualifying breakout after the range window.
///
/// Close-through: the first run of `confirmation_bars` consecutive closes
/// beyond one boundary declares the signal on the run's last bar. A close
/// back inside the range resets the run.
///
/// Boundary-touch: the first bar whose high (low) reaches beyond the range
/// high (low). A bar straddling both boundaries is resolved by the
/// direction of its close; if that close is inside the range the bar does
/// not count.
///
/// A first breakout in a direction the strategy does not trade ends the
/// scan: the range is considered broken and the day yields no trade.
pub fn detect_breakout(
    day_bars: &[Bar],
    range: &OpeningRange,
    window_end: NaiveTime,
    entry_rule: EntryRule,
    confirmation_bars: u32,
    direction: DirectionFilter,
) -> Option<BreakoutSignal> {
    let mut up_run = 0u32;
    let mut down_run = 0u32;

    for (index, bar) in day_bars.iter().enumerate() {
        if bar.time() < window_end {
            continue;
        }

        let candidate = match entry_rule {
            EntryRule::CloseThrough => {
                if bar.close > range.high {
                    up_run += 1;
                    down_run = 0;
                    (up_run >= confirmation_bars).then_some(TradeDirection::Long)
                } else if bar.close < range.low {
                    down_run += 1;
                    up_run = 0;
                    (down_run >= confirmation_bars).then_some(TradeDirection::Short)
                } else {
                    up_run = 0;
                    down_run = 0;
                    None
                }
            }
            EntryRule::BoundaryTouch => {
                let broke_high = bar.high > range.high;
                let broke_low = bar.low < range.low;
                match (broke_high, broke_low) {
                    (true, true) => {
                        // Straddle: direction of close decides; an inside
                        // close does not count.
                        if bar.close > range.high {
                            Some(TradeDirection::Long)
                        } else if bar.close < range.low {
                            Some(TradeDirection::Short)
                        } else {
                            None
                        }
                    }
                    (true, false) => Some(TradeDirection::Long),
                    (false, true) => Some(TradeDirection::Short),
                    (false, false) => None,
                }
            }
        };

        if let Some(dir) = candidate {
            let allowed = match dir {
                TradeDirection::Long => direction.allows_long(),
                TradeDirection::Short => direction.allows_short(),
            };
            return allowed.then_some(BreakoutSignal {
                direction: dir,
                signal_index: index,
            });
        }
    }

    None
}

/// Idealized entry price for a declared signal under the entry rule.
pub fn idealized_entry(
    entry_rule: EntryRule,
    day_bars: &[Bar],
    range: &OpeningRange,
    signal: &BreakoutSignal,
) -> f64 {
    match entry_rule {
        EntryRule::CloseThrough => day_bars[signal.signal_index].close,
        EntryRule::BoundaryTouch => match signal.direction {
            TradeDirection::Long => range.high,
            TradeDirection::Short => range.low,
        },
    }
}
