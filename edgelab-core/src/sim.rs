//! Trade simulation — deterministic replay of each trading day.
//!
//! One day moves through `awaiting entry -> open -> resolved`: the range
//! builds, a breakout may open a trade, and bars after the signal bar
//! resolve it against the stop/target bracket. When both levels fall
//! inside one bar the stop is taken first — intrabar sequencing is
//! unknown, so the conservative reading is canonical.
//!
//! The simulator is a pure function of the bar series, the strategy
//! definition, and the cost model: no external state, fully replayable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::breakout::{detect_breakout, idealized_entry};
use crate::costs::CostModel;
use crate::domain::range::build_opening_range;
use crate::domain::{Bar, ExclusionReason, SimulatedTrade, TradeDirection, TradeOutcome};
use crate::filters::{DayContext, SessionType};
use crate::sample::Sample;
use crate::session::{split_sessions, TradingDay};
use crate::strategy::{StrategyDefinition, StrategyError};

/// Sessions contributing to the trailing volatility reference.
const VOLATILITY_LOOKBACK: usize = 20;

/// Why a day produced no trade, or the trade it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DayOutcome {
    Trade(SimulatedTrade),
    /// No bars inside the range window (sparse/holiday session).
    NoRange,
    /// Scan window ended without a qualifying breakout.
    NoBreakout,
    /// A setup filter rejected the day before the scan.
    Filtered,
    /// Breakout occurred but the day was excluded from simulation.
    Excluded(ExclusionReason),
}

/// Per-day audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub outcome: DayOutcome,
}

/// The full result of replaying a bar series: the trade sample plus the
/// day-by-day audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesResult {
    pub sample: Sample,
    pub days: Vec<DayRecord>,
}

/// Replay every session in an ordered bar series.
pub fn run_series(
    bars: &[Bar],
    def: &StrategyDefinition,
    costs: &CostModel,
) -> Result<SeriesResult, StrategyError> {
    def.validate()?;

    let sessions = split_sessions(bars);
    let mut sample = Sample::new(def.edge_id());
    let mut days = Vec::with_capacity(sessions.len());

    let mut range_history: Vec<f64> = Vec::new();
    let mut prior_session: Option<SessionType> = None;

    for day in &sessions {
        let range = build_opening_range(&day.bars, day.date, def.range_start, def.window_end());

        let outcome = match range {
            None => DayOutcome::NoRange,
            Some(range) => {
                let volatility_reference = trailing_mean(&range_history);
                range_history.push(range.size());
                if range_history.len() > VOLATILITY_LOOKBACK {
                    range_history.remove(0);
                }

                let ctx = DayContext {
                    date: day.date,
                    range,
                    volatility_reference,
                    prior_session,
                };
                simulate_day(day, &ctx, def, costs)
            }
        };

        if let DayOutcome::Trade(trade) = &outcome {
            sample.push(trade.clone());
        }
        days.push(DayRecord {
            date: day.date,
            outcome,
        });
        prior_session = day.session_type();
    }

    Ok(SeriesResult { sample, days })
}

/// Simulate one session whose opening range is already built.
pub fn simulate_day(
    day: &TradingDay,
    ctx: &DayContext,
    def: &StrategyDefinition,
    costs: &CostModel,
) -> DayOutcome {
    if !def.filters.iter().all(|f| f.applies(ctx)) {
        return DayOutcome::Filtered;
    }

    let range = &ctx.range;
    let signal = match detect_breakout(
        &day.bars,
        range,
        def.window_end(),
        def.entry_rule,
        def.confirmation_bars,
        def.direction,
    ) {
        Some(signal) => signal,
        None => return DayOutcome::NoBreakout,
    };

    let risk = range.size() * def.stop_fraction;
    if risk <= 0.0 {
        return DayOutcome::Excluded(ExclusionReason::RiskTooSmall);
    }

    let sign = signal.direction.sign();
    let entry = idealized_entry(def.entry_rule, &day.bars, range, &signal);
    let stop = entry - sign * risk;
    let target = entry + sign * risk * def.reward_risk;

    let (outcome, bars_to_resolution) =
        resolve_bracket(&day.bars, signal.signal_index, signal.direction, stop, target);

    let signal_close = day.bars[signal.signal_index].close;
    let pricing = match costs.price(signal.direction, entry, stop, target, signal_close, outcome) {
        Ok(pricing) => pricing,
        Err(_) => return DayOutcome::Excluded(ExclusionReason::RiskTooSmall),
    };

    DayOutcome::Trade(SimulatedTrade {
        date: day.date,
        direction: signal.direction,
        entry,
        entry_real: pricing.entry_real,
        stop,
        target,
        outcome,
        bars_to_resolution,
        canonical_r: pricing.canonical_r,
        real_r: pricing.real_r,
        friction_ratio: pricing.friction_ratio,
        friction_flagged: pricing.flagged,
        range_size: range.size(),
    })
}

/// Walk bars after the signal bar until stop or target is touched.
///
/// Stop is checked before target on every bar (conservative same-bar
/// policy). Returns the outcome and the bar count from the signal bar.
fn resolve_bracket(
    bars: &[Bar],
    signal_index: usize,
    direction: TradeDirection,
    stop: f64,
    target: f64,
) -> (TradeOutcome, usize) {
    for (offset, bar) in bars[signal_index + 1..].iter().enumerate() {
        let touched = match direction {
            TradeDirection::Long => {
                if bar.low <= stop {
                    Some(TradeOutcome::Loss)
                } else if bar.high >= target {
                    Some(TradeOutcome::Win)
                } else {
                    None
                }
            }
            TradeDirection::Short => {
                if bar.high >= stop {
                    Some(TradeOutcome::Loss)
                } else if bar.low <= target {
                    Some(TradeOutcome::Win)
                } else {
                    None
                }
            }
        };
        if let Some(outcome) = touched {
            return (outcome, offset + 1);
        }
    }
    (
        TradeOutcome::NoOutcome,
        bars.len().saturating_sub(signal_index + 1),
    )
}

fn trailing_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{DirectionFilter, EntryRule};
    use chrono::{TimeZone, Utc};

    fn bar_at(day: u32, hour: u32, minute: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            ts: Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 100,
        }
    }

    fn definition() -> StrategyDefinition {
        StrategyDefinition {
            symbol: "GC".into(),
            range_start: chrono::NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            range_minutes: 15,
            direction: DirectionFilter::Both,
            stop_fraction: 0.5,
            reward_risk: 1.5,
            confirmation_bars: 1,
            entry_rule: EntryRule::CloseThrough,
            filters: vec![],
        }
    }

    /// Range 2685.00-2687.50 (size 2.50), up break at 2688.00:
    /// stop 2686.75, target 2689.875.
    fn winning_day() -> Vec<Bar> {
        vec![
            bar_at(2, 14, 30, 2686.0, 2687.5, 2685.0, 2687.0), // range window
            bar_at(2, 14, 40, 2687.0, 2687.3, 2685.5, 2686.5), // range window
            bar_at(2, 14, 45, 2686.5, 2688.2, 2686.4, 2688.0), // signal: close through
            bar_at(2, 14, 46, 2688.0, 2689.0, 2687.5, 2688.8), // drifts up
            bar_at(2, 14, 47, 2688.8, 2690.0, 2688.0, 2689.5), // touches target
        ]
    }

    #[test]
    fn worked_example_win() {
        let result = run_series(&winning_day(), &definition(), &CostModel::frictionless()).unwrap();
        assert_eq!(result.sample.resolved_len(), 1);

        let trade = &result.sample.trades[0];
        assert_eq!(trade.outcome, TradeOutcome::Win);
        assert_eq!(trade.direction, TradeDirection::Long);
        assert!((trade.entry - 2688.0).abs() < 1e-12);
        assert!((trade.stop - 2686.75).abs() < 1e-12);
        assert!((trade.target - 2689.875).abs() < 1e-12);
        assert!((trade.canonical_r.unwrap() - 1.5).abs() < 1e-12);
        assert_eq!(trade.bars_to_resolution, 2);
        assert!((trade.range_size - 2.5).abs() < 1e-12);
    }

    #[test]
    fn stop_hit_is_a_loss() {
        let bars = vec![
            bar_at(2, 14, 30, 2686.0, 2687.5, 2685.0, 2687.0),
            bar_at(2, 14, 45, 2686.5, 2688.2, 2686.4, 2688.0), // signal
            bar_at(2, 14, 46, 2688.0, 2688.5, 2686.5, 2687.0), // low 2686.5 <= stop 2686.75
        ];
        let result = run_series(&bars, &definition(), &CostModel::frictionless()).unwrap();
        let trade = &result.sample.trades[0];
        assert_eq!(trade.outcome, TradeOutcome::Loss);
        assert!((trade.real_r.unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn stop_and_target_in_same_bar_resolves_to_loss() {
        let bars = vec![
            bar_at(2, 14, 30, 2686.0, 2687.5, 2685.0, 2687.0),
            bar_at(2, 14, 45, 2686.5, 2688.2, 2686.4, 2688.0), // signal
            bar_at(2, 14, 46, 2688.0, 2690.5, 2686.0, 2689.0), // straddles both levels
        ];
        let result = run_series(&bars, &definition(), &CostModel::frictionless()).unwrap();
        assert_eq!(result.sample.trades[0].outcome, TradeOutcome::Loss);
    }

    #[test]
    fn exhausted_scan_is_no_outcome_and_excluded_from_sample() {
        let bars = vec![
            bar_at(2, 14, 30, 2686.0, 2687.5, 2685.0, 2687.0),
            bar_at(2, 14, 45, 2686.5, 2688.2, 2686.4, 2688.0), // signal
            bar_at(2, 14, 46, 2688.0, 2688.6, 2687.2, 2688.2), // between stop and target
            bar_at(2, 14, 47, 2688.2, 2689.0, 2687.5, 2688.5), // still between
        ];
        let result = run_series(&bars, &definition(), &CostModel::frictionless()).unwrap();

        let trade = &result.sample.trades[0];
        assert_eq!(trade.outcome, TradeOutcome::NoOutcome);
        assert!(trade.real_r.is_none());
        // The unresolved trade must not count toward the sample.
        assert_eq!(result.sample.resolved_len(), 0);
        assert_eq!(result.sample.expectancy(), None);
    }

    #[test]
    fn flat_range_excluded_as_risk_too_small() {
        let bars = vec![
            bar_at(2, 14, 30, 2686.0, 2686.0, 2686.0, 2686.0), // zero-size range
            bar_at(2, 14, 45, 2686.0, 2687.0, 2685.9, 2686.9), // close above "range"
        ];
        let result = run_series(&bars, &definition(), &CostModel::frictionless()).unwrap();
        assert_eq!(
            result.days[0].outcome,
            DayOutcome::Excluded(ExclusionReason::RiskTooSmall)
        );
        assert!(result.sample.trades.is_empty());
    }

    #[test]
    fn day_without_range_window_contributes_nothing() {
        let bars = vec![bar_at(2, 16, 0, 2686.0, 2687.0, 2685.0, 2686.5)];
        let result = run_series(&bars, &definition(), &CostModel::frictionless()).unwrap();
        assert_eq!(result.days[0].outcome, DayOutcome::NoRange);
    }

    #[test]
    fn day_without_breakout_contributes_no_trade() {
        let bars = vec![
            bar_at(2, 14, 30, 2686.0, 2687.5, 2685.0, 2687.0),
            bar_at(2, 14, 45, 2686.5, 2687.2, 2685.5, 2686.0), // stays inside
        ];
        let result = run_series(&bars, &definition(), &CostModel::frictionless()).unwrap();
        assert_eq!(result.days[0].outcome, DayOutcome::NoBreakout);
    }

    #[test]
    fn short_breakout_resolves_symmetrically() {
        let bars = vec![
            bar_at(2, 14, 30, 2686.0, 2687.5, 2685.0, 2687.0),
            bar_at(2, 14, 45, 2686.0, 2686.2, 2684.5, 2684.8), // close below low
            bar_at(2, 14, 46, 2684.8, 2685.0, 2682.5, 2683.0), // target 2682.925 touched
        ];
        let result = run_series(&bars, &definition(), &CostModel::frictionless()).unwrap();
        let trade = &result.sample.trades[0];
        assert_eq!(trade.direction, TradeDirection::Short);
        assert_eq!(trade.outcome, TradeOutcome::Win);
        assert!((trade.stop - 2686.05).abs() < 1e-12);
        assert!((trade.target - 2682.925).abs() < 1e-12);
    }

    #[test]
    fn filtered_day_yields_no_trade() {
        let mut def = definition();
        def.filters = vec![crate::filters::SetupFilter::PriorSession {
            session: SessionType::Up,
        }];
        // Single day: no prior session, so the filter rejects.
        let result = run_series(&winning_day(), &def, &CostModel::frictionless()).unwrap();
        assert_eq!(result.days[0].outcome, DayOutcome::Filtered);
        assert!(result.sample.trades.is_empty());
    }

    #[test]
    fn replay_is_deterministic() {
        let bars = winning_day();
        let def = definition();
        let costs = CostModel::frictionless();
        let a = run_series(&bars, &def, &costs).unwrap();
        let b = run_series(&bars, &def, &costs).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_definition_is_rejected() {
        let mut def = definition();
        def.stop_fraction = 2.0;
        assert!(run_series(&winning_day(), &def, &CostModel::frictionless()).is_err());
    }
}
