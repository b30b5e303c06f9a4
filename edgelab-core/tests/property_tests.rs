//! Property tests for simulation invariants.
//!
//! 1. Determinism — identical bars and definition produce identical samples
//! 2. Outcome sign — wins carry positive real R, losses negative
//! 3. Friction monotonicity — inflating the stress multiplier never
//!    increases a trade's real R
//! 4. Unresolved trades never enter the expectancy sample

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use edgelab_core::costs::CostModel;
use edgelab_core::domain::{Bar, TradeOutcome};
use edgelab_core::sim::run_series;
use edgelab_core::strategy::{DirectionFilter, EntryRule, StrategyDefinition};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_range_width() -> impl Strategy<Value = f64> {
    (1.0..8.0_f64).prop_map(|w| (w * 100.0).round() / 100.0)
}

fn arb_moves() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((-1.5..1.5_f64).prop_map(|m| (m * 100.0).round() / 100.0), 5..40)
}

fn arb_entry_rule() -> impl Strategy<Value = EntryRule> {
    prop_oneof![Just(EntryRule::CloseThrough), Just(EntryRule::BoundaryTouch)]
}

/// One synthetic session: a single range bar spanning `width`, then a
/// random walk of scan bars.
fn make_day(base: f64, width: f64, moves: &[f64]) -> Vec<Bar> {
    let mut bars = vec![Bar {
        ts: Utc.with_ymd_and_hms(2024, 5, 6, 14, 30, 0).unwrap(),
        open: base,
        high: base + width,
        low: base,
        close: base + width / 2.0,
        volume: 500,
    }];

    let mut price = base + width / 2.0;
    for (i, m) in moves.iter().enumerate() {
        let minute = 45 + i as u32;
        let (hour, min) = (14 + minute / 60, minute % 60);
        let open = price;
        let close = price + m;
        bars.push(Bar {
            ts: Utc.with_ymd_and_hms(2024, 5, 6, hour, min, 0).unwrap(),
            open,
            high: open.max(close) + 0.05,
            low: open.min(close) - 0.05,
            close,
            volume: 500,
        });
        price = close;
    }

    bars
}

fn definition(entry_rule: EntryRule) -> StrategyDefinition {
    StrategyDefinition {
        symbol: "GC".into(),
        range_start: chrono::NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        range_minutes: 15,
        direction: DirectionFilter::Both,
        stop_fraction: 0.5,
        reward_risk: 1.5,
        confirmation_bars: 1,
        entry_rule,
        filters: vec![],
    }
}

fn realistic_costs() -> CostModel {
    CostModel {
        commission_per_trade: 4.50,
        slippage_ticks: 1.0,
        tick_size: 0.10,
        point_value: 100.0,
        friction_ceiling: 0.20,
    }
}

// ── Properties ───────────────────────────────────────────────────────

proptest! {
    /// Re-running the simulator on the same inputs yields an identical sample.
    #[test]
    fn replay_deterministic(
        width in arb_range_width(),
        moves in arb_moves(),
        entry_rule in arb_entry_rule(),
    ) {
        let bars = make_day(2685.0, width, &moves);
        let def = definition(entry_rule);
        let costs = realistic_costs();

        let a = run_series(&bars, &def, &costs).unwrap();
        let b = run_series(&bars, &def, &costs).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Wins carry positive real R; losses carry negative real R.
    #[test]
    fn outcome_sign_matches_real_r(
        width in arb_range_width(),
        moves in arb_moves(),
        entry_rule in arb_entry_rule(),
    ) {
        let bars = make_day(2685.0, width, &moves);
        let result = run_series(&bars, &definition(entry_rule), &realistic_costs()).unwrap();

        for trade in &result.sample.trades {
            match trade.outcome {
                TradeOutcome::Win => {
                    prop_assert!(trade.real_r.unwrap() > 0.0, "win with real R <= 0: {trade:?}");
                    prop_assert!(trade.canonical_r.unwrap() > 0.0);
                }
                TradeOutcome::Loss => {
                    prop_assert!(trade.real_r.unwrap() < 0.0, "loss with real R >= 0: {trade:?}");
                }
                TradeOutcome::NoOutcome => {
                    prop_assert!(trade.real_r.is_none());
                    prop_assert!(trade.canonical_r.is_none());
                }
            }
        }
    }

    /// Raising the stress multiplier never raises a trade's real R.
    #[test]
    fn stress_is_monotone(
        width in arb_range_width(),
        moves in arb_moves(),
        entry_rule in arb_entry_rule(),
    ) {
        let bars = make_day(2685.0, width, &moves);
        let result = run_series(&bars, &definition(entry_rule), &realistic_costs()).unwrap();

        for trade in result.sample.resolved() {
            let nominal = trade.stressed_real_r(0.0).unwrap();
            let quarter = trade.stressed_real_r(0.25).unwrap();
            let half = trade.stressed_real_r(0.50).unwrap();
            prop_assert!(quarter <= nominal);
            prop_assert!(half <= quarter);
        }

        let stressed = result.sample.stressed_expectancy(0.50);
        if let (Some(s), Some(e)) = (stressed, result.sample.expectancy()) {
            prop_assert!(s <= e);
        }
    }

    /// Unresolved trades never count toward sample size or expectancy.
    #[test]
    fn no_outcome_excluded_from_sample(
        width in arb_range_width(),
        moves in arb_moves(),
    ) {
        let bars = make_day(2685.0, width, &moves);
        let result = run_series(&bars, &definition(EntryRule::CloseThrough), &realistic_costs())
            .unwrap();

        let unresolved = result
            .sample
            .trades
            .iter()
            .filter(|t| t.outcome == TradeOutcome::NoOutcome)
            .count();
        prop_assert_eq!(
            result.sample.resolved_len() + unresolved,
            result.sample.trades.len()
        );
    }
}
