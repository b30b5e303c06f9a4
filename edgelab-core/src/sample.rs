//! Sample — the ordered trade collection the validation gate consumes.
//!
//! Unresolved (`NoOutcome`) trades stay in the collection for audit but
//! are excluded from every statistic: folding them in as 0R breakevens
//! silently inflates apparent expectancy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{EdgeId, SimulatedTrade};

/// All simulated trades for one strategy definition over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub edge_id: EdgeId,
    pub trades: Vec<SimulatedTrade>,
}

impl Sample {
    pub fn new(edge_id: EdgeId) -> Self {
        Self {
            edge_id,
            trades: Vec::new(),
        }
    }

    pub fn push(&mut self, trade: SimulatedTrade) {
        self.trades.push(trade);
    }

    /// Resolved trades only (Win or Loss).
    pub fn resolved(&self) -> impl Iterator<Item = &SimulatedTrade> {
        self.trades.iter().filter(|t| t.is_resolved())
    }

    /// Sample size as the gate counts it: resolved trades only.
    pub fn resolved_len(&self) -> usize {
        self.resolved().count()
    }

    /// Mean real R over resolved trades. None when nothing resolved.
    pub fn expectancy(&self) -> Option<f64> {
        mean(self.resolved().filter_map(|t| t.real_r))
    }

    /// Mean canonical R over resolved trades.
    pub fn canonical_expectancy(&self) -> Option<f64> {
        mean(self.resolved().filter_map(|t| t.canonical_r))
    }

    /// Mean real R with friction inflated by `stress` (0.25 = +25%).
    pub fn stressed_expectancy(&self, stress: f64) -> Option<f64> {
        mean(self.resolved().filter_map(|t| t.stressed_real_r(stress)))
    }

    /// Fraction of resolved trades that won.
    pub fn win_rate(&self) -> Option<f64> {
        let resolved = self.resolved_len();
        if resolved == 0 {
            return None;
        }
        let wins = self.resolved().filter(|t| t.is_winner()).count();
        Some(wins as f64 / resolved as f64)
    }

    /// Count of trades whose friction ratio exceeded the ceiling.
    pub fn flagged_count(&self) -> usize {
        self.trades.iter().filter(|t| t.friction_flagged).count()
    }

    /// First and last trade dates (all trades, resolved or not).
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.trades.first()?.date;
        let last = self.trades.last()?.date;
        Some((first, last))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v;
        n += 1;
    }
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TradeDirection, TradeOutcome};

    fn trade(day: u32, outcome: TradeOutcome, real_r: Option<f64>, friction: f64) -> SimulatedTrade {
        SimulatedTrade {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            direction: TradeDirection::Long,
            entry: 100.0,
            entry_real: 100.1,
            stop: 99.0,
            target: 101.5,
            outcome,
            bars_to_resolution: 5,
            canonical_r: real_r.map(|r| r + 0.05),
            real_r,
            friction_ratio: friction,
            friction_flagged: friction > 0.20,
            range_size: 2.0,
        }
    }

    fn sample() -> Sample {
        let mut s = Sample::new(EdgeId::from_bytes(b"test"));
        s.push(trade(2, TradeOutcome::Win, Some(1.4), 0.10));
        s.push(trade(3, TradeOutcome::Loss, Some(-1.1), 0.10));
        s.push(trade(4, TradeOutcome::NoOutcome, None, 0.10));
        s.push(trade(5, TradeOutcome::Win, Some(1.3), 0.25));
        s
    }

    #[test]
    fn resolved_excludes_no_outcome() {
        let s = sample();
        assert_eq!(s.trades.len(), 4);
        assert_eq!(s.resolved_len(), 3);
    }

    #[test]
    fn expectancy_over_resolved_only() {
        let s = sample();
        let expected = (1.4 - 1.1 + 1.3) / 3.0;
        assert!((s.expectancy().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn empty_sample_has_no_expectancy() {
        let s = Sample::new(EdgeId::from_bytes(b"empty"));
        assert_eq!(s.expectancy(), None);
        assert_eq!(s.win_rate(), None);
        assert_eq!(s.date_range(), None);
    }

    #[test]
    fn stressed_expectancy_monotone() {
        let s = sample();
        let nominal = s.stressed_expectancy(0.0).unwrap();
        let quarter = s.stressed_expectancy(0.25).unwrap();
        let half = s.stressed_expectancy(0.50).unwrap();
        assert!((nominal - s.expectancy().unwrap()).abs() < 1e-12);
        assert!(quarter < nominal);
        assert!(half < quarter);
    }

    #[test]
    fn win_rate() {
        let s = sample();
        assert!((s.win_rate().unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn flagged_count() {
        let s = sample();
        assert_eq!(s.flagged_count(), 1);
    }

    #[test]
    fn date_range_spans_all_trades() {
        let s = sample();
        let (first, last) = s.date_range().unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn sample_serialization_roundtrip() {
        let s = sample();
        let json = serde_json::to_string(&s).unwrap();
        let deser: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(s, deser);
    }
}
