//! SimulatedTrade — the resolved result of one trading day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trade direction after a breakout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    /// +1.0 for long, -1.0 for short.
    pub fn sign(&self) -> f64 {
        match self {
            TradeDirection::Long => 1.0,
            TradeDirection::Short => -1.0,
        }
    }
}

/// Tri-state trade outcome.
///
/// `NoOutcome` is its own state, never folded into a 0R "breakeven" —
/// unresolved trades stay out of every expectancy computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    Win,
    Loss,
    NoOutcome,
}

/// Why a day was excluded from simulation despite having a breakout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionReason {
    /// Stop distance was zero or negative (flat or inverted range).
    RiskTooSmall,
}

/// One simulated trade: entry, bracket levels, outcome, and both
/// return-multiples. Read-only after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTrade {
    pub date: NaiveDate,
    pub direction: TradeDirection,

    // ── Prices ──
    /// Idealized entry per the entry rule (signal close or boundary).
    pub entry: f64,
    /// Realistic fill: signal close shifted one slippage increment against the trade.
    pub entry_real: f64,
    pub stop: f64,
    pub target: f64,

    // ── Resolution ──
    pub outcome: TradeOutcome,
    /// Bars from the signal bar to the resolving bar (scan length for NoOutcome).
    pub bars_to_resolution: usize,

    // ── Return multiples ──
    /// Idealized R, zero slippage. None for NoOutcome.
    pub canonical_r: Option<f64>,
    /// Tradeable R from the realistic fill. None for NoOutcome.
    pub real_r: Option<f64>,
    /// Friction as a fraction of realistic risk.
    pub friction_ratio: f64,
    /// True when friction_ratio exceeded the configured ceiling.
    pub friction_flagged: bool,

    /// Opening-range size of the session, retained as the regime proxy.
    pub range_size: f64,
}

impl SimulatedTrade {
    pub fn is_resolved(&self) -> bool {
        matches!(self.outcome, TradeOutcome::Win | TradeOutcome::Loss)
    }

    pub fn is_winner(&self) -> bool {
        self.outcome == TradeOutcome::Win
    }

    /// Real R with the friction term inflated by `stress` (0.25 = +25%).
    ///
    /// real_r already carries one unit of friction, so only the extra
    /// `friction_ratio * stress` is subtracted here.
    pub fn stressed_real_r(&self, stress: f64) -> Option<f64> {
        self.real_r.map(|r| r - self.friction_ratio * stress)
    }
}
