//! StrategyDefinition — an immutable, content-addressed candidate edge.
//!
//! A definition is identified by the BLAKE3 hash of its canonical JSON
//! serialization: two definitions with identical fields share one
//! `EdgeId` regardless of where or when they were built.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::EdgeId;
use crate::filters::SetupFilter;

/// Which breakout directions the strategy is allowed to trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionFilter {
    LongOnly,
    ShortOnly,
    Both,
}

impl DirectionFilter {
    pub fn allows_long(&self) -> bool {
        matches!(self, DirectionFilter::LongOnly | DirectionFilter::Both)
    }

    pub fn allows_short(&self) -> bool {
        matches!(self, DirectionFilter::ShortOnly | DirectionFilter::Both)
    }
}

/// How a breakout is declared and where the idealized entry sits.
///
/// The two variants exist because close-through and touch semantics are
/// genuinely different strategies; callers must pick one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryRule {
    /// Declared on a close beyond the boundary; entry at the signal close.
    /// Supports confirmation counts (N consecutive closes).
    CloseThrough,
    /// Declared on the first high/low reaching beyond the boundary;
    /// entry at the boundary itself.
    BoundaryTouch,
}

/// A candidate opening-range-breakout strategy. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDefinition {
    pub symbol: String,
    /// Opening window start (UTC time of day).
    pub range_start: NaiveTime,
    /// Opening window length in minutes.
    pub range_minutes: u32,
    pub direction: DirectionFilter,
    /// Stop distance as a fraction of range size, in (0, 1].
    pub stop_fraction: f64,
    /// Reward:risk multiple, > 0.
    pub reward_risk: f64,
    /// Consecutive closes beyond the boundary required to declare a
    /// close-through signal. Must be 1 for `BoundaryTouch`.
    pub confirmation_bars: u32,
    pub entry_rule: EntryRule,
    pub filters: Vec<SetupFilter>,
}

impl StrategyDefinition {
    /// Validate parameter ranges. Called by every consumer before use.
    pub fn validate(&self) -> Result<(), StrategyError> {
        if !(self.stop_fraction > 0.0 && self.stop_fraction <= 1.0) {
            return Err(StrategyError::InvalidStopFraction(self.stop_fraction));
        }
        if !(self.reward_risk > 0.0) {
            return Err(StrategyError::InvalidRewardRisk(self.reward_risk));
        }
        if self.confirmation_bars == 0 {
            return Err(StrategyError::ZeroConfirmationBars);
        }
        if self.entry_rule == EntryRule::BoundaryTouch && self.confirmation_bars > 1 {
            return Err(StrategyError::TouchWithConfirmation(self.confirmation_bars));
        }
        if self.range_minutes == 0 {
            return Err(StrategyError::EmptyWindow);
        }
        // The window must close strictly before midnight: NaiveTime
        // arithmetic wraps, which would empty the breakout scan.
        let start_secs = self.range_start.num_seconds_from_midnight() as u64;
        if start_secs + u64::from(self.range_minutes) * 60 >= 86_400 {
            return Err(StrategyError::WindowWrapsMidnight);
        }
        Ok(())
    }

    /// End of the opening window (exclusive).
    pub fn window_end(&self) -> NaiveTime {
        self.range_start + chrono::Duration::minutes(i64::from(self.range_minutes))
    }

    /// Content-addressed identity: BLAKE3 over the canonical JSON form.
    ///
    /// Field order is fixed by the struct declaration, so the
    /// serialization — and therefore the hash — is deterministic.
    pub fn edge_id(&self) -> EdgeId {
        let json = serde_json::to_string(self).expect("StrategyDefinition must serialize");
        EdgeId::from_bytes(json.as_bytes())
    }
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("stop_fraction must be in (0, 1], got {0}")]
    InvalidStopFraction(f64),

    #[error("reward_risk must be > 0, got {0}")]
    InvalidRewardRisk(f64),

    #[error("confirmation_bars must be >= 1")]
    ZeroConfirmationBars,

    #[error("boundary-touch entries do not take confirmation counts (got {0})")]
    TouchWithConfirmation(u32),

    #[error("range window must be at least one minute")]
    EmptyWindow,

    #[error("range window must not cross midnight")]
    WindowWrapsMidnight,
}
