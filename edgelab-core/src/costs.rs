//! Execution cost model — canonical and tradeable return-multiples.
//!
//! Friction is `commission + slippage` in currency, expressed as a
//! fraction of the risked amount. Canonical R prices the trade at the
//! idealized entry with zero slippage; real R prices it at the realistic
//! fill (signal close shifted one slippage increment against the trade),
//! which widens effective risk and shrinks the target distance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{InstrumentSpec, TradeDirection, TradeOutcome};

/// Cost parameters for one instrument, passed explicitly per simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Round-trip commission in currency per trade.
    pub commission_per_trade: f64,
    /// Entry slippage in ticks.
    pub slippage_ticks: f64,
    pub tick_size: f64,
    pub point_value: f64,
    /// Friction ratios above this are flagged, not discarded.
    pub friction_ceiling: f64,
}

/// Pricing of one resolved (or unresolved) trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradePricing {
    pub entry_real: f64,
    /// None for `NoOutcome`.
    pub canonical_r: Option<f64>,
    /// None for `NoOutcome`.
    pub real_r: Option<f64>,
    /// Friction as a fraction of realistic risk.
    pub friction_ratio: f64,
    pub flagged: bool,
}

#[derive(Debug, Error)]
pub enum CostError {
    /// The realistic fill landed at or beyond a bracket level, leaving no
    /// positive risk or reward distance to price.
    #[error("degenerate bracket after realistic fill: risk {risk_points} pts")]
    NonPositiveRisk { risk_points: f64 },

    /// The realistic reward distance cannot cover friction: even a win
    /// would lose money. Known at entry time, so no lookahead.
    #[error("reward {reward_points} pts below friction {friction_points} pts")]
    RewardBelowFriction {
        reward_points: f64,
        friction_points: f64,
    },
}

impl CostModel {
    pub fn from_spec(spec: &InstrumentSpec, friction_ceiling: f64) -> Self {
        Self {
            commission_per_trade: spec.commission_per_trade,
            slippage_ticks: spec.slippage_ticks,
            tick_size: spec.tick_size,
            point_value: spec.point_value,
            friction_ceiling,
        }
    }

    /// Zero-cost model for tests and idealized comparisons.
    pub fn frictionless() -> Self {
        Self {
            commission_per_trade: 0.0,
            slippage_ticks: 0.0,
            tick_size: 0.01,
            point_value: 1.0,
            friction_ceiling: 1.0,
        }
    }

    pub fn slippage_points(&self) -> f64 {
        self.slippage_ticks * self.tick_size
    }

    /// Total friction in currency: commission plus slippage cost.
    pub fn friction_currency(&self) -> f64 {
        self.commission_per_trade + self.slippage_points() * self.point_value
    }

    /// Realistic fill: the signal close moved one slippage increment
    /// against the trade (buyers pay up, sellers give back).
    pub fn realistic_fill(&self, signal_close: f64, direction: TradeDirection) -> f64 {
        signal_close + direction.sign() * self.slippage_points()
    }

    /// Price a trade from its bracket geometry and outcome.
    ///
    /// `entry` is the idealized entry per the entry rule; `signal_close`
    /// is the close of the signal bar (the basis of the realistic fill).
    pub fn price(
        &self,
        direction: TradeDirection,
        entry: f64,
        stop: f64,
        target: f64,
        signal_close: f64,
        outcome: TradeOutcome,
    ) -> Result<TradePricing, CostError> {
        let sign = direction.sign();

        let risk_ideal = sign * (entry - stop);
        let entry_real = self.realistic_fill(signal_close, direction);
        let risk_real = sign * (entry_real - stop);
        let reward_real = sign * (target - entry_real);

        if risk_real <= 0.0 || reward_real <= 0.0 {
            return Err(CostError::NonPositiveRisk {
                risk_points: risk_real,
            });
        }

        let friction = self.friction_currency();
        let friction_points = friction / self.point_value;
        if reward_real <= friction_points {
            return Err(CostError::RewardBelowFriction {
                reward_points: reward_real,
                friction_points,
            });
        }
        let friction_ratio_ideal = friction / (risk_ideal * self.point_value);
        let friction_ratio_real = friction / (risk_real * self.point_value);

        let (canonical_r, real_r) = match outcome {
            TradeOutcome::Win => {
                let canonical_gross = sign * (target - entry) / risk_ideal;
                let real_gross = reward_real / risk_real;
                (
                    Some(canonical_gross - friction_ratio_ideal),
                    Some(real_gross - friction_ratio_real),
                )
            }
            TradeOutcome::Loss => (
                // Stops fill at the stop level: the loss body is exactly -1R.
                Some(-1.0 - friction_ratio_ideal),
                Some(-1.0 - friction_ratio_real),
            ),
            TradeOutcome::NoOutcome => (None, None),
        };

        Ok(TradePricing {
            entry_real,
            canonical_r,
            real_r,
            friction_ratio: friction_ratio_real,
            flagged: friction_ratio_real > self.friction_ceiling,
        })
    }
}
