//! Instrument metadata — tick size, point value, and execution-cost parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-instrument execution configuration.
///
/// Every cost parameter lives here and is passed explicitly into the
/// simulator — nothing is read from process-wide state, so parameter
/// sweeps can price different instruments concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub symbol: String,
    /// Minimum price increment.
    pub tick_size: f64,
    /// Currency value of a one-point move.
    pub point_value: f64,
    /// Round-trip commission in currency per trade.
    pub commission_per_trade: f64,
    /// Assumed entry slippage, in ticks.
    pub slippage_ticks: f64,
}

impl InstrumentSpec {
    pub fn new(
        symbol: impl Into<String>,
        tick_size: f64,
        point_value: f64,
        commission_per_trade: f64,
        slippage_ticks: f64,
    ) -> Result<Self, InstrumentError> {
        let spec = Self {
            symbol: symbol.into(),
            tick_size,
            point_value,
            commission_per_trade,
            slippage_ticks,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), InstrumentError> {
        if !(self.tick_size > 0.0) {
            return Err(InstrumentError::InvalidTickSize(self.tick_size));
        }
        if !(self.point_value > 0.0) {
            return Err(InstrumentError::InvalidPointValue(self.point_value));
        }
        if self.commission_per_trade < 0.0 {
            return Err(InstrumentError::NegativeCommission(
                self.commission_per_trade,
            ));
        }
        if self.slippage_ticks < 0.0 {
            return Err(InstrumentError::NegativeSlippage(self.slippage_ticks));
        }
        Ok(())
    }

    /// Entry slippage expressed in price points.
    pub fn slippage_points(&self) -> f64 {
        self.slippage_ticks * self.tick_size
    }
}

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("tick_size must be > 0, got {0}")]
    InvalidTickSize(f64),

    #[error("point_value must be > 0, got {0}")]
    InvalidPointValue(f64),

    #[error("commission_per_trade must be >= 0, got {0}")]
    NegativeCommission(f64),

    #[error("slippage_ticks must be >= 0, got {0}")]
    NegativeSlippage(f64),
}
