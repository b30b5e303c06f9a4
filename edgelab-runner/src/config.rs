//! Run configuration — gate thresholds and the TOML surface.
//!
//! Every threshold the gate consults lives here and is passed explicitly
//! into each call. Nothing is read from process-wide state, so parameter
//! sweeps with different thresholds can run concurrently.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use edgelab_core::domain::InstrumentSpec;
use edgelab_core::strategy::StrategyDefinition;

/// Thresholds for the seven-phase validation gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateThresholds {
    /// Minimum resolved trades for the sample to be judged at all.
    pub min_sample_size: usize,
    /// Minimum mean real R.
    pub min_expectancy: f64,
    /// Reduced stress multiplier; surviving only this level caps the
    /// classification at Marginal.
    pub stress_marginal: f64,
    /// Full stress multiplier required for approval.
    pub stress_full: f64,
    /// Minimum resolved trades for a temporal bucket to be evaluated.
    pub min_bucket_trades: usize,
    /// Chronological walk-forward split: fraction of trades in the train slice.
    pub train_fraction: f64,
    /// Friction ratio above which a trade is flagged.
    pub friction_ceiling: f64,
    /// |train expectancy| below this is treated as a zero denominator
    /// when computing walk-forward retention.
    pub retention_epsilon: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            min_sample_size: 30,
            min_expectancy: 0.10,
            stress_marginal: 0.25,
            stress_full: 0.50,
            min_bucket_trades: 10,
            train_fraction: 0.7,
            friction_ceiling: 0.20,
            retention_epsilon: 0.01,
        }
    }
}

impl GateThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_sample_size == 0 {
            return Err(ConfigError::Invalid(
                "min_sample_size must be >= 1".into(),
            ));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "train_fraction must be in (0, 1), got {}",
                self.train_fraction
            )));
        }
        if self.stress_marginal < 0.0 || self.stress_full < self.stress_marginal {
            return Err(ConfigError::Invalid(format!(
                "stress levels must satisfy 0 <= marginal <= full, got {} / {}",
                self.stress_marginal, self.stress_full
            )));
        }
        if self.friction_ceiling <= 0.0 {
            return Err(ConfigError::Invalid(
                "friction_ceiling must be > 0".into(),
            ));
        }
        if self.retention_epsilon <= 0.0 {
            return Err(ConfigError::Invalid(
                "retention_epsilon must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// One complete validation run, as loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub strategy: StrategyDefinition,
    pub instrument: InstrumentSpec,
    #[serde(default)]
    pub thresholds: GateThresholds,
    pub from: chrono::NaiveDate,
    pub to: chrono::NaiveDate,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.instrument
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.thresholds.validate()?;
        if self.strategy.symbol != self.instrument.symbol {
            return Err(ConfigError::Invalid(format!(
                "strategy symbol {} does not match instrument {}",
                self.strategy.symbol, self.instrument.symbol
            )));
        }
        if self.from > self.to {
            return Err(ConfigError::Invalid(format!(
                "date range is inverted: {} > {}",
                self.from, self.to
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
