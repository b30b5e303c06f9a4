//! Parameter sweep — grid search over strategy parameters.
//!
//! Every combination is independent, so the sweep fans out across worker
//! threads and merges results by simple concatenation: no shared
//! counters, no locks. Store writes stay with the caller, preserving the
//! single-writer rule per edge id.

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use edgelab_core::costs::CostModel;
use edgelab_core::domain::{Bar, EdgeId, InstrumentSpec};
use edgelab_core::sim::run_series;
use edgelab_core::strategy::{EntryRule, StrategyDefinition};

use crate::config::GateThresholds;
use crate::gate::run_gate;
use crate::verdict::{Classification, ValidationVerdict};

/// Parameter grid: the cartesian product of the listed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub stop_fractions: Vec<f64>,
    pub reward_risks: Vec<f64>,
    pub confirmation_bars: Vec<u32>,
    pub entry_rules: Vec<EntryRule>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            stop_fractions: vec![0.25, 0.5, 0.75, 1.0],
            reward_risks: vec![1.0, 1.5, 2.0, 3.0],
            confirmation_bars: vec![1, 2],
            entry_rules: vec![EntryRule::CloseThrough],
        }
    }
}

impl ParamGrid {
    /// Upper bound on combinations (before invalid combos are skipped).
    pub fn size(&self) -> usize {
        self.stop_fractions.len()
            * self.reward_risks.len()
            * self.confirmation_bars.len()
            * self.entry_rules.len()
    }

    /// All valid definitions derived from `base`.
    ///
    /// Combinations failing validation (e.g. boundary-touch with a
    /// confirmation count) are skipped, mirroring how a grid skips
    /// short >= long in a crossover sweep.
    pub fn definitions(&self, base: &StrategyDefinition) -> Vec<StrategyDefinition> {
        let mut definitions = Vec::with_capacity(self.size());

        for &stop_fraction in &self.stop_fractions {
            for &reward_risk in &self.reward_risks {
                for &confirmation_bars in &self.confirmation_bars {
                    for &entry_rule in &self.entry_rules {
                        let candidate = StrategyDefinition {
                            stop_fraction,
                            reward_risk,
                            confirmation_bars,
                            entry_rule,
                            ..base.clone()
                        };
                        if candidate.validate().is_ok() {
                            definitions.push(candidate);
                        }
                    }
                }
            }
        }

        definitions
    }
}

/// One candidate's result in a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub definition: StrategyDefinition,
    pub edge_id: EdgeId,
    pub sample_size: usize,
    pub expectancy: Option<f64>,
    pub verdict: ValidationVerdict,
}

/// Run every grid combination against one bar series.
///
/// The bar series is shared read-only across workers; results come back
/// in grid order regardless of scheduling.
pub fn run_sweep(
    grid: &ParamGrid,
    base: &StrategyDefinition,
    bars: &[Bar],
    instrument: &InstrumentSpec,
    thresholds: &GateThresholds,
) -> Result<Vec<SweepOutcome>> {
    let definitions = grid.definitions(base);
    info!(
        candidates = definitions.len(),
        bars = bars.len(),
        "starting sweep"
    );

    let costs = CostModel::from_spec(instrument, thresholds.friction_ceiling);

    let outcomes: Vec<SweepOutcome> = definitions
        .par_iter()
        .map(|definition| {
            let series = run_series(bars, definition, &costs)?;
            let verdict = run_gate(&series.sample, thresholds);
            Ok(SweepOutcome {
                edge_id: definition.edge_id(),
                definition: definition.clone(),
                sample_size: series.sample.resolved_len(),
                expectancy: series.sample.expectancy(),
                verdict,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(outcomes)
}

/// Sort outcomes best-first: Approved, then Marginal, then Rejected,
/// ties broken by expectancy descending.
pub fn ranked(mut outcomes: Vec<SweepOutcome>) -> Vec<SweepOutcome> {
    fn class_rank(c: Classification) -> u8 {
        match c {
            Classification::Approved => 0,
            Classification::Marginal => 1,
            Classification::Rejected => 2,
        }
    }

    outcomes.sort_by(|a, b| {
        class_rank(a.verdict.classification)
            .cmp(&class_rank(b.verdict.classification))
            .then_with(|| {
                let ea = a.expectancy.unwrap_or(f64::NEG_INFINITY);
                let eb = b.expectancy.unwrap_or(f64::NEG_INFINITY);
                eb.partial_cmp(&ea).unwrap_or(std::cmp::Ordering::Equal)
            })
    });
    outcomes
}
