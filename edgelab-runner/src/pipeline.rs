//! Validation pipeline — bars in, recorded verdict out.
//!
//! Wires the collaborators together: read bars once up front, replay the
//! series, run the gate, and record the lifecycle transition. All I/O
//! happens at the edges; the simulation itself stays pure.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::{debug, info};

use edgelab_core::costs::CostModel;
use edgelab_core::provider::BarReader;
use edgelab_core::sim::{run_series, DayOutcome, SeriesResult};

use crate::config::RunConfig;
use crate::gate::run_gate;
use crate::lifecycle::{EdgeLifecycle, ValidationRun};
use crate::store::ResultStore;

/// Result of one end-to-end validation: the recorded run plus the full
/// simulation output backing it.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub run: ValidationRun,
    pub series: SeriesResult,
}

/// Validate one strategy definition end to end.
pub fn run_validation<S: ResultStore>(
    config: &RunConfig,
    reader: &dyn BarReader,
    store: &S,
    at: NaiveDateTime,
) -> Result<ValidationOutcome> {
    config.validate()?;

    let bars = reader
        .read_bars(&config.strategy.symbol, config.from, config.to)
        .with_context(|| format!("reading bars for {}", config.strategy.symbol))?;
    info!(
        symbol = %config.strategy.symbol,
        bars = bars.len(),
        from = %config.from,
        to = %config.to,
        "starting validation"
    );

    let costs = CostModel::from_spec(&config.instrument, config.thresholds.friction_ceiling);
    let series = run_series(&bars, &config.strategy, &costs)?;
    for record in &series.days {
        if let DayOutcome::Excluded(reason) = &record.outcome {
            debug!(date = %record.date, ?reason, "day excluded");
        }
    }
    let verdict = run_gate(&series.sample, &config.thresholds);

    let lifecycle = EdgeLifecycle::new(store);
    let edge = lifecycle.register(&config.strategy, at)?;
    let run = lifecycle.record_validation(&edge.id, verdict, at)?;

    info!(
        edge_id = %edge.id.short(),
        classification = ?run.verdict.classification,
        trades = series.sample.resolved_len(),
        "validation recorded"
    );

    Ok(ValidationOutcome { run, series })
}
