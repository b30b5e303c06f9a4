//! EdgeLab CLI — validate, sweep, and edge store commands.
//!
//! Commands:
//! - `validate` — run one strategy definition through the full pipeline
//! - `sweep`    — grid-search strategy parameters over one bar file
//! - `edges`    — list the edge store with statuses and run counts

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use edgelab_runner::{
    load_bars_csv, ranked, render_summary, run_sweep, run_validation, save_artifacts,
    CsvBarReader, EdgeLifecycle, JsonlStore, ParamGrid, ResultStore, RunConfig,
};

#[derive(Parser)]
#[command(name = "edgelab", about = "EdgeLab — opening-range breakout validation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one strategy definition against a bar file.
    Validate {
        /// Path to a TOML run config (strategy, instrument, thresholds).
        #[arg(long)]
        config: PathBuf,

        /// Minute-bar CSV file (ts,open,high,low,close,volume).
        #[arg(long)]
        bars: PathBuf,

        /// Edge store directory.
        #[arg(long, default_value = "store")]
        store_dir: PathBuf,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        out_dir: PathBuf,
    },
    /// Grid-search strategy parameters over a bar file.
    Sweep {
        /// Path to a TOML run config; an optional [grid] table overrides
        /// the default parameter grid.
        #[arg(long)]
        config: PathBuf,

        /// Minute-bar CSV file.
        #[arg(long)]
        bars: PathBuf,

        /// Show only the top N candidates.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// List the edge store.
    Edges {
        /// Edge store directory.
        #[arg(long, default_value = "store")]
        store_dir: PathBuf,
    },
}

/// Optional `[grid]` table alongside the run config.
#[derive(Debug, Deserialize)]
struct GridSection {
    #[serde(default)]
    grid: ParamGrid,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate {
            config,
            bars,
            store_dir,
            out_dir,
        } => validate(config, bars, store_dir, out_dir),
        Commands::Sweep { config, bars, top } => sweep(config, bars, top),
        Commands::Edges { store_dir } => edges(store_dir),
    }
}

fn validate(config: PathBuf, bars: PathBuf, store_dir: PathBuf, out_dir: PathBuf) -> Result<()> {
    let run_config = RunConfig::load(&config)
        .with_context(|| format!("loading config {}", config.display()))?;
    let reader = CsvBarReader::open(&run_config.strategy.symbol, &bars)
        .with_context(|| format!("loading bars {}", bars.display()))?;
    let store = JsonlStore::open(&store_dir)?;

    let at = chrono::Utc::now().naive_utc();
    let outcome = run_validation(&run_config, &reader, &store, at)?;

    println!("edge:  {}", outcome.run.edge_id);
    println!("run:   {}", outcome.run.run_id.short());
    println!(
        "state: {:?} -> {:?}",
        outcome.run.status_before, outcome.run.status_after
    );
    println!();
    print!("{}", render_summary(&outcome.run.verdict));

    let dir = save_artifacts(&out_dir, &outcome.run, &outcome.series)?;
    println!("\nartifacts: {}", dir.display());
    Ok(())
}

fn sweep(config: PathBuf, bars: PathBuf, top: usize) -> Result<()> {
    let run_config = RunConfig::load(&config)
        .with_context(|| format!("loading config {}", config.display()))?;
    let text = std::fs::read_to_string(&config)?;
    let grid = toml::from_str::<GridSection>(&text)
        .map(|s| s.grid)
        .unwrap_or_default();

    let bar_series = load_bars_csv(&bars)?;
    let outcomes = run_sweep(
        &grid,
        &run_config.strategy,
        &bar_series,
        &run_config.instrument,
        &run_config.thresholds,
    )?;

    let total = outcomes.len();
    let best = ranked(outcomes);
    println!(
        "{total} candidates evaluated, showing top {}",
        top.min(total)
    );
    println!(
        "{:<14} {:>6} {:>4} {:>5} {:>7} {:>7}  {}",
        "edge", "stop_f", "rr", "conf", "trades", "exp(R)", "class"
    );
    for outcome in best.iter().take(top) {
        println!(
            "{:<14} {:>6.2} {:>4.1} {:>5} {:>7} {:>7} {:?}",
            outcome.edge_id.short(),
            outcome.definition.stop_fraction,
            outcome.definition.reward_risk,
            outcome.definition.confirmation_bars,
            outcome.sample_size,
            outcome
                .expectancy
                .map(|e| format!("{e:.3}"))
                .unwrap_or_else(|| "-".into()),
            outcome.verdict.classification,
        );
    }
    Ok(())
}

fn edges(store_dir: PathBuf) -> Result<()> {
    let store = JsonlStore::open(&store_dir)?;
    let lifecycle = EdgeLifecycle::new(&store);
    let records = store.list_edges()?;

    if records.is_empty() {
        println!("store is empty");
        return Ok(());
    }

    println!("{:<14} {:<13} {:>5}  {}", "edge", "status", "runs", "created");
    for record in records {
        let runs = lifecycle.runs(&record.id)?.len();
        println!(
            "{:<14} {:<13} {:>5}  {}",
            record.id.short(),
            format!("{:?}", record.status),
            runs,
            record.created_at
        );
    }
    Ok(())
}
