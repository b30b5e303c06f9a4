//! Artifact export — verdict JSON, trade CSV, and a plain-text summary
//! per validation run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use edgelab_core::sim::SeriesResult;

use crate::lifecycle::ValidationRun;
use crate::verdict::{PhaseStatus, ValidationVerdict};

/// Write all artifacts for one run under `out_dir/<run id prefix>/`.
///
/// Layout:
/// - `verdict.json` — the full ValidationRun, pretty-printed
/// - `trades.csv`   — every simulated trade, resolved or not
/// - `summary.txt`  — human-readable phase table
pub fn save_artifacts(
    out_dir: &Path,
    run: &ValidationRun,
    series: &SeriesResult,
) -> Result<PathBuf> {
    let dir = out_dir.join(run.run_id.short());
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let verdict_json = serde_json::to_string_pretty(run)?;
    fs::write(dir.join("verdict.json"), verdict_json)?;

    write_trades_csv(&dir.join("trades.csv"), series)?;

    fs::write(dir.join("summary.txt"), render_summary(&run.verdict))?;

    info!(dir = %dir.display(), "artifacts saved");
    Ok(dir)
}

fn write_trades_csv(path: &Path, series: &SeriesResult) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for trade in &series.sample.trades {
        writer.serialize(trade)?;
    }
    writer.flush()?;
    Ok(())
}

/// Plain-text phase table plus the final classification.
pub fn render_summary(verdict: &ValidationVerdict) -> String {
    let mut out = String::new();

    for report in &verdict.phases {
        let status = match report.status {
            PhaseStatus::Passed => "PASS",
            PhaseStatus::Warned => "WARN",
            PhaseStatus::Failed => "FAIL",
            PhaseStatus::NotEvaluated => "SKIP",
        };
        out.push_str(&format!(
            "{:<14} {:<5} {}\n",
            report.phase.name(),
            status,
            report.detail
        ));
    }

    out.push_str(&format!("\nclassification: {:?}\n", verdict.classification));
    if let Some(reason) = &verdict.reject_reason {
        out.push_str(&format!("reason: {reason}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::EdgeStatus;
    use crate::verdict::{
        Classification, GateDiagnostics, Phase, PhaseReport, RejectReason,
    };
    use chrono::NaiveDate;
    use edgelab_core::domain::{EdgeId, RunId, SimulatedTrade, TradeDirection, TradeOutcome};
    use edgelab_core::sample::Sample;
    use tempfile::TempDir;

    fn sample_run() -> (ValidationRun, SeriesResult) {
        let edge_id = EdgeId::from_bytes(b"report-test");
        let at = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();

        let verdict = ValidationVerdict {
            classification: Classification::Rejected,
            phases: vec![
                PhaseReport {
                    phase: Phase::SampleSize,
                    status: PhaseStatus::Failed,
                    detail: "2 resolved trades < minimum 30".into(),
                },
                PhaseReport {
                    phase: Phase::Expectancy,
                    status: PhaseStatus::NotEvaluated,
                    detail: String::new(),
                },
            ],
            reject_reason: Some(RejectReason::SampleTooSmall {
                count: 2,
                minimum: 30,
            }),
            diagnostics: GateDiagnostics::default(),
        };

        let mut sample = Sample::new(edge_id.clone());
        sample.push(SimulatedTrade {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            direction: TradeDirection::Long,
            entry: 2688.0,
            entry_real: 2688.1,
            stop: 2686.75,
            target: 2689.875,
            outcome: TradeOutcome::Win,
            bars_to_resolution: 3,
            canonical_r: Some(1.5),
            real_r: Some(1.4),
            friction_ratio: 0.05,
            friction_flagged: false,
            range_size: 2.5,
        });
        sample.push(SimulatedTrade {
            date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            direction: TradeDirection::Short,
            entry: 2684.0,
            entry_real: 2683.9,
            stop: 2685.25,
            target: 2682.125,
            outcome: TradeOutcome::NoOutcome,
            bars_to_resolution: 12,
            canonical_r: None,
            real_r: None,
            friction_ratio: 0.05,
            friction_flagged: false,
            range_size: 2.5,
        });

        let run = ValidationRun {
            run_id: RunId::derive(&edge_id, at),
            edge_id,
            at,
            verdict,
            status_before: EdgeStatus::NeverTested,
            status_after: EdgeStatus::TestedFailed,
        };
        let series = SeriesResult {
            sample,
            days: vec![],
        };
        (run, series)
    }

    #[test]
    fn artifacts_written() {
        let tmp = TempDir::new().unwrap();
        let (run, series) = sample_run();

        let dir = save_artifacts(tmp.path(), &run, &series).unwrap();

        assert!(dir.join("verdict.json").exists());
        assert!(dir.join("trades.csv").exists());
        assert!(dir.join("summary.txt").exists());

        // Verdict roundtrips.
        let text = fs::read_to_string(dir.join("verdict.json")).unwrap();
        let loaded: ValidationRun = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.run_id, run.run_id);

        // CSV holds both trades, including the unresolved one.
        let csv_text = fs::read_to_string(dir.join("trades.csv")).unwrap();
        assert_eq!(csv_text.lines().count(), 3); // header + 2 rows
    }

    #[test]
    fn summary_shows_status_per_phase() {
        let (run, _) = sample_run();
        let summary = render_summary(&run.verdict);

        assert!(summary.contains("sample_size"));
        assert!(summary.contains("FAIL"));
        assert!(summary.contains("SKIP"));
        assert!(summary.contains("classification: Rejected"));
        assert!(summary.contains("sample too small"));
    }
}
