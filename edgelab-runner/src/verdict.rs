//! Verdict types — the gate's phase-by-phase, machine-readable output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final classification of a candidate edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Approved,
    Marginal,
    Rejected,
}

/// The gate's checking phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    SampleSize,
    Expectancy,
    CostStress,
    Temporal,
    WalkForward,
    Regime,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::SampleSize,
        Phase::Expectancy,
        Phase::CostStress,
        Phase::Temporal,
        Phase::WalkForward,
        Phase::Regime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::SampleSize => "sample_size",
            Phase::Expectancy => "expectancy",
            Phase::CostStress => "cost_stress",
            Phase::Temporal => "temporal",
            Phase::WalkForward => "walk_forward",
            Phase::Regime => "regime",
        }
    }
}

/// Outcome of one phase.
///
/// `NotEvaluated` is reported explicitly for phases skipped after a hard
/// rejection — a phase never reports `Passed` without having run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseStatus {
    Passed,
    /// Ran, found a soft concern; does not reject on its own.
    Warned,
    Failed,
    NotEvaluated,
}

/// One entry of the phase-by-phase audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub detail: String,
}

/// Machine-readable rejection cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectReason {
    SampleTooSmall {
        count: usize,
        minimum: usize,
    },
    ExpectancyBelowThreshold {
        expectancy: f64,
        minimum: f64,
    },
    /// Expectancy fell below threshold at the given stress multiplier.
    FailedCostStress {
        stress: f64,
        expectancy: f64,
        minimum: f64,
    },
    /// Out-of-sample slice lost money: the overfit signature.
    OosExpectancyNegative {
        test_expectancy: f64,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::SampleTooSmall { count, minimum } => {
                write!(f, "sample too small: {count} trades < minimum {minimum}")
            }
            RejectReason::ExpectancyBelowThreshold {
                expectancy,
                minimum,
            } => write!(
                f,
                "expectancy {expectancy:.3}R below threshold {minimum:.3}R"
            ),
            RejectReason::FailedCostStress {
                stress,
                expectancy,
                minimum,
            } => write!(
                f,
                "expectancy {expectancy:.3}R below {minimum:.3}R at +{:.0}% cost stress",
                stress * 100.0
            ),
            RejectReason::OosExpectancyNegative { test_expectancy } => write!(
                f,
                "out-of-sample expectancy {test_expectancy:.3}R is negative"
            ),
        }
    }
}

// ─── Diagnostics ─────────────────────────────────────────────────────

/// How far the sample survived the cost-stress ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressSurvival {
    /// Held the threshold at the full stress level.
    Full,
    /// Held only at the reduced stress level: caps classification at Marginal.
    QuarterOnly,
    Failed,
}

/// Expectancies across the stress ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressDiagnostics {
    pub nominal: f64,
    pub quarter: f64,
    pub half: f64,
    pub survival: StressSurvival,
    /// Trades whose friction ratio exceeded the ceiling.
    pub flagged_trades: usize,
}

/// Expectancy of one calendar-year bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalBucket {
    pub year: i32,
    pub trades: usize,
    /// None when the bucket has too few trades to evaluate.
    pub expectancy: Option<f64>,
}

/// Why the walk-forward retention ratio was or was not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetentionFlag {
    Normal,
    /// Train expectancy too close to zero for a meaningful ratio.
    TrainNearZero,
    /// Train expectancy negative; ratio skipped entirely.
    TrainNegative,
}

/// Chronological train/test split result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardDiagnostics {
    pub train_trades: usize,
    pub test_trades: usize,
    pub train_expectancy: f64,
    pub test_expectancy: f64,
    /// test / train expectancy. None per `retention_flag`.
    pub retention: Option<f64>,
    pub retention_flag: RetentionFlag,
}

/// Low/high-volatility split at the median session range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeDiagnostics {
    pub median_range: f64,
    pub low_trades: usize,
    pub high_trades: usize,
    pub low_expectancy: Option<f64>,
    pub high_expectancy: Option<f64>,
}

/// Everything the gate measured, independent of pass/fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GateDiagnostics {
    pub sample_size: usize,
    pub expectancy: Option<f64>,
    pub stress: Option<StressDiagnostics>,
    pub temporal: Vec<TemporalBucket>,
    pub walk_forward: Option<WalkForwardDiagnostics>,
    pub regime: Option<RegimeDiagnostics>,
}

/// The complete, immutable result of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub classification: Classification,
    pub phases: Vec<PhaseReport>,
    pub reject_reason: Option<RejectReason>,
    pub diagnostics: GateDiagnostics,
}

impl ValidationVerdict {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn is_approved(&self) -> bool {
        self.classification == Classification::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_reason_display() {
        let reason = RejectReason::SampleTooSmall {
            count: 12,
            minimum: 30,
        };
        assert_eq!(reason.to_string(), "sample too small: 12 trades < minimum 30");

        let reason = RejectReason::FailedCostStress {
            stress: 0.25,
            expectancy: 0.04,
            minimum: 0.15,
        };
        assert!(reason.to_string().contains("+25%"));
    }

    #[test]
    fn reject_reason_serializes_with_code_tag() {
        let reason = RejectReason::OosExpectancyNegative {
            test_expectancy: -0.08,
        };
        let json = serde_json::to_string(&reason).unwrap();
        assert!(json.contains("\"code\":\"oos_expectancy_negative\""));

        let deser: RejectReason = serde_json::from_str(&json).unwrap();
        assert_eq!(reason, deser);
    }

    #[test]
    fn phase_lookup() {
        let verdict = ValidationVerdict {
            classification: Classification::Rejected,
            phases: vec![PhaseReport {
                phase: Phase::SampleSize,
                status: PhaseStatus::Failed,
                detail: "12 < 30".into(),
            }],
            reject_reason: Some(RejectReason::SampleTooSmall {
                count: 12,
                minimum: 30,
            }),
            diagnostics: GateDiagnostics::default(),
        };
        assert_eq!(
            verdict.phase(Phase::SampleSize).unwrap().status,
            PhaseStatus::Failed
        );
        assert!(verdict.phase(Phase::Regime).is_none());
        assert!(!verdict.is_approved());
    }

    #[test]
    fn phase_names_are_stable() {
        assert_eq!(Phase::ALL.len(), 6);
        assert_eq!(Phase::WalkForward.name(), "walk_forward");
    }

    #[test]
    fn verdict_serialization_roundtrip() {
        let verdict = ValidationVerdict {
            classification: Classification::Marginal,
            phases: Phase::ALL
                .iter()
                .map(|&phase| PhaseReport {
                    phase,
                    status: PhaseStatus::Passed,
                    detail: String::new(),
                })
                .collect(),
            reject_reason: None,
            diagnostics: GateDiagnostics::default(),
        };
        let json = serde_json::to_string(&verdict).unwrap();
        let deser: ValidationVerdict = serde_json::from_str(&json).unwrap();
        assert_eq!(verdict, deser);
    }
}
