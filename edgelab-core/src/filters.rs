//! Setup filters — a closed set of per-day gating predicates.
//!
//! Filters are tagged variants over a `DayContext`, not injected
//! predicates: adding a filter means extending the enum. Every variant
//! answers `applies(ctx) -> bool` from information available before the
//! breakout scan starts, so filters cannot introduce lookahead.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::OpeningRange;

/// Direction of a completed prior session (close vs open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionType {
    Up,
    Down,
    Flat,
}

impl SessionType {
    pub fn classify(open: f64, close: f64) -> Self {
        if close > open {
            SessionType::Up
        } else if close < open {
            SessionType::Down
        } else {
            SessionType::Flat
        }
    }
}

/// What a filter may inspect for one trading day.
///
/// `volatility_reference` is a trailing average of prior sessions' range
/// sizes, computed by the caller from completed days only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayContext {
    pub date: NaiveDate,
    pub range: OpeningRange,
    pub volatility_reference: Option<f64>,
    pub prior_session: Option<SessionType>,
}

/// The closed filter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SetupFilter {
    /// Range size relative to the volatility reference must fall in
    /// `[min_ratio, max_ratio]`. Days without a reference yet are skipped.
    RangeSize { min_ratio: f64, max_ratio: f64 },
    /// Prior session must have closed in the given direction.
    PriorSession { session: SessionType },
    /// Volatility reference itself must fall in the given bounds (points).
    Regime {
        min_reference: Option<f64>,
        max_reference: Option<f64>,
    },
}

impl SetupFilter {
    /// Whether the day qualifies under this filter.
    ///
    /// A filter whose required context is not yet available (no prior
    /// session, no volatility reference) rejects the day: the condition
    /// cannot be verified, so the day is not traded.
    pub fn applies(&self, ctx: &DayContext) -> bool {
        match self {
            SetupFilter::RangeSize {
                min_ratio,
                max_ratio,
            } => match ctx.volatility_reference {
                Some(reference) if reference > 0.0 => {
                    let ratio = ctx.range.size() / reference;
                    ratio >= *min_ratio && ratio <= *max_ratio
                }
                _ => false,
            },
            SetupFilter::PriorSession { session } => ctx.prior_session == Some(*session),
            SetupFilter::Regime {
                min_reference,
                max_reference,
            } => match ctx.volatility_reference {
                Some(reference) => {
                    min_reference.map_or(true, |min| reference >= min)
                        && max_reference.map_or(true, |max| reference <= max)
                }
                None => false,
            },
        }
    }
}
