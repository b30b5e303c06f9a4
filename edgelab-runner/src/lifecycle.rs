//! Edge lifecycle — the status state machine and its append-only run log.
//!
//! Transitions go through an explicit table; anything outside it is
//! rejected. Every validation appends an immutable `ValidationRun`
//! linking the edge to the verdict that moved it — a verdict is never
//! overwritten in place. The status is re-read immediately before each
//! transition (optimistic single-writer check), so concurrent sweeps
//! cannot silently clobber each other's updates.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use edgelab_core::domain::{EdgeId, RunId};
use edgelab_core::strategy::StrategyDefinition;

use crate::store::{ResultStore, StoreError};
use crate::verdict::{Classification, ValidationVerdict};

/// Where an edge stands in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeStatus {
    NeverTested,
    TestedFailed,
    Validated,
    Promoted,
    Retired,
}

/// The transition table. Everything not listed is illegal.
///
/// Re-validating an already-tested edge may land on the same status
/// (a fresh run is still appended) or flip it when conditions changed.
pub fn can_transition(from: EdgeStatus, to: EdgeStatus) -> bool {
    use EdgeStatus::*;
    matches!(
        (from, to),
        (NeverTested, TestedFailed)
            | (NeverTested, Validated)
            | (TestedFailed, TestedFailed)
            | (TestedFailed, Validated)
            | (TestedFailed, Retired)
            | (Validated, Validated)
            | (Validated, TestedFailed)
            | (Validated, Promoted)
            | (Validated, Retired)
            | (Promoted, Retired)
    )
}

/// A registered candidate edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub definition: StrategyDefinition,
    pub status: EdgeStatus,
    pub created_at: NaiveDateTime,
}

/// Immutable record of one validation run and the transition it caused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRun {
    pub run_id: RunId,
    pub edge_id: EdgeId,
    pub at: NaiveDateTime,
    pub verdict: ValidationVerdict,
    pub status_before: EdgeStatus,
    pub status_after: EdgeStatus,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("unknown edge: {0}")]
    UnknownEdge(EdgeId),

    #[error("illegal transition {from:?} -> {to:?}")]
    InvalidTransition { from: EdgeStatus, to: EdgeStatus },

    #[error("stale status: expected {expected:?}, store holds {found:?}")]
    StaleStatus {
        expected: EdgeStatus,
        found: EdgeStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Lifecycle operations over a result store.
pub struct EdgeLifecycle<'a, S: ResultStore> {
    store: &'a S,
}

impl<'a, S: ResultStore> EdgeLifecycle<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Register a definition, creating a `NeverTested` record if the edge
    /// is new. Returns the stored record either way.
    pub fn register(
        &self,
        definition: &StrategyDefinition,
        at: NaiveDateTime,
    ) -> Result<EdgeRecord, LifecycleError> {
        let id = definition.edge_id();
        if let Some(existing) = self.store.get_edge(&id)? {
            return Ok(existing);
        }
        let record = EdgeRecord {
            id: id.clone(),
            definition: definition.clone(),
            status: EdgeStatus::NeverTested,
            created_at: at,
        };
        self.store.put_edge(&record)?;
        info!(edge_id = %id.short(), "edge registered");
        Ok(record)
    }

    /// Apply a validation verdict: transition the edge and append the run.
    ///
    /// The stored status is re-read here, not taken from the caller, and
    /// the update is compare-and-set against that read — a concurrent
    /// writer surfaces as `StaleStatus` instead of a lost update.
    pub fn record_validation(
        &self,
        edge_id: &EdgeId,
        verdict: ValidationVerdict,
        at: NaiveDateTime,
    ) -> Result<ValidationRun, LifecycleError> {
        let record = self
            .store
            .get_edge(edge_id)?
            .ok_or_else(|| LifecycleError::UnknownEdge(edge_id.clone()))?;

        let target = match verdict.classification {
            Classification::Approved => EdgeStatus::Validated,
            // Marginal edges are not safe to promote; they park as failed
            // with the full verdict retained in the run record.
            Classification::Marginal | Classification::Rejected => EdgeStatus::TestedFailed,
        };

        if !can_transition(record.status, target) {
            return Err(LifecycleError::InvalidTransition {
                from: record.status,
                to: target,
            });
        }

        self.update_guarded(edge_id, record.status, target)?;

        let run = ValidationRun {
            run_id: RunId::derive(edge_id, at),
            edge_id: edge_id.clone(),
            at,
            verdict,
            status_before: record.status,
            status_after: target,
        };
        self.store.append_run(&run)?;
        info!(
            edge_id = %edge_id.short(),
            from = ?record.status,
            to = ?target,
            "validation recorded"
        );
        Ok(run)
    }

    /// Promote a validated edge. An explicit external action — the gate
    /// never calls this.
    pub fn promote(&self, edge_id: &EdgeId) -> Result<EdgeRecord, LifecycleError> {
        self.transition_to(edge_id, EdgeStatus::Promoted)
    }

    /// Retire an edge. Terminal.
    pub fn retire(&self, edge_id: &EdgeId) -> Result<EdgeRecord, LifecycleError> {
        self.transition_to(edge_id, EdgeStatus::Retired)
    }

    /// Full run history for an edge, in append order.
    pub fn runs(&self, edge_id: &EdgeId) -> Result<Vec<ValidationRun>, LifecycleError> {
        Ok(self.store.runs_for_edge(edge_id)?)
    }

    fn transition_to(
        &self,
        edge_id: &EdgeId,
        target: EdgeStatus,
    ) -> Result<EdgeRecord, LifecycleError> {
        let record = self
            .store
            .get_edge(edge_id)?
            .ok_or_else(|| LifecycleError::UnknownEdge(edge_id.clone()))?;

        if !can_transition(record.status, target) {
            return Err(LifecycleError::InvalidTransition {
                from: record.status,
                to: target,
            });
        }
        self.update_guarded(edge_id, record.status, target)?;
        info!(edge_id = %edge_id.short(), from = ?record.status, to = ?target, "edge transition");

        Ok(EdgeRecord {
            status: target,
            ..record
        })
    }

    fn update_guarded(
        &self,
        edge_id: &EdgeId,
        expected: EdgeStatus,
        target: EdgeStatus,
    ) -> Result<(), LifecycleError> {
        match self.store.update_status(edge_id, expected, target) {
            Ok(()) => Ok(()),
            Err(StoreError::StatusConflict { expected, found }) => {
                Err(LifecycleError::StaleStatus { expected, found })
            }
            Err(e) => Err(e.into()),
        }
    }
}
