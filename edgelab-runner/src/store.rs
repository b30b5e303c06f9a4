//! Result store — persistence seam for edge records and validation runs.
//!
//! The pipeline needs only keyed insert/lookup, a compare-and-set status
//! update, and an append-only run log. `MemoryStore` backs tests;
//! `JsonlStore` persists edges as a JSON snapshot and runs as JSONL, one
//! object per line, resilient to partial writes and easy to stream.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use edgelab_core::domain::EdgeId;

use crate::lifecycle::{EdgeRecord, EdgeStatus, ValidationRun};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown edge: {0}")]
    UnknownEdge(String),

    #[error("status conflict: expected {expected:?}, found {found:?}")]
    StatusConflict {
        expected: EdgeStatus,
        found: EdgeStatus,
    },
}

/// Persistence operations the lifecycle requires. No schema details leak
/// through this trait.
pub trait ResultStore {
    fn put_edge(&self, record: &EdgeRecord) -> Result<(), StoreError>;

    fn get_edge(&self, id: &EdgeId) -> Result<Option<EdgeRecord>, StoreError>;

    /// Compare-and-set: fails with `StatusConflict` unless the stored
    /// status equals `expected`. The single-writer guarantee per edge id.
    fn update_status(
        &self,
        id: &EdgeId,
        expected: EdgeStatus,
        new: EdgeStatus,
    ) -> Result<(), StoreError>;

    /// Append one run to the immutable log.
    fn append_run(&self, run: &ValidationRun) -> Result<(), StoreError>;

    /// All runs for an edge, in append order.
    fn runs_for_edge(&self, id: &EdgeId) -> Result<Vec<ValidationRun>, StoreError>;

    /// Every stored edge record.
    fn list_edges(&self) -> Result<Vec<EdgeRecord>, StoreError>;
}

// ─── In-memory store ─────────────────────────────────────────────────

/// HashMap-backed store for tests and single-process sweeps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    edges: Mutex<HashMap<String, EdgeRecord>>,
    runs: Mutex<Vec<ValidationRun>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryStore {
    fn put_edge(&self, record: &EdgeRecord) -> Result<(), StoreError> {
        let mut edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        edges.insert(record.id.as_str().to_string(), record.clone());
        Ok(())
    }

    fn get_edge(&self, id: &EdgeId) -> Result<Option<EdgeRecord>, StoreError> {
        let edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        Ok(edges.get(id.as_str()).cloned())
    }

    fn update_status(
        &self,
        id: &EdgeId,
        expected: EdgeStatus,
        new: EdgeStatus,
    ) -> Result<(), StoreError> {
        let mut edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        let record = edges
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::UnknownEdge(id.as_str().to_string()))?;
        if record.status != expected {
            return Err(StoreError::StatusConflict {
                expected,
                found: record.status,
            });
        }
        record.status = new;
        Ok(())
    }

    fn append_run(&self, run: &ValidationRun) -> Result<(), StoreError> {
        let mut runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        runs.push(run.clone());
        Ok(())
    }

    fn runs_for_edge(&self, id: &EdgeId) -> Result<Vec<ValidationRun>, StoreError> {
        let runs = self.runs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(runs.iter().filter(|r| &r.edge_id == id).cloned().collect())
    }

    fn list_edges(&self) -> Result<Vec<EdgeRecord>, StoreError> {
        let edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<EdgeRecord> = edges.values().cloned().collect();
        all.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(all)
    }
}

// ─── JSONL store ─────────────────────────────────────────────────────

/// File-backed store: `edges.json` snapshot plus `runs.jsonl` append-only
/// log under one directory.
#[derive(Debug)]
pub struct JsonlStore {
    dir: PathBuf,
    edges: Mutex<HashMap<String, EdgeRecord>>,
}

impl JsonlStore {
    /// Open (or create) a store directory, loading any existing snapshot.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let edges_path = dir.join("edges.json");
        let edges = if edges_path.exists() {
            let text = fs::read_to_string(&edges_path)?;
            let records: Vec<EdgeRecord> = serde_json::from_str(&text)?;
            records
                .into_iter()
                .map(|r| (r.id.as_str().to_string(), r))
                .collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            dir,
            edges: Mutex::new(edges),
        })
    }

    fn edges_path(&self) -> PathBuf {
        self.dir.join("edges.json")
    }

    fn runs_path(&self) -> PathBuf {
        self.dir.join("runs.jsonl")
    }

    fn persist_edges(&self, edges: &HashMap<String, EdgeRecord>) -> Result<(), StoreError> {
        let mut records: Vec<&EdgeRecord> = edges.values().collect();
        records.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(self.edges_path(), json)?;
        Ok(())
    }
}

impl ResultStore for JsonlStore {
    fn put_edge(&self, record: &EdgeRecord) -> Result<(), StoreError> {
        let mut edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        edges.insert(record.id.as_str().to_string(), record.clone());
        self.persist_edges(&edges)
    }

    fn get_edge(&self, id: &EdgeId) -> Result<Option<EdgeRecord>, StoreError> {
        let edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        Ok(edges.get(id.as_str()).cloned())
    }

    fn update_status(
        &self,
        id: &EdgeId,
        expected: EdgeStatus,
        new: EdgeStatus,
    ) -> Result<(), StoreError> {
        let mut edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        let record = edges
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::UnknownEdge(id.as_str().to_string()))?;
        if record.status != expected {
            return Err(StoreError::StatusConflict {
                expected,
                found: record.status,
            });
        }
        record.status = new;
        self.persist_edges(&edges)
    }

    fn append_run(&self, run: &ValidationRun) -> Result<(), StoreError> {
        let json = serde_json::to_string(run)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.runs_path())?;
        writeln!(file, "{json}")?;
        file.flush()?;
        Ok(())
    }

    fn runs_for_edge(&self, id: &EdgeId) -> Result<Vec<ValidationRun>, StoreError> {
        read_runs(&self.runs_path()).map(|runs| {
            runs.into_iter().filter(|r| &r.edge_id == id).collect()
        })
    }

    fn list_edges(&self) -> Result<Vec<EdgeRecord>, StoreError> {
        let edges = self.edges.lock().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<EdgeRecord> = edges.values().cloned().collect();
        all.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(all)
    }
}

/// Read every run from a JSONL file, skipping malformed lines.
fn read_runs(path: &Path) -> Result<Vec<ValidationRun>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ValidationRun>(&line) {
            Ok(run) => runs.push(run),
            Err(_) => continue, // skip malformed lines
        }
    }
    Ok(runs)
}
