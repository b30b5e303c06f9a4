//! Deterministic identifiers.
//!
//! `EdgeId` is the content address of a strategy definition; `RunId`
//! identifies one validation run. Both are BLAKE3 hex digests, stable
//! across builds and platforms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-addressed identity of a strategy definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub String);

impl EdgeId {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars, for logs and file names.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a single validation run (edge id + timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// Derive a run id from the edge being validated and the run timestamp.
    pub fn derive(edge: &EdgeId, at: chrono::NaiveDateTime) -> Self {
        let material = format!("{}:{}", edge.as_str(), at);
        Self::from_bytes(material.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn edge_id_deterministic() {
        assert_eq!(EdgeId::from_bytes(b"abc"), EdgeId::from_bytes(b"abc"));
        assert_ne!(EdgeId::from_bytes(b"abc"), EdgeId::from_bytes(b"abd"));
    }

    #[test]
    fn run_id_varies_with_timestamp() {
        let edge = EdgeId::from_bytes(b"edge");
        let t1 = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let t2 = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 1)
            .unwrap();
        assert_ne!(RunId::derive(&edge, t1), RunId::derive(&edge, t2));
        assert_eq!(RunId::derive(&edge, t1), RunId::derive(&edge, t1));
    }

    #[test]
    fn short_form_is_prefix() {
        let id = EdgeId::from_bytes(b"abc");
        assert_eq!(id.short().len(), 12);
        assert!(id.as_str().starts_with(id.short()));
    }
}
