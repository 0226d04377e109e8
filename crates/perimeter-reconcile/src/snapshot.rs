use std::collections::BTreeSet;

use perimeter_fence::Fence;
use serde::{Deserialize, Serialize};

/// Storage key existing iOS hosts read the fence snapshot from.
pub const DEFAULT_SNAPSHOT_KEY: &str = "activeFencesJSON";

// ---------------------------------------------------------------------------
// PersistedSnapshot
// ---------------------------------------------------------------------------

/// The ordered fence records written before suspension.
///
/// Encodes as a bare JSON array of fence records. Encoding is compact and
/// field order is fixed by [`Fence`], so `decode(encode(s)) == s` and
/// `encode(decode(bytes)) == bytes` for anything this type produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedSnapshot {
    pub fences: Vec<Fence>,
}

impl PersistedSnapshot {
    pub fn new(fences: Vec<Fence>) -> Self {
        Self { fences }
    }

    pub fn from_slice(fences: &[Fence]) -> Self {
        Self {
            fences: fences.to_vec(),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn find(&self, uid: &str) -> Option<&Fence> {
        self.fences.iter().find(|f| f.uid == uid)
    }

    pub fn len(&self) -> usize {
        self.fences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fences.is_empty()
    }
}

/// Identifiers of regions the platform reports as monitored right now.
pub type LiveRegions = BTreeSet<String>;

// ---------------------------------------------------------------------------
// ReconcileReport
// ---------------------------------------------------------------------------

/// Partition produced by [`crate::reconcile`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconcileReport {
    /// Persisted records whose region survived, in snapshot order.
    pub reconciled: Vec<Fence>,
    /// Live regions with no persisted record (orphans), sorted. The caller
    /// must stop monitoring each one.
    pub lost: Vec<String>,
    /// Persisted uids whose region did not survive, in snapshot order.
    pub dropped: Vec<String>,
}

impl ReconcileReport {
    /// Local intent and platform state agree exactly.
    pub fn is_clean(&self) -> bool {
        self.lost.is_empty() && self.dropped.is_empty()
    }

    pub fn reconciled_uids(&self) -> Vec<String> {
        self.reconciled.iter().map(|f| f.uid.clone()).collect()
    }
}
