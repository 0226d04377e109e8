use std::collections::BTreeSet;

use crate::{LiveRegions, PersistedSnapshot, ReconcileReport};

/// Deterministic reconciliation:
/// - live region with a persisted record => reconciled (persisted content wins)
/// - live region without a record        => lost (orphan; caller stops it)
/// - persisted record without a region   => dropped
///
/// A uid persisted more than once is reconciled once, from its first record.
/// Same inputs always give the same report; running it again after the
/// caller has acted on `lost` gives the same `reconciled` and an empty `lost`.
pub fn reconcile(snapshot: &PersistedSnapshot, live: &LiveRegions) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    // 1) Walk persisted records in order so reconciled keeps insertion order.
    for fence in &snapshot.fences {
        if !seen.insert(fence.uid.as_str()) {
            continue;
        }
        if live.contains(&fence.uid) {
            report.reconciled.push(fence.clone());
        } else {
            report.dropped.push(fence.uid.clone());
        }
    }

    // 2) Orphans: live regions nobody persisted. BTreeSet iteration is sorted.
    for id in live {
        if !seen.contains(id.as_str()) {
            report.lost.push(id.clone());
        }
    }

    report
}
