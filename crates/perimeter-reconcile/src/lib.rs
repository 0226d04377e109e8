//! perimeter-reconcile
//!
//! Resume-time reconciliation of persisted fence intent against the regions
//! the platform is still monitoring.
//!
//! Architectural decisions:
//! - The platform's live set decides survival; the persisted record decides content
//! - A live region with no persisted record is an orphan and must be stopped
//! - A persisted record with no live region is dropped without notice
//! - Output ordering is deterministic (snapshot order, then sorted orphans)
//!
//! Deterministic, pure logic. No IO. No platform calls.

mod engine;
mod snapshot;

pub use engine::reconcile;
pub use snapshot::*;
