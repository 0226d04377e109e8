//! perimeter-testkit
//!
//! Deterministic stand-ins for the platform so engine behaviour can be
//! driven end to end without a device:
//! - [`FakeRegionMonitor`]: records every start/stop/prompt; scripted
//!   availability and live set; clones share state for inspection
//! - [`EventRecorder`]: collects dispatched events per kind
//! - fixtures for fence options and ready-to-use engines

mod monitor;
mod recorder;

pub use monitor::{FakeRegionMonitor, MonitorCall};
pub use recorder::EventRecorder;

use perimeter_fence::FencePolicy;
use perimeter_permission::PermissionState;
use perimeter_runtime::{EventKind, FenceEngine, MemoryPersistence};
use serde_json::{json, Value};

/// Engine wired to fakes. Keep the returned clones to inspect what the
/// engine did to the platform and the store.
pub type TestEngine = FenceEngine<FakeRegionMonitor, MemoryPersistence>;

/// `addFence` options object.
pub fn fence_options(uid: &str, lat: f64, lng: f64, radius: i64, monitor: u8) -> Value {
    json!({
        "name": format!("fence {uid}"),
        "uid": uid,
        "payload": format!("{{\"id\":\"{uid}\"}}"),
        "lat": lat,
        "lng": lng,
        "radius": radius,
        "monitor": monitor,
    })
}

/// `removeFence` argument object.
pub fn remove_args(uid: &str) -> Value {
    json!({ "fenceUID": uid })
}

/// Distinct, valid options for the i-th fence of a bulk test.
pub fn nth_fence_options(i: usize) -> Value {
    let c = i as f64 * 0.5;
    fence_options(&format!("fence-{i}"), c, -c, 500, 3)
}

/// iOS-policy engine with background permission already granted.
pub fn always_granted_engine() -> (TestEngine, FakeRegionMonitor, MemoryPersistence) {
    engine_with(FencePolicy::ios(), PermissionState::AlwaysGranted)
}

pub fn engine_with(
    policy: FencePolicy,
    state: PermissionState,
) -> (TestEngine, FakeRegionMonitor, MemoryPersistence) {
    let monitor = FakeRegionMonitor::new();
    let storage = MemoryPersistence::default();
    let engine = FenceEngine::new(policy, monitor.clone(), storage.clone())
        .with_permission_state(state);
    (engine, monitor, storage)
}

/// Attach a recorder listening to every event kind.
pub fn record_all(engine: &mut TestEngine) -> EventRecorder {
    let rec = EventRecorder::new();
    for kind in [EventKind::Fence, EventKind::Platform, EventKind::PlatformError] {
        engine.add_listener(kind, rec.handler());
    }
    rec
}
