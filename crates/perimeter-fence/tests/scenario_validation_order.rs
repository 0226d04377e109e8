//! Scenario: addFence validation order
//!
//! # Invariants under test
//!
//! The rules run in a fixed order and the first failure wins. Each test
//! breaks the rule under test AND every later rule, so a reordering shows up
//! as a different error kind.

use perimeter_fence::*;
use serde_json::{json, Value};

fn existing() -> Vec<Fence> {
    vec![Fence::new(
        "dup",
        "Existing",
        "",
        Coordinate::new(10.0, 10.0),
        500,
        TransitionType::Both,
    )]
}

/// Breaks rules 3-6 at once: wrong radius type is not even reachable because
/// `monitor` is missing; uid collides with an existing fence.
fn broken_options() -> Value {
    json!({"name": "x", "uid": "dup", "payload": "", "lat": 10.0, "lng": 10.0, "radius": 5})
}

fn policy_full() -> FencePolicy {
    FencePolicy {
        limit: 1,
        ..FencePolicy::ios()
    }
}

#[test]
fn unavailable_beats_everything() {
    let active = existing();
    let ctx = ValidationContext {
        monitoring_available: false,
        background_authorized: false,
        active: &active,
    };
    let e = validate_new_fence(&policy_full(), ctx, &broken_options()).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::GeofencingUnavailable);
}

#[test]
fn permissions_beat_shape() {
    let active = existing();
    let ctx = ValidationContext {
        monitoring_available: true,
        background_authorized: false,
        active: &active,
    };
    let e = validate_new_fence(&policy_full(), ctx, &broken_options()).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::IncorrectPermissions);
}

#[test]
fn shape_beats_radius_capacity_and_duplicates() {
    let active = existing();
    let ctx = ValidationContext {
        monitoring_available: true,
        background_authorized: true,
        active: &active,
    };
    let e = validate_new_fence(&policy_full(), ctx, &broken_options()).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidFenceObj);
    assert!(e.detail().unwrap().contains("monitor"));
}

#[test]
fn radius_beats_capacity_and_duplicates() {
    let active = existing();
    let ctx = ValidationContext {
        monitoring_available: true,
        background_authorized: true,
        active: &active,
    };
    let mut opts = broken_options();
    opts["monitor"] = json!(3);
    let e = validate_new_fence(&policy_full(), ctx, &opts).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidFenceObj);
    assert!(e.detail().unwrap().contains("radius"));
}

#[test]
fn capacity_beats_duplicates() {
    let active = existing();
    let ctx = ValidationContext {
        monitoring_available: true,
        background_authorized: true,
        active: &active,
    };
    let mut opts = broken_options();
    opts["monitor"] = json!(3);
    opts["radius"] = json!(500);
    let e = validate_new_fence(&policy_full(), ctx, &opts).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::TooManyFences);
}

#[test]
fn duplicates_are_last() {
    let active = existing();
    let ctx = ValidationContext {
        monitoring_available: true,
        background_authorized: true,
        active: &active,
    };
    let mut opts = broken_options();
    opts["monitor"] = json!(3);
    opts["radius"] = json!(500);
    let e = validate_new_fence(&FencePolicy::ios(), ctx, &opts).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::AlreadyFenced);
}
