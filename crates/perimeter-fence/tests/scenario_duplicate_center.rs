//! Scenario: duplicate uid / duplicate center
//!
//! Two interpretations of "same center" exist:
//!
//! - `LatLng` (default): both components equal.
//! - `LegacyLatOnly`: `existing.lat == new.lat && existing.lat == new.lng`,
//!   the comparison early iOS releases shipped.
//!
//! The tests below pin down where the two disagree so the choice stays
//! visible.

use perimeter_fence::*;
use serde_json::json;

fn store_with(lat: f64, lng: f64) -> FenceStore {
    FenceStore::from_fences(vec![Fence::new(
        "existing",
        "E",
        "",
        Coordinate::new(lat, lng),
        500,
        TransitionType::Both,
    )])
}

fn add(
    policy: &FencePolicy,
    store: &FenceStore,
    uid: &str,
    lat: f64,
    lng: f64,
) -> Result<Fence, FenceError> {
    let ctx = ValidationContext {
        monitoring_available: true,
        background_authorized: true,
        active: store.list(),
    };
    validate_new_fence(
        policy,
        ctx,
        &json!({"name": "n", "uid": uid, "payload": "", "lat": lat, "lng": lng, "radius": 500, "monitor": 3}),
    )
}

fn legacy() -> FencePolicy {
    FencePolicy {
        coordinate_match: CoordinateMatch::LegacyLatOnly,
        ..FencePolicy::ios()
    }
}

#[test]
fn duplicate_uid_rejected_under_both_rules() {
    let store = store_with(1.0, 2.0);
    for policy in [FencePolicy::ios(), legacy()] {
        let e = add(&policy, &store, "existing", 50.0, 60.0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::AlreadyFenced);
    }
}

#[test]
fn identical_center_rejected_by_lat_lng_rule() {
    let store = store_with(1.0, 2.0);
    let e = add(&FencePolicy::ios(), &store, "new", 1.0, 2.0).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::AlreadyFenced);
}

#[test]
fn identical_center_accepted_by_legacy_rule_when_lat_differs_from_lng() {
    // Existing (1.0, 2.0): legacy compares existing.lat (1.0) with new.lng (2.0).
    let store = store_with(1.0, 2.0);
    assert!(add(&legacy(), &store, "new", 1.0, 2.0).is_ok());
}

#[test]
fn legacy_rule_rejects_a_different_center() {
    // Existing (3.0, 9.0); candidate (3.0, 3.0): distinct centers, but
    // existing.lat == new.lat == new.lng.
    let store = store_with(3.0, 9.0);
    assert!(add(&FencePolicy::ios(), &store, "new", 3.0, 3.0).is_ok());
    let e = add(&legacy(), &store, "new", 3.0, 3.0).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::AlreadyFenced);
}

#[test]
fn rules_agree_on_the_diagonal() {
    // When lat == lng for both, the two rules coincide.
    let store = store_with(5.0, 5.0);
    assert!(add(&FencePolicy::ios(), &store, "new", 5.0, 5.0).is_err());
    assert!(add(&legacy(), &store, "new", 5.0, 5.0).is_err());
}

#[test]
fn sharing_one_component_is_not_a_duplicate() {
    let store = store_with(1.0, 2.0);
    assert!(add(&FencePolicy::ios(), &store, "new", 1.0, 2.5).is_ok());
    assert!(add(&FencePolicy::ios(), &store, "new", 1.5, 2.0).is_ok());
}
