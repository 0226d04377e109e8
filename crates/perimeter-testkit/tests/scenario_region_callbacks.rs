//! Scenario: region callbacks become fence events
//!
//! # Invariants under test
//! 1. Enter / exit on a tracked fence emit one FenceEvent carrying that
//!    fence and the crossing direction.
//! 2. Initial state inside reports Enter; outside emits nothing.
//! 3. A callback for an unknown region stops it, emits no FenceEvent, and
//!    raises PlatformErrorEvent FENCE_NOT_FOUND.
//! 4. A batch of simultaneous crossings yields one FenceEvent holding every
//!    known fence in callback order; unknown identifiers in the batch are
//!    orphans.
//! 5. Monitoring failures surface as GENERIC_PLATFORM_ERROR without
//!    touching the active set.

use perimeter_fence::TransitionType;
use perimeter_runtime::EventKind;
use perimeter_testkit::{always_granted_engine, fence_options, record_all};

#[test]
fn enter_and_exit_carry_the_fence() {
    let (mut engine, _, _) = always_granted_engine();
    engine.add_fence(&fence_options("A", 1.0, 1.0, 500, 3)).unwrap();
    let rec = record_all(&mut engine);

    engine.on_enter("A");
    engine.on_exit("A");

    let events = rec.fence_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].transition_type, TransitionType::Enter);
    assert_eq!(events[1].transition_type, TransitionType::Exit);
    assert_eq!(events[0].fences, engine.active_fences());
    assert!(events[0].time > 1_600_000_000.0);
    assert!(events[1].time >= events[0].time);
}

#[test]
fn fence_event_payload_uses_host_field_names() {
    let (mut engine, _, _) = always_granted_engine();
    engine.add_fence(&fence_options("A", 1.0, 1.0, 500, 1)).unwrap();
    let rec = record_all(&mut engine);
    engine.on_enter("A");

    let payload = rec.all()[0].payload();
    assert_eq!(payload["transitionType"], 1);
    assert_eq!(payload["fences"][0]["uid"], "A");
    assert!(payload["time"].is_f64());
}

#[test]
fn initial_state() {
    let (mut engine, monitor, _) = always_granted_engine();
    engine.add_fence(&fence_options("A", 1.0, 1.0, 500, 3)).unwrap();
    let rec = record_all(&mut engine);
    monitor.clear_calls();

    engine.on_initial_state("A", false);
    assert!(rec.all().is_empty());

    engine.on_initial_state("A", true);
    let events = rec.fence_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].transition_type, TransitionType::Enter);
    assert!(monitor.calls().is_empty());
}

#[test]
fn orphan_callbacks_stop_the_region() {
    let (mut engine, monitor, _) = always_granted_engine();
    engine.add_fence(&fence_options("A", 1.0, 1.0, 500, 3)).unwrap();
    monitor.add_live("ghost");
    let rec = record_all(&mut engine);

    engine.on_enter("ghost");
    engine.on_exit("ghost");
    engine.on_initial_state("ghost", false);

    assert_eq!(rec.count(EventKind::Fence), 0);
    assert_eq!(monitor.stopped(), vec!["ghost", "ghost", "ghost"]);
    assert!(!monitor.live().contains("ghost"));

    let errors = rec.platform_errors();
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| e.code == "FENCE_NOT_FOUND"));
    assert_eq!(errors[0].detail.as_deref(), Some("ghost"));

    // The tracked fence is untouched.
    assert_eq!(engine.active_fences().len(), 1);
}

#[test]
fn simultaneous_crossings_share_one_event() {
    let (mut engine, monitor, _) = always_granted_engine();
    engine.add_fence(&fence_options("A", 1.0, 1.0, 500, 3)).unwrap();
    engine.add_fence(&fence_options("B", 2.0, 2.0, 500, 3)).unwrap();
    monitor.add_live("ghost");
    let rec = record_all(&mut engine);

    let batch = vec!["B".to_string(), "ghost".to_string(), "A".to_string()];
    engine.on_transition(&batch, TransitionType::Exit);

    let events = rec.fence_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].transition_type, TransitionType::Exit);
    let uids: Vec<&str> = events[0].fences.iter().map(|f| f.uid.as_str()).collect();
    assert_eq!(uids, vec!["B", "A"]);

    let errors = rec.platform_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, "FENCE_NOT_FOUND");
    assert_eq!(errors[0].detail.as_deref(), Some("ghost"));
    assert_eq!(monitor.stopped(), vec!["ghost"]);
    assert_eq!(engine.active_fences().len(), 2);
}

#[test]
fn batch_of_only_unknown_regions_emits_no_fence_event() {
    let (mut engine, monitor, _) = always_granted_engine();
    let rec = record_all(&mut engine);

    engine.on_transition(&["x".to_string(), "y".to_string()], TransitionType::Enter);
    engine.on_transition(&[], TransitionType::Enter);

    assert_eq!(rec.count(EventKind::Fence), 0);
    assert_eq!(rec.count(EventKind::PlatformError), 2);
    assert_eq!(monitor.stopped(), vec!["x", "y"]);
}

#[test]
fn callback_after_removal_is_an_orphan() {
    let (mut engine, _, _) = always_granted_engine();
    engine.add_fence(&fence_options("A", 1.0, 1.0, 500, 3)).unwrap();
    engine.remove_all_fences();
    let rec = record_all(&mut engine);

    engine.on_exit("A");
    assert_eq!(rec.count(EventKind::Fence), 0);
    assert_eq!(rec.count(EventKind::PlatformError), 1);
}

#[test]
fn monitoring_failure_is_reported() {
    let (mut engine, _, _) = always_granted_engine();
    engine.add_fence(&fence_options("A", 1.0, 1.0, 500, 3)).unwrap();
    let rec = record_all(&mut engine);

    engine.on_monitoring_failed(Some("A"), "kCLErrorRegionMonitoringFailure");
    engine.on_monitoring_failed(None, "location services off");

    let errors = rec.platform_errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].code, "GENERIC_PLATFORM_ERROR");
    assert_eq!(errors[0].message, "A platform specific error has occurred.");
    assert_eq!(
        errors[0].detail.as_deref(),
        Some("A: kCLErrorRegionMonitoringFailure")
    );
    assert_eq!(errors[1].detail.as_deref(), Some("location services off"));
    assert_eq!(engine.active_fences().len(), 1);
}

#[test]
fn removed_listeners_hear_nothing() {
    let (mut engine, _, _) = always_granted_engine();
    engine.add_fence(&fence_options("A", 1.0, 1.0, 500, 3)).unwrap();
    let rec = record_all(&mut engine);
    engine.remove_all_listeners();
    engine.on_enter("A");
    assert!(rec.all().is_empty());
}
