//! Scenario: checkPermissions mapping and request planning
//!
//! # Invariants under test
//!
//! 1. `checkPermissions` is a fixed function of the state.
//! 2. Each request kind prompts only from its valid source state and
//!    otherwise resolves immediately with the current status.

use perimeter_permission::*;

#[test]
fn mapping_table() {
    use GrantLevel::*;
    let cases = [
        (PermissionState::Undetermined, Prompt, Prompt),
        (PermissionState::ForegroundGranted, Granted, Prompt),
        (PermissionState::AlwaysGranted, Granted, Granted),
        (PermissionState::Denied, Denied, Denied),
    ];
    for (state, fg, bg) in cases {
        let m = PermissionStateMachine::new(state);
        assert_eq!(
            m.check(),
            PermissionStatus {
                foreground: fg,
                background: bg
            },
            "{state:?}"
        );
    }
}

#[test]
fn legacy_request_plans() {
    use PermissionState::*;
    assert_eq!(
        plan_request(Undetermined, PermissionRequestKind::Legacy),
        RequestPlan::Prompt(PromptScope::LegacyAllAtOnce)
    );
    assert_eq!(
        plan_request(ForegroundGranted, PermissionRequestKind::Legacy),
        RequestPlan::Prompt(PromptScope::Always)
    );
    assert_eq!(
        plan_request(AlwaysGranted, PermissionRequestKind::Legacy),
        RequestPlan::ResolveNow {
            enable_background: true
        }
    );
    assert_eq!(
        plan_request(Denied, PermissionRequestKind::Legacy),
        RequestPlan::ResolveNow {
            enable_background: false
        }
    );
}

#[test]
fn foreground_prompts_only_from_undetermined() {
    for state in [
        PermissionState::ForegroundGranted,
        PermissionState::AlwaysGranted,
        PermissionState::Denied,
    ] {
        let mut m = PermissionStateMachine::new(state);
        let (mut ticket, plan, _) = m.request(PermissionRequestKind::Foreground);
        assert!(matches!(plan, RequestPlan::ResolveNow { .. }));
        assert_eq!(ticket.try_result(), Some(Ok(state.status())));
        assert!(m.pending_token().is_none());
    }

    let mut m = PermissionStateMachine::new(PermissionState::Undetermined);
    let (mut ticket, plan, _) = m.request(PermissionRequestKind::Foreground);
    assert_eq!(plan, RequestPlan::Prompt(PromptScope::WhenInUse));
    assert!(ticket.try_result().is_none());
    assert_eq!(m.pending_token(), Some(ticket.token()));
}

#[test]
fn background_prompts_only_from_foreground_granted() {
    for state in [
        PermissionState::Undetermined,
        PermissionState::AlwaysGranted,
        PermissionState::Denied,
    ] {
        let mut m = PermissionStateMachine::new(state);
        let (mut ticket, _, _) = m.request(PermissionRequestKind::Background);
        assert_eq!(ticket.try_result(), Some(Ok(state.status())));
    }

    let mut m = PermissionStateMachine::new(PermissionState::ForegroundGranted);
    let (_ticket, plan, _) = m.request(PermissionRequestKind::Background);
    assert_eq!(plan, RequestPlan::Prompt(PromptScope::Always));
}
