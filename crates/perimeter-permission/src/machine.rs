use crate::requests::{PendingPermissions, PermissionTicket, RequestToken};
use crate::state::{
    plan_request, PermissionRequestKind, PermissionState, PermissionStatus, RequestPlan,
};

/// What an authorization callback changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationOutcome {
    pub previous: PermissionState,
    pub current: PermissionState,
    /// Token of the caller resolved by this callback, if one was parked.
    pub resolved: Option<RequestToken>,
    /// Background delivery must be switched on.
    pub enable_background: bool,
    /// `false` when the platform pushed a transition outside the diagram.
    pub expected: bool,
}

/// Permission state plus the single pending-caller slot.
#[derive(Debug, Default)]
pub struct PermissionStateMachine {
    state: PermissionState,
    pending: PendingPermissions,
}

impl PermissionStateMachine {
    pub fn new(initial: PermissionState) -> Self {
        Self {
            state: initial,
            pending: PendingPermissions::new(),
        }
    }

    pub fn state(&self) -> PermissionState {
        self.state
    }

    pub fn check(&self) -> PermissionStatus {
        self.state.status()
    }

    pub fn pending_token(&self) -> Option<RequestToken> {
        self.pending.pending_token()
    }

    /// Start a request. When the plan is [`RequestPlan::Prompt`] the caller
    /// is parked and the runtime must show the prompt; otherwise the ticket
    /// is already resolved. The third value is a caller this request
    /// superseded.
    pub fn request(
        &mut self,
        kind: PermissionRequestKind,
    ) -> (PermissionTicket, RequestPlan, Option<RequestToken>) {
        let plan = plan_request(self.state, kind);
        match plan {
            RequestPlan::Prompt(_) => {
                let (ticket, superseded) = self.pending.begin();
                (ticket, plan, superseded)
            }
            RequestPlan::ResolveNow { .. } => (PermissionTicket::ready(self.check()), plan, None),
        }
    }

    /// The platform's authorization callback.
    pub fn on_authorization_changed(&mut self, next: PermissionState) -> AuthorizationOutcome {
        let previous = self.state;
        self.state = next;
        let resolved = self.pending.resolve(next.status());
        AuthorizationOutcome {
            previous,
            current: next,
            resolved,
            enable_background: next == PermissionState::AlwaysGranted,
            expected: previous.is_expected_transition(next),
        }
    }
}
