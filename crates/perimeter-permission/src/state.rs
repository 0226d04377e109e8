use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PermissionState
// ---------------------------------------------------------------------------

/// Device location-permission state as last reported by the platform.
///
/// ```text
/// Undetermined ──► ForegroundGranted ──► AlwaysGranted
///      │                  │
///      └──────► Denied ◄──┘      (platform may push Denied from any state)
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    Undetermined,
    ForegroundGranted,
    AlwaysGranted,
    Denied,
}

impl PermissionState {
    /// Fixed mapping to the host-visible grant levels.
    ///
    /// | State               | foreground | background |
    /// |---------------------|------------|------------|
    /// | `Undetermined`      | prompt     | prompt     |
    /// | `ForegroundGranted` | granted    | prompt     |
    /// | `AlwaysGranted`     | granted    | granted    |
    /// | `Denied`            | denied     | denied     |
    pub fn status(self) -> PermissionStatus {
        use GrantLevel::*;
        let (foreground, background) = match self {
            PermissionState::Undetermined => (Prompt, Prompt),
            PermissionState::ForegroundGranted => (Granted, Prompt),
            PermissionState::AlwaysGranted => (Granted, Granted),
            PermissionState::Denied => (Denied, Denied),
        };
        PermissionStatus {
            foreground,
            background,
        }
    }

    /// Fence mutation requires background ("always") authorization.
    pub fn allows_fencing(self) -> bool {
        self == PermissionState::AlwaysGranted
    }

    /// `true` if `next` is an edge of the state diagram (or a self-loop).
    ///
    /// Other transitions still happen (the user can change settings behind
    /// the app's back); callers only log them.
    pub fn is_expected_transition(self, next: PermissionState) -> bool {
        use PermissionState::*;
        if self == next || next == Denied {
            return true;
        }
        matches!(
            (self, next),
            (Undetermined, ForegroundGranted)
                | (Undetermined, AlwaysGranted)
                | (ForegroundGranted, AlwaysGranted)
        )
    }
}

// ---------------------------------------------------------------------------
// Host-visible status
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantLevel {
    Prompt,
    Granted,
    Denied,
}

/// `{foreground, background}` as returned by every permission operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionStatus {
    pub foreground: GrantLevel,
    pub background: GrantLevel,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Which caller-facing request was made.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PermissionRequestKind {
    /// `requestPermissions`: pre-split OS releases, everything in one prompt.
    Legacy,
    Foreground,
    Background,
}

/// Which platform prompt to show.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PromptScope {
    LegacyAllAtOnce,
    WhenInUse,
    Always,
}

/// What a request does from the current state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestPlan {
    /// Show the prompt and park the caller until the authorization callback.
    Prompt(PromptScope),
    /// No prompt: resolve the caller with the current status right away.
    ResolveNow { enable_background: bool },
}

pub fn plan_request(state: PermissionState, kind: PermissionRequestKind) -> RequestPlan {
    use PermissionRequestKind as K;
    use PermissionState as S;
    match (kind, state) {
        (K::Legacy, S::Undetermined) => RequestPlan::Prompt(PromptScope::LegacyAllAtOnce),
        (K::Legacy, S::ForegroundGranted) => RequestPlan::Prompt(PromptScope::Always),
        (K::Legacy, S::AlwaysGranted) => RequestPlan::ResolveNow {
            enable_background: true,
        },
        (K::Foreground, S::Undetermined) => RequestPlan::Prompt(PromptScope::WhenInUse),
        (K::Background, S::ForegroundGranted) => RequestPlan::Prompt(PromptScope::Always),
        _ => RequestPlan::ResolveNow {
            enable_background: false,
        },
    }
}
