//! perimeter-permission
//!
//! Location-permission state machine and prompt correlation.
//!
//! Architectural decisions:
//! - The platform is authoritative: every pushed authorization state is accepted
//! - Status reported to hosts is a fixed function of the state
//! - At most one prompt is pending; a newer request supersedes it explicitly
//!
//! No platform calls. The machine returns plans and outcomes; the runtime
//! performs the prompts and background-delivery changes they describe.

mod machine;
mod requests;
mod state;

pub use machine::{AuthorizationOutcome, PermissionStateMachine};
pub use requests::{PendingPermissions, PermissionRequestError, PermissionTicket, RequestToken};
pub use state::*;
