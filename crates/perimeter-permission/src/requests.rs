//! Correlation of permission prompts to the callers waiting on them.
//!
//! The platform delivers one authorization callback with no caller identity,
//! so at most one caller can be parked at a time. Every ticket resolves
//! exactly once: with a status, or with an explicit error when a newer
//! request takes its place or the engine goes away.

use std::fmt;

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::PermissionStatus;

/// Identifies one permission request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestToken(Uuid);

impl RequestToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PermissionRequestError {
    /// A later request replaced this one before the platform answered.
    Superseded { by: RequestToken },
    /// The engine was dropped while the request was pending.
    EngineStopped,
}

impl fmt::Display for PermissionRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionRequestError::Superseded { by } => {
                write!(f, "permission request superseded by {by}")
            }
            PermissionRequestError::EngineStopped => {
                write!(f, "engine stopped before the permission request resolved")
            }
        }
    }
}

impl std::error::Error for PermissionRequestError {}

type Reply = Result<PermissionStatus, PermissionRequestError>;

// ---------------------------------------------------------------------------
// PermissionTicket
// ---------------------------------------------------------------------------

/// The caller's side of a permission request.
#[derive(Debug)]
pub struct PermissionTicket {
    token: RequestToken,
    rx: oneshot::Receiver<Reply>,
}

impl PermissionTicket {
    /// A ticket that is already resolved with `status`.
    pub fn ready(status: PermissionStatus) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Ok(status));
        Self {
            token: RequestToken::generate(),
            rx,
        }
    }

    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// Wait for the platform. There is no timeout: if the authorization
    /// callback never arrives, neither does the answer.
    pub async fn wait(self) -> Reply {
        self.rx
            .await
            .unwrap_or(Err(PermissionRequestError::EngineStopped))
    }

    /// Non-blocking poll; `None` while still pending.
    pub fn try_result(&mut self) -> Option<Reply> {
        match self.rx.try_recv() {
            Ok(reply) => Some(reply),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                Some(Err(PermissionRequestError::EngineStopped))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PendingPermissions
// ---------------------------------------------------------------------------

/// Correlation table holding at most one parked caller.
#[derive(Debug, Default)]
pub struct PendingPermissions {
    pending: Option<(RequestToken, oneshot::Sender<Reply>)>,
}

impl PendingPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a new caller. A caller already parked is resolved with
    /// [`PermissionRequestError::Superseded`]; its token is returned.
    pub fn begin(&mut self) -> (PermissionTicket, Option<RequestToken>) {
        let token = RequestToken::generate();
        let (tx, rx) = oneshot::channel();

        let superseded = self.pending.replace((token, tx)).map(|(old, old_tx)| {
            let _ = old_tx.send(Err(PermissionRequestError::Superseded { by: token }));
            old
        });

        (PermissionTicket { token, rx }, superseded)
    }

    /// Resolve the parked caller, if any. Returns its token.
    pub fn resolve(&mut self, status: PermissionStatus) -> Option<RequestToken> {
        let (token, tx) = self.pending.take()?;
        // Receiver may already be gone (caller stopped waiting); still resolved.
        let _ = tx.send(Ok(status));
        Some(token)
    }

    pub fn pending_token(&self) -> Option<RequestToken> {
        self.pending.as_ref().map(|(t, _)| *t)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PermissionState;

    #[test]
    fn resolve_without_pending_is_none() {
        let mut p = PendingPermissions::new();
        assert!(p.resolve(PermissionState::Denied.status()).is_none());
    }

    #[test]
    fn resolution_is_exactly_once() {
        let mut p = PendingPermissions::new();
        let (mut ticket, superseded) = p.begin();
        assert!(superseded.is_none());
        assert!(ticket.try_result().is_none());

        let status = PermissionState::AlwaysGranted.status();
        assert_eq!(p.resolve(status), Some(ticket.token()));
        assert!(p.resolve(status).is_none());
        assert_eq!(ticket.try_result(), Some(Ok(status)));
    }

    #[test]
    fn dropping_the_table_stops_waiters() {
        let mut p = PendingPermissions::new();
        let (mut ticket, _) = p.begin();
        drop(p);
        assert_eq!(
            ticket.try_result(),
            Some(Err(PermissionRequestError::EngineStopped))
        );
    }
}
