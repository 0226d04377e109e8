//! Serialized command queue in front of [`FenceEngine`].
//!
//! One tokio task owns the engine. Handles send commands over an unbounded
//! mpsc channel; caller operations carry a oneshot for the reply, platform
//! callbacks and lifecycle signals are fire-and-forget.

use std::fmt;

use perimeter_fence::{FenceError, TransitionType};
use perimeter_permission::{
    PermissionRequestError, PermissionRequestKind, PermissionState, PermissionStatus,
    PermissionTicket,
};
use perimeter_reconcile::ReconcileReport;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::{ActiveFences, FenceEngine};
use crate::events::{EngineEvent, EventHandler, EventKind, ListenerId};
use crate::{PersistenceAdapter, RegionMonitor};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a call through [`EngineHandle`] did not succeed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallError {
    /// The engine refused the operation.
    Rejected(FenceError),
    /// The engine task is gone.
    EngineStopped,
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Rejected(e) => write!(f, "{e}"),
            CallError::EngineStopped => write!(f, "engine stopped"),
        }
    }
}

impl std::error::Error for CallError {}

impl From<FenceError> for CallError {
    fn from(e: FenceError) -> Self {
        CallError::Rejected(e)
    }
}

impl CallError {
    /// The rejection, if this is one.
    pub fn rejection(&self) -> Option<&FenceError> {
        match self {
            CallError::Rejected(e) => Some(e),
            CallError::EngineStopped => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

type Reply<T> = oneshot::Sender<T>;

enum Command {
    CheckPermissions(Reply<PermissionStatus>),
    RequestPermissions(PermissionRequestKind, Reply<PermissionTicket>),
    AddFence(Value, Reply<Result<(), FenceError>>),
    RemoveFence(Value, Reply<Result<(), FenceError>>),
    RemoveAllFences(Reply<()>),
    GetActiveFences(Reply<ActiveFences>),
    AddListener(EventKind, EventHandler, Reply<ListenerId>),
    RemoveListener(ListenerId, Reply<bool>),
    RemoveAllListeners(Reply<()>),
    Subscribe(Reply<broadcast::Receiver<EngineEvent>>),
    ResignActive,
    BecomeActive(Option<Reply<Option<ReconcileReport>>>),
    Transition(Vec<String>, TransitionType),
    InitialState(String, bool),
    AuthorizationChanged(PermissionState),
    MonitoringFailed(Option<String>, String),
    Shutdown,
}

/// Move `engine` into its own task. The task ends on
/// [`EngineHandle::shutdown`] or when every handle is dropped, and yields
/// the engine back through the join handle.
pub fn spawn_engine<M, S>(engine: FenceEngine<M, S>) -> (EngineHandle, JoinHandle<FenceEngine<M, S>>)
where
    M: RegionMonitor + 'static,
    S: PersistenceAdapter + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let join = tokio::spawn(run(engine, rx));
    (EngineHandle { tx }, join)
}

async fn run<M, S>(
    mut engine: FenceEngine<M, S>,
    mut rx: mpsc::UnboundedReceiver<Command>,
) -> FenceEngine<M, S>
where
    M: RegionMonitor,
    S: PersistenceAdapter,
{
    debug!("engine task started");
    while let Some(cmd) = rx.recv().await {
        // A dropped reply receiver means the caller stopped waiting; the
        // operation still ran.
        match cmd {
            Command::CheckPermissions(reply) => {
                let _ = reply.send(engine.check_permissions());
            }
            Command::RequestPermissions(kind, reply) => {
                let _ = reply.send(engine.request_permissions(kind));
            }
            Command::AddFence(options, reply) => {
                let _ = reply.send(engine.add_fence(&options));
            }
            Command::RemoveFence(args, reply) => {
                let _ = reply.send(engine.remove_fence(&args));
            }
            Command::RemoveAllFences(reply) => {
                engine.remove_all_fences();
                let _ = reply.send(());
            }
            Command::GetActiveFences(reply) => {
                let _ = reply.send(engine.get_active_fences());
            }
            Command::AddListener(kind, handler, reply) => {
                let _ = reply.send(engine.add_listener(kind, handler));
            }
            Command::RemoveListener(id, reply) => {
                let _ = reply.send(engine.remove_listener(id));
            }
            Command::RemoveAllListeners(reply) => {
                engine.remove_all_listeners();
                let _ = reply.send(());
            }
            Command::Subscribe(reply) => {
                let _ = reply.send(engine.subscribe());
            }
            Command::ResignActive => engine.on_resign_active(),
            Command::BecomeActive(reply) => {
                let report = engine.on_become_active();
                if let Some(reply) = reply {
                    let _ = reply.send(report);
                }
            }
            Command::Transition(ids, transition) => engine.on_transition(&ids, transition),
            Command::InitialState(id, inside) => engine.on_initial_state(&id, inside),
            Command::AuthorizationChanged(state) => engine.on_authorization_changed(state),
            Command::MonitoringFailed(id, message) => {
                engine.on_monitoring_failed(id.as_deref(), &message)
            }
            Command::Shutdown => break,
        }
    }
    info!("engine task stopped");
    engine
}

// ---------------------------------------------------------------------------
// EngineHandle
// ---------------------------------------------------------------------------

/// Cloneable front door to a spawned engine.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl EngineHandle {
    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, CallError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| CallError::EngineStopped)?;
        rx.await.map_err(|_| CallError::EngineStopped)
    }

    fn signal(&self, cmd: Command) {
        if self.tx.send(cmd).is_err() {
            debug!("signal dropped; engine stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    // Caller operations ------------------------------------------------------

    pub async fn check_permissions(&self) -> Result<PermissionStatus, CallError> {
        self.call(Command::CheckPermissions).await
    }

    /// Resolves when the platform answers (or right away when no prompt is
    /// needed). Never times out.
    pub async fn request_permissions(
        &self,
        kind: PermissionRequestKind,
    ) -> Result<PermissionStatus, PermissionRequestError> {
        let ticket = self
            .call(|r| Command::RequestPermissions(kind, r))
            .await
            .map_err(|_| PermissionRequestError::EngineStopped)?;
        ticket.wait().await
    }

    /// Queue a request and hand back its ticket without waiting on it.
    pub async fn request_permissions_ticket(
        &self,
        kind: PermissionRequestKind,
    ) -> Result<PermissionTicket, CallError> {
        self.call(|r| Command::RequestPermissions(kind, r)).await
    }

    pub async fn add_fence(&self, options: Value) -> Result<(), CallError> {
        self.call(|r| Command::AddFence(options, r)).await??;
        Ok(())
    }

    pub async fn remove_fence(&self, args: Value) -> Result<(), CallError> {
        self.call(|r| Command::RemoveFence(args, r)).await??;
        Ok(())
    }

    pub async fn remove_all_fences(&self) -> Result<(), CallError> {
        self.call(Command::RemoveAllFences).await
    }

    pub async fn get_active_fences(&self) -> Result<ActiveFences, CallError> {
        self.call(Command::GetActiveFences).await
    }

    pub async fn add_listener(
        &self,
        kind: EventKind,
        handler: EventHandler,
    ) -> Result<ListenerId, CallError> {
        self.call(|r| Command::AddListener(kind, handler, r)).await
    }

    pub async fn remove_listener(&self, id: ListenerId) -> Result<bool, CallError> {
        self.call(|r| Command::RemoveListener(id, r)).await
    }

    pub async fn remove_all_listeners(&self) -> Result<(), CallError> {
        self.call(Command::RemoveAllListeners).await
    }

    pub async fn subscribe(&self) -> Result<broadcast::Receiver<EngineEvent>, CallError> {
        self.call(Command::Subscribe).await
    }

    // Lifecycle ------------------------------------------------------------

    pub fn resign_active(&self) {
        self.signal(Command::ResignActive);
    }

    pub fn become_active(&self) {
        self.signal(Command::BecomeActive(None));
    }

    /// Like [`Self::become_active`], but waits for the reconciliation result.
    pub async fn reconcile_now(&self) -> Result<Option<ReconcileReport>, CallError> {
        self.call(|r| Command::BecomeActive(Some(r))).await
    }

    pub fn shutdown(&self) {
        self.signal(Command::Shutdown);
    }

    // Platform callbacks ----------------------------------------------------

    pub fn on_enter(&self, identifier: impl Into<String>) {
        self.on_transition(vec![identifier.into()], TransitionType::Enter);
    }

    pub fn on_exit(&self, identifier: impl Into<String>) {
        self.on_transition(vec![identifier.into()], TransitionType::Exit);
    }

    pub fn on_transition(&self, identifiers: Vec<String>, transition: TransitionType) {
        self.signal(Command::Transition(identifiers, transition));
    }

    pub fn on_initial_state(&self, identifier: impl Into<String>, inside: bool) {
        self.signal(Command::InitialState(identifier.into(), inside));
    }

    pub fn on_authorization_changed(&self, state: PermissionState) {
        self.signal(Command::AuthorizationChanged(state));
    }

    pub fn on_monitoring_failed(&self, identifier: Option<String>, message: impl Into<String>) {
        self.signal(Command::MonitoringFailed(identifier, message.into()));
    }
}
