use perimeter_config::EngineConfig;
use perimeter_fence::{
    parse_remove_args, validate_new_fence, ErrorKind, Fence, FenceError, FencePolicy, FenceStore,
    TransitionType, ValidationContext,
};
use perimeter_permission::{
    PermissionRequestKind, PermissionState, PermissionStateMachine, PermissionStatus,
    PermissionTicket, RequestPlan,
};
use perimeter_reconcile::{reconcile, PersistedSnapshot, ReconcileReport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::events::{
    EngineEvent, EventDispatcher, EventHandler, EventKind, FenceEvent, ListenerId,
    PlatformErrorEvent, PlatformEvent, PlatformEventCode,
};
use crate::{PersistenceAdapter, RegionMonitor};

/// `getActiveFences` result: `{data: [Fence]}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveFences {
    pub data: Vec<Fence>,
}

/// The fence lifecycle engine.
///
/// Owns the active set, the permission machine, and the listeners. All
/// methods take `&mut self` and run to completion; serialization across
/// callers is the job of [`crate::spawn_engine`].
pub struct FenceEngine<M, S> {
    policy: FencePolicy,
    store: FenceStore,
    permissions: PermissionStateMachine,
    dispatcher: EventDispatcher,
    monitor: M,
    persistence: S,
}

impl<M, S> FenceEngine<M, S>
where
    M: RegionMonitor,
    S: PersistenceAdapter,
{
    pub fn new(policy: FencePolicy, monitor: M, persistence: S) -> Self {
        Self {
            policy,
            store: FenceStore::new(),
            permissions: PermissionStateMachine::default(),
            dispatcher: EventDispatcher::new(),
            monitor,
            persistence,
        }
    }

    pub fn from_config(cfg: &EngineConfig, monitor: M, persistence: S) -> Self {
        Self::new(cfg.policy.clone(), monitor, persistence)
    }

    /// Start from a permission state the platform already reported.
    pub fn with_permission_state(mut self, state: PermissionState) -> Self {
        self.permissions = PermissionStateMachine::new(state);
        self
    }

    pub fn policy(&self) -> &FencePolicy {
        &self.policy
    }

    pub fn permission_state(&self) -> PermissionState {
        self.permissions.state()
    }

    pub fn monitor(&self) -> &M {
        &self.monitor
    }

    pub fn persistence(&self) -> &S {
        &self.persistence
    }

    // -----------------------------------------------------------------------
    // Permissions
    // -----------------------------------------------------------------------

    pub fn check_permissions(&self) -> PermissionStatus {
        self.permissions.check()
    }

    /// Returns a ticket that resolves now or after the authorization
    /// callback. There is no timeout.
    pub fn request_permissions(&mut self, kind: PermissionRequestKind) -> PermissionTicket {
        let (ticket, plan, superseded) = self.permissions.request(kind);
        if let Some(old) = superseded {
            info!(superseded = %old, by = %ticket.token(), "permission request superseded");
        }
        match plan {
            RequestPlan::Prompt(scope) => {
                debug!(?kind, ?scope, token = %ticket.token(), "showing permission prompt");
                self.monitor.request_authorization(scope);
            }
            RequestPlan::ResolveNow { enable_background } => {
                debug!(?kind, state = ?self.permissions.state(), "permission request resolved now");
                if enable_background {
                    self.monitor.enable_background_delivery();
                }
            }
        }
        ticket
    }

    // -----------------------------------------------------------------------
    // Fences
    // -----------------------------------------------------------------------

    /// Validate, start monitoring, append, then persist.
    ///
    /// A failed save does not roll back: the call succeeds, the fence stays
    /// active and monitored, and `GENERIC_PLATFORM_ERROR` is emitted. Until a
    /// later save succeeds the stored snapshot lacks the fence, so a resume
    /// in that window treats its region as lost and stops it.
    pub fn add_fence(&mut self, options: &Value) -> Result<(), FenceError> {
        let ctx = ValidationContext {
            monitoring_available: self.monitor.is_available(),
            background_authorized: self.permissions.state().allows_fencing(),
            active: self.store.list(),
        };
        let fence = validate_new_fence(&self.policy, ctx, options).map_err(|e| {
            info!(code = e.code(), detail = e.detail().unwrap_or(""), "addFence rejected");
            e
        })?;

        // Register with the platform first: a refusal leaves no trace.
        if let Err(err) = self.monitor.start_monitoring(&fence.region()) {
            error!(uid = %fence.uid, error = %format!("{err:#}"), "start monitoring failed");
            return Err(FenceError::with_detail(
                ErrorKind::GenericPlatformError,
                format!("{err:#}"),
            ));
        }

        info!(uid = %fence.uid, radius = fence.radius, monitor = ?fence.monitor, "fence added");
        self.store.insert(fence);
        self.persist();
        Ok(())
    }

    pub fn remove_fence(&mut self, args: &Value) -> Result<(), FenceError> {
        let uid = parse_remove_args(args)?;

        if self.store.is_empty() {
            info!(uid = %uid, "removeFence on empty set; nothing to do");
            return Ok(());
        }

        if !self.store.contains(&uid) {
            return Err(FenceError::with_detail(
                ErrorKind::FenceNotFound,
                format!("uid {uid}"),
            ));
        }

        self.monitor.stop_monitoring(&uid);
        self.store.remove(&uid);
        info!(uid = %uid, "fence removed");
        self.persist();
        Ok(())
    }

    pub fn remove_all_fences(&mut self) {
        let removed = self.store.clear();
        for f in &removed {
            self.monitor.stop_monitoring(&f.uid);
        }
        info!(count = removed.len(), "all fences removed");
        self.persist();
    }

    pub fn get_active_fences(&self) -> ActiveFences {
        ActiveFences {
            data: self.store.list().to_vec(),
        }
    }

    pub fn active_fences(&self) -> &[Fence] {
        self.store.list()
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    pub fn add_listener(&mut self, kind: EventKind, handler: EventHandler) -> ListenerId {
        self.dispatcher.add_listener(kind, handler)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.dispatcher.remove_listener(id)
    }

    pub fn remove_all_listeners(&mut self) {
        self.dispatcher.remove_all_listeners();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.dispatcher.subscribe()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// App is leaving the foreground: write the snapshot.
    pub fn on_resign_active(&mut self) {
        debug!(count = self.store.len(), "resigning active; persisting fences");
        self.persist();
    }

    /// App entered the foreground: reconcile the persisted snapshot against
    /// what the platform still monitors.
    ///
    /// Returns `None` when the snapshot could not be restored; in that case
    /// nothing was changed.
    pub fn on_become_active(&mut self) -> Option<ReconcileReport> {
        let snapshot = match self.persistence.load() {
            Ok(Some(s)) => s,
            Ok(None) => PersistedSnapshot::default(),
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed restoring fences; reconciliation skipped");
                self.dispatcher.emit(EngineEvent::Platform(PlatformEvent::new(
                    PlatformEventCode::FailedRestoringFences,
                    "",
                    Value::Null,
                )));
                return None;
            }
        };

        let live = self.monitor.monitored_regions();
        let report = reconcile(&snapshot, &live);

        // Lost and dropped uids leave the store too: the in-process set must
        // never name a region the platform no longer watches.
        let mut changed = false;
        for uid in &report.lost {
            info!(uid = %uid, "pruning orphaned region");
            self.monitor.stop_monitoring(uid);
            changed |= self.store.remove(uid).is_some();
        }
        if !report.dropped.is_empty() {
            debug!(dropped = ?report.dropped, "persisted fences no longer monitored");
            for uid in &report.dropped {
                self.store.remove(uid);
            }
            changed = true;
        }
        if !report.reconciled.is_empty() {
            info!(count = report.reconciled.len(), "restoring fences from snapshot");
            self.store.replace(report.reconciled.clone());
            changed = true;
        }
        if changed {
            self.persist();
        }

        if !report.lost.is_empty() {
            self.dispatcher.emit(EngineEvent::Platform(PlatformEvent::new(
                PlatformEventCode::LostFencesToBackground,
                "",
                Value::from(report.lost.clone()),
            )));
        }
        if !report.reconciled.is_empty() {
            let data = serde_json::to_value(&report.reconciled).unwrap_or(Value::Null);
            self.dispatcher.emit(EngineEvent::Platform(PlatformEvent::new(
                PlatformEventCode::ForegroundWithExistingFences,
                "",
                data,
            )));
        }

        Some(report)
    }

    // -----------------------------------------------------------------------
    // Platform callbacks
    // -----------------------------------------------------------------------

    pub fn on_enter(&mut self, identifier: &str) {
        self.on_transition(&[identifier.to_string()], TransitionType::Enter);
    }

    pub fn on_exit(&mut self, identifier: &str) {
        self.on_transition(&[identifier.to_string()], TransitionType::Exit);
    }

    /// Several regions crossed together. Known fences share one
    /// `FenceEvent` in callback order; each unknown identifier is handled
    /// as an orphan after it.
    pub fn on_transition(&mut self, identifiers: &[String], transition: TransitionType) {
        let mut fences = Vec::with_capacity(identifiers.len());
        let mut orphans = Vec::new();
        for id in identifiers {
            match self.store.get(id) {
                Some(fence) => fences.push(fence.clone()),
                None => orphans.push(id.as_str()),
            }
        }

        if !fences.is_empty() {
            info!(count = fences.len(), ?transition, "fence event");
            self.dispatcher.emit(EngineEvent::Fence(FenceEvent {
                fences,
                time: now_epoch_secs(),
                transition_type: transition,
            }));
        }
        for id in orphans {
            self.handle_orphan(id);
        }
    }

    /// Inside is reported as an entry; outside emits nothing.
    pub fn on_initial_state(&mut self, identifier: &str, inside: bool) {
        if inside {
            self.on_enter(identifier);
        } else if !self.store.contains(identifier) {
            self.handle_orphan(identifier);
        } else {
            debug!(uid = %identifier, "initial state outside");
        }
    }

    pub fn on_authorization_changed(&mut self, next: PermissionState) {
        let outcome = self.permissions.on_authorization_changed(next);
        if outcome.expected {
            info!(from = ?outcome.previous, to = ?outcome.current, "authorization changed");
        } else {
            warn!(from = ?outcome.previous, to = ?outcome.current, "unexpected authorization transition");
        }
        if let Some(token) = outcome.resolved {
            debug!(token = %token, "permission request resolved");
        }
        if outcome.enable_background {
            self.monitor.enable_background_delivery();
        }
    }

    pub fn on_monitoring_failed(&mut self, identifier: Option<&str>, message: &str) {
        error!(uid = identifier.unwrap_or("-"), reason = message, "region monitoring failed");
        let detail = match identifier {
            Some(id) => format!("{id}: {message}"),
            None => message.to_string(),
        };
        let err = FenceError::with_detail(ErrorKind::GenericPlatformError, detail);
        self.dispatcher
            .emit(EngineEvent::PlatformError(PlatformErrorEvent::from(&err)));
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// The platform still watches a region we no longer track.
    fn handle_orphan(&mut self, identifier: &str) {
        warn!(uid = %identifier, "callback for unknown region; stopping it");
        self.monitor.stop_monitoring(identifier);
        let err = FenceError::with_detail(ErrorKind::FenceNotFound, identifier);
        self.dispatcher
            .emit(EngineEvent::PlatformError(PlatformErrorEvent::from(&err)));
    }

    /// Write the active set. Failure leaves memory as-is and is reported
    /// as a platform error.
    fn persist(&mut self) {
        let snap = PersistedSnapshot::from_slice(self.store.list());
        if let Err(err) = self.persistence.save(&snap) {
            error!(error = %format!("{err:#}"), "persisting fences failed");
            let e = FenceError::with_detail(ErrorKind::GenericPlatformError, format!("{err:#}"));
            self.dispatcher
                .emit(EngineEvent::PlatformError(PlatformErrorEvent::from(&e)));
        }
    }
}

fn now_epoch_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
