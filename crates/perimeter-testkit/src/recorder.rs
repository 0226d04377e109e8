use std::sync::{Arc, Mutex, MutexGuard};

use perimeter_runtime::{
    EngineEvent, EventHandler, EventKind, FenceEvent, PlatformErrorEvent, PlatformEvent,
};

/// Collects every event its handlers receive, in delivery order.
#[derive(Clone, Debug, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EngineEvent>> {
        self.events.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// A handler feeding this recorder.
    pub fn handler(&self) -> EventHandler {
        let sink = self.events.clone();
        Box::new(move |e: &EngineEvent| {
            sink.lock()
                .unwrap_or_else(|p| p.into_inner())
                .push(e.clone());
        })
    }

    pub fn all(&self) -> Vec<EngineEvent> {
        self.lock().clone()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.lock().iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn fence_events(&self) -> Vec<FenceEvent> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Fence(f) => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn platform_events(&self) -> Vec<PlatformEvent> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Platform(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn platform_errors(&self) -> Vec<PlatformErrorEvent> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                EngineEvent::PlatformError(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }
}
