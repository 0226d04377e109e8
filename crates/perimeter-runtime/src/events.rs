use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use perimeter_fence::{Fence, FenceError, TransitionType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Capacity of the broadcast bus. Slow subscribers lag and miss events;
/// handler listeners are unaffected.
const BUS_CAPACITY: usize = 256;

/// Most platform events kept for a late `PlatformEvent` listener. The oldest
/// is discarded first.
pub const RETAINED_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A boundary crossing on a fence in the active set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FenceEvent {
    pub fences: Vec<Fence>,
    /// Seconds since the Unix epoch.
    pub time: f64,
    pub transition_type: TransitionType,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum PlatformEventCode {
    ForegroundWithExistingFences,
    LostFencesToBackground,
    FailedRestoringFences,
}

impl PlatformEventCode {
    pub fn code(self) -> u16 {
        match self {
            PlatformEventCode::ForegroundWithExistingFences => 100,
            PlatformEventCode::LostFencesToBackground => 101,
            PlatformEventCode::FailedRestoringFences => 102,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlatformEventCode::ForegroundWithExistingFences => "FOREGROUND_WITH_EXISTING_FENCES",
            PlatformEventCode::LostFencesToBackground => "LOST_FENCES_TO_BACKGROUND",
            PlatformEventCode::FailedRestoringFences => "FAILED_RESTORING_FENCES",
        }
    }
}

impl From<PlatformEventCode> for u16 {
    fn from(c: PlatformEventCode) -> Self {
        c.code()
    }
}

impl TryFrom<u16> for PlatformEventCode {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            100 => Ok(PlatformEventCode::ForegroundWithExistingFences),
            101 => Ok(PlatformEventCode::LostFencesToBackground),
            102 => Ok(PlatformEventCode::FailedRestoringFences),
            other => Err(format!("unknown platform event code {other}")),
        }
    }
}

impl fmt::Display for PlatformEventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Informational lifecycle notice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformEvent {
    pub code: PlatformEventCode,
    pub message: String,
    pub data: Value,
}

impl PlatformEvent {
    pub fn new(code: PlatformEventCode, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }
}

/// A taxonomy error raised outside any caller's request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformErrorEvent {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&FenceError> for PlatformErrorEvent {
    fn from(e: &FenceError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.message().to_string(),
            detail: e.detail().map(str::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineEvent
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Fence,
    Platform,
    PlatformError,
}

impl EventKind {
    /// The event name hosts register listeners under.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Fence => "FenceEvent",
            EventKind::Platform => "PlatformEvent",
            EventKind::PlatformError => "PlatformErrorEvent",
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FenceEvent" => Ok(EventKind::Fence),
            "PlatformEvent" => Ok(EventKind::Platform),
            "PlatformErrorEvent" => Ok(EventKind::PlatformError),
            other => Err(format!("unknown event name {other}")),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    #[serde(rename = "FenceEvent")]
    Fence(FenceEvent),
    #[serde(rename = "PlatformEvent")]
    Platform(PlatformEvent),
    #[serde(rename = "PlatformErrorEvent")]
    PlatformError(PlatformErrorEvent),
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::Fence(_) => EventKind::Fence,
            EngineEvent::Platform(_) => EventKind::Platform,
            EngineEvent::PlatformError(_) => EventKind::PlatformError,
        }
    }

    /// The payload object handed to host listeners (no `type` tag).
    pub fn payload(&self) -> Value {
        let v = match self {
            EngineEvent::Fence(e) => serde_json::to_value(e),
            EngineEvent::Platform(e) => serde_json::to_value(e),
            EngineEvent::PlatformError(e) => serde_json::to_value(e),
        };
        v.unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// EventDispatcher
// ---------------------------------------------------------------------------

pub type EventHandler = Box<dyn FnMut(&EngineEvent) + Send>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    kind: EventKind,
    handler: EventHandler,
}

/// Fire-and-forget fan-out to host listeners and bus subscribers.
///
/// Platform events that reach neither a handler nor a bus subscriber are
/// retained, up to [`RETAINED_CAPACITY`], and handed to the next
/// `PlatformEvent` listener. A host that registers late still learns what
/// happened at startup.
pub struct EventDispatcher {
    next_id: u64,
    listeners: Vec<Listener>,
    retained: VecDeque<EngineEvent>,
    bus: broadcast::Sender<EngineEvent>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .field("retained", &self.retained.len())
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        let (bus, _rx) = broadcast::channel::<EngineEvent>(BUS_CAPACITY);
        Self {
            next_id: 1,
            listeners: Vec::new(),
            retained: VecDeque::new(),
            bus,
        }
    }

    pub fn add_listener(&mut self, kind: EventKind, mut handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;

        if kind == EventKind::Platform && !self.retained.is_empty() {
            for event in self.retained.drain(..) {
                handler(&event);
            }
        }

        self.listeners.push(Listener { id, kind, handler });
        id
    }

    /// `false` if no listener had that id.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    pub fn remove_all_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|l| l.kind == kind).count()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    /// Platform events waiting for a listener.
    pub fn retained_len(&self) -> usize {
        self.retained.len()
    }

    pub fn emit(&mut self, event: EngineEvent) {
        let kind = event.kind();
        // Err means no subscribers, which is not an error.
        let subscribers = self.bus.send(event.clone()).unwrap_or(0);

        let mut delivered = 0usize;
        for l in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            (l.handler)(&event);
            delivered += 1;
        }

        if delivered == 0 && subscribers == 0 && kind == EventKind::Platform {
            if self.retained.len() == RETAINED_CAPACITY {
                warn!(capacity = RETAINED_CAPACITY, "retained platform events full; dropping oldest");
                self.retained.pop_front();
            }
            debug!(event = %kind, "no listener; retaining");
            self.retained.push_back(event);
        }
    }
}
