//! perimeter-runtime
//!
//! Wires the pure crates to the platform: region monitoring, durable
//! storage, and host listeners.
//!
//! Architectural decisions:
//! - [`FenceEngine`] is a plain `&mut self` state machine; no internal locks
//! - Every caller operation, lifecycle signal, and platform callback goes
//!   through one serialized command queue ([`spawn_engine`])
//! - Platform collaborators sit behind the [`RegionMonitor`] and
//!   [`PersistenceAdapter`] traits so hosts and tests inject their own
//! - Failures outside a request context never propagate: they are logged and
//!   surfaced as `PlatformErrorEvent`

mod adapters;
mod engine;
mod events;
mod persistence;
mod queue;

pub use adapters::{PersistenceAdapter, RegionMonitor};
pub use engine::{ActiveFences, FenceEngine};
pub use events::{
    EngineEvent, EventDispatcher, EventHandler, EventKind, FenceEvent, ListenerId,
    PlatformErrorEvent, PlatformEvent, PlatformEventCode, RETAINED_CAPACITY,
};
pub use persistence::{JsonFileStore, MemoryPersistence};
pub use queue::{spawn_engine, CallError, EngineHandle};
