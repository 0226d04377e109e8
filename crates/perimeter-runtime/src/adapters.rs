use perimeter_fence::CircularRegion;
use perimeter_permission::PromptScope;
use perimeter_reconcile::{LiveRegions, PersistedSnapshot};

/// The OS-owned region-monitoring service.
///
/// Monitoring state lives outside the process and survives suspension; the
/// engine only ever treats it as a shadow of its own store. Callbacks flow
/// the other way, into [`crate::FenceEngine`] / [`crate::EngineHandle`].
pub trait RegionMonitor: Send {
    fn is_available(&self) -> bool;

    /// Begin watching `region`. An error means the platform refused it and
    /// nothing was registered.
    fn start_monitoring(&mut self, region: &CircularRegion) -> anyhow::Result<()>;

    /// Stop watching `identifier`. Unknown identifiers are ignored.
    fn stop_monitoring(&mut self, identifier: &str);

    /// Identifiers the platform is watching right now.
    fn monitored_regions(&self) -> LiveRegions;

    /// Show the location-permission prompt for `scope`. The answer arrives
    /// later through the authorization callback, if ever.
    fn request_authorization(&mut self, scope: PromptScope);

    /// Allow region events while the app is in the background.
    fn enable_background_delivery(&mut self);
}

/// Durable key-value storage for the fence snapshot.
pub trait PersistenceAdapter: Send {
    fn save(&mut self, snapshot: &PersistedSnapshot) -> anyhow::Result<()>;

    /// `Ok(None)` when nothing was ever saved.
    fn load(&mut self) -> anyhow::Result<Option<PersistedSnapshot>>;
}
