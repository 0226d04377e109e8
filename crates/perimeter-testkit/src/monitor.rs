use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::bail;
use perimeter_fence::CircularRegion;
use perimeter_permission::PromptScope;
use perimeter_reconcile::LiveRegions;
use perimeter_runtime::RegionMonitor;

/// One call the engine made on the monitor.
#[derive(Clone, Debug, PartialEq)]
pub enum MonitorCall {
    Start(CircularRegion),
    Stop(String),
    Prompt(PromptScope),
    EnableBackground,
}

#[derive(Debug)]
struct Inner {
    available: bool,
    refuse_starts: bool,
    live: LiveRegions,
    calls: Vec<MonitorCall>,
}

/// Scriptable region monitor. Clones share state: hand one to the engine,
/// keep one to script and inspect.
#[derive(Clone, Debug)]
pub struct FakeRegionMonitor {
    inner: Arc<Mutex<Inner>>,
}

impl Default for FakeRegionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRegionMonitor {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                available: true,
                refuse_starts: false,
                live: LiveRegions::new(),
                calls: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test poisons the lock; the state is still usable.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Make every later `start_monitoring` fail.
    pub fn refuse_starts(&self, refuse: bool) {
        self.lock().refuse_starts = refuse;
    }

    /// Pretend the OS kept (or gained) a region across suspension.
    pub fn add_live(&self, identifier: &str) {
        self.lock().live.insert(identifier.to_string());
    }

    /// Pretend the OS dropped a region while suspended.
    pub fn drop_live(&self, identifier: &str) {
        self.lock().live.remove(identifier);
    }

    pub fn live(&self) -> LiveRegions {
        self.lock().live.clone()
    }

    pub fn calls(&self) -> Vec<MonitorCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn started(&self) -> Vec<CircularRegion> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MonitorCall::Start(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn stopped(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MonitorCall::Stop(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn prompts(&self) -> Vec<PromptScope> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MonitorCall::Prompt(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn background_enabled(&self) -> bool {
        self.calls().contains(&MonitorCall::EnableBackground)
    }
}

impl RegionMonitor for FakeRegionMonitor {
    fn is_available(&self) -> bool {
        self.lock().available
    }

    fn start_monitoring(&mut self, region: &CircularRegion) -> anyhow::Result<()> {
        let mut inner = self.lock();
        if inner.refuse_starts {
            bail!("fake monitor refused {}", region.identifier);
        }
        inner.live.insert(region.identifier.clone());
        inner.calls.push(MonitorCall::Start(region.clone()));
        Ok(())
    }

    fn stop_monitoring(&mut self, identifier: &str) {
        let mut inner = self.lock();
        inner.live.remove(identifier);
        inner.calls.push(MonitorCall::Stop(identifier.to_string()));
    }

    fn monitored_regions(&self) -> LiveRegions {
        self.live()
    }

    fn request_authorization(&mut self, scope: PromptScope) {
        self.lock().calls.push(MonitorCall::Prompt(scope));
    }

    fn enable_background_delivery(&mut self) {
        self.lock().calls.push(MonitorCall::EnableBackground);
    }
}
