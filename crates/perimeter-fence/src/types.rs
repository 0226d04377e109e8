use serde::{Deserialize, Serialize};

/// Smallest radius (meters) the platforms monitor reliably.
pub const MIN_FENCE_RADIUS: u32 = 200;
/// Largest radius (meters) accepted for a fence.
pub const MAX_FENCE_RADIUS: u32 = 2000;

/// Region-monitoring slot limit on the reference (iOS) platform.
pub const IOS_FENCE_LIMIT: usize = 20;
/// Geofence limit per app on Android.
pub const ANDROID_FENCE_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// TransitionType
// ---------------------------------------------------------------------------

/// Which boundary crossings produce a notification.
///
/// Encoded on the wire and in the persisted snapshot as the integer code
/// `1 = Enter`, `2 = Exit`, `3 = Both`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TransitionType {
    Enter,
    Exit,
    Both,
}

impl TransitionType {
    pub fn code(self) -> u8 {
        match self {
            TransitionType::Enter => 1,
            TransitionType::Exit => 2,
            TransitionType::Both => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(TransitionType::Enter),
            2 => Some(TransitionType::Exit),
            3 => Some(TransitionType::Both),
            _ => None,
        }
    }

    pub fn notifies_on_entry(self) -> bool {
        matches!(self, TransitionType::Enter | TransitionType::Both)
    }

    pub fn notifies_on_exit(self) -> bool {
        matches!(self, TransitionType::Exit | TransitionType::Both)
    }
}

impl From<TransitionType> for u8 {
    fn from(t: TransitionType) -> Self {
        t.code()
    }
}

impl TryFrom<u8> for TransitionType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        TransitionType::from_code(i64::from(code))
            .ok_or_else(|| format!("unknown transition type code {code}"))
    }
}

// ---------------------------------------------------------------------------
// Coordinate
// ---------------------------------------------------------------------------

/// WGS84 coordinate in decimal degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `true` when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

// ---------------------------------------------------------------------------
// Fence
// ---------------------------------------------------------------------------

/// A registered circular region.
///
/// The serde shape IS the persisted record: `{uid, name, payload, lat, lng,
/// radius, monitor}` in that field order. Reordering fields changes the
/// snapshot bytes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fence {
    pub uid: String,
    pub name: String,
    /// Opaque to the engine; handed back verbatim in fence events.
    pub payload: String,
    pub lat: f64,
    pub lng: f64,
    /// Meters.
    pub radius: u32,
    pub monitor: TransitionType,
}

impl Fence {
    pub fn new(
        uid: impl Into<String>,
        name: impl Into<String>,
        payload: impl Into<String>,
        center: Coordinate,
        radius: u32,
        monitor: TransitionType,
    ) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            payload: payload.into(),
            lat: center.lat,
            lng: center.lng,
            radius,
            monitor,
        }
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// The platform-facing region that mirrors this fence.
    pub fn region(&self) -> CircularRegion {
        CircularRegion::from(self)
    }

    /// Host-bridge options object for this fence (the shape `addFence` accepts).
    pub fn to_options(&self) -> serde_json::Value {
        serde_json::json!({
            "uid": self.uid,
            "name": self.name,
            "payload": self.payload,
            "lat": self.lat,
            "lng": self.lng,
            "radius": self.radius,
            "monitor": self.monitor.code(),
        })
    }
}

// ---------------------------------------------------------------------------
// CircularRegion
// ---------------------------------------------------------------------------

/// What the region monitor is asked to watch. This is the platform's shadow
/// of a [`Fence`]; it carries no payload and is never read back as truth.
#[derive(Clone, Debug, PartialEq)]
pub struct CircularRegion {
    pub identifier: String,
    pub center: Coordinate,
    pub radius_m: f64,
    pub notify_on_entry: bool,
    pub notify_on_exit: bool,
}

impl From<&Fence> for CircularRegion {
    fn from(f: &Fence) -> Self {
        Self {
            identifier: f.uid.clone(),
            center: f.center(),
            radius_m: f64::from(f.radius),
            notify_on_entry: f.monitor.notifies_on_entry(),
            notify_on_exit: f.monitor.notifies_on_exit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_type_maps_to_notify_flags() {
        let enter = Fence::new("a", "A", "", Coordinate::new(1.0, 1.0), 500, TransitionType::Enter);
        let r = enter.region();
        assert!(r.notify_on_entry);
        assert!(!r.notify_on_exit);

        let exit = Fence { monitor: TransitionType::Exit, ..enter.clone() }.region();
        assert!(!exit.notify_on_entry);
        assert!(exit.notify_on_exit);

        let both = Fence { monitor: TransitionType::Both, ..enter }.region();
        assert!(both.notify_on_entry && both.notify_on_exit);
        assert_eq!(both.radius_m, 500.0);
    }

    #[test]
    fn record_field_order_is_stable() {
        let f = Fence::new("A", "Home", "p", Coordinate::new(1.5, -2.25), 500, TransitionType::Both);
        let s = serde_json::to_string(&f).unwrap();
        assert_eq!(
            s,
            r#"{"uid":"A","name":"Home","payload":"p","lat":1.5,"lng":-2.25,"radius":500,"monitor":3}"#
        );
    }

    #[test]
    fn unknown_monitor_code_is_rejected_on_decode() {
        let raw = r#"{"uid":"A","name":"","payload":"","lat":0.0,"lng":0.0,"radius":500,"monitor":9}"#;
        assert!(serde_json::from_str::<Fence>(raw).is_err());
    }

    #[test]
    fn coordinate_bounds() {
        assert!(Coordinate::new(90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
    }
}
