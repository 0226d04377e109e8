use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    Coordinate, ErrorKind, Fence, FenceError, TransitionType, ANDROID_FENCE_LIMIT,
    IOS_FENCE_LIMIT, MAX_FENCE_RADIUS, MIN_FENCE_RADIUS,
};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How two centers are compared for the duplicate-coordinate rule.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateMatch {
    /// `existing.lat == new.lat && existing.lng == new.lng`.
    #[default]
    LatLng,
    /// `existing.lat == new.lat && existing.lat == new.lng`: the comparison
    /// shipped by early iOS releases. Only for hosts that must reproduce
    /// its acceptance decisions exactly.
    LegacyLatOnly,
}

impl CoordinateMatch {
    pub fn same_center(self, existing: Coordinate, candidate: Coordinate) -> bool {
        match self {
            CoordinateMatch::LatLng => existing.lat == candidate.lat && existing.lng == candidate.lng,
            CoordinateMatch::LegacyLatOnly => {
                existing.lat == candidate.lat && existing.lat == candidate.lng
            }
        }
    }
}

/// Platform capacity and geometry limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FencePolicy {
    pub limit: usize,
    pub min_radius_m: u32,
    pub max_radius_m: u32,
    pub coordinate_match: CoordinateMatch,
}

impl FencePolicy {
    pub fn ios() -> Self {
        Self {
            limit: IOS_FENCE_LIMIT,
            min_radius_m: MIN_FENCE_RADIUS,
            max_radius_m: MAX_FENCE_RADIUS,
            coordinate_match: CoordinateMatch::LatLng,
        }
    }

    pub fn android() -> Self {
        Self {
            limit: ANDROID_FENCE_LIMIT,
            ..Self::ios()
        }
    }
}

impl Default for FencePolicy {
    fn default() -> Self {
        Self::ios()
    }
}

/// Everything outside the candidate that validation reads.
#[derive(Clone, Copy, Debug)]
pub struct ValidationContext<'a> {
    pub monitoring_available: bool,
    /// `true` only for "always" (background) authorization.
    pub background_authorized: bool,
    pub active: &'a [Fence],
}

// ---------------------------------------------------------------------------
// addFence
// ---------------------------------------------------------------------------

/// Validate an `addFence` options object.
///
/// Rules, first failure wins:
///
/// | # | Rule                                   | Kind                     |
/// |---|----------------------------------------|--------------------------|
/// | 1 | monitoring capability present          | `GEOFENCING_UNAVAILABLE` |
/// | 2 | background ("always") authorization    | `INCORRECT_PERMISSIONS`  |
/// | 3 | all fields present with correct types  | `INVALID_FENCE_OBJ`      |
/// | 4 | radius and center within bounds        | `INVALID_FENCE_OBJ`      |
/// | 5 | active set below the platform limit    | `TOO_MANY_FENCES`        |
/// | 6 | uid and center not already fenced      | `ALREADY_FENCED`         |
pub fn validate_new_fence(
    policy: &FencePolicy,
    ctx: ValidationContext<'_>,
    options: &Value,
) -> Result<Fence, FenceError> {
    if !ctx.monitoring_available {
        return Err(ErrorKind::GeofencingUnavailable.into());
    }
    if !ctx.background_authorized {
        return Err(ErrorKind::IncorrectPermissions.into());
    }

    let draft = parse_fence_options(options)?;

    if draft.radius < i64::from(policy.min_radius_m) || draft.radius > i64::from(policy.max_radius_m)
    {
        return Err(FenceError::with_detail(
            ErrorKind::InvalidFenceObj,
            format!(
                "radius {} outside [{}, {}]",
                draft.radius, policy.min_radius_m, policy.max_radius_m
            ),
        ));
    }
    if !draft.center.is_valid() {
        return Err(FenceError::with_detail(
            ErrorKind::InvalidFenceObj,
            format!("center ({}, {}) out of range", draft.center.lat, draft.center.lng),
        ));
    }

    if ctx.active.len() >= policy.limit {
        return Err(FenceError::with_detail(
            ErrorKind::TooManyFences,
            format!("limit={}", policy.limit),
        ));
    }

    for existing in ctx.active {
        if existing.uid == draft.uid {
            return Err(FenceError::with_detail(
                ErrorKind::AlreadyFenced,
                format!("uid {} already active", draft.uid),
            ));
        }
        if policy
            .coordinate_match
            .same_center(existing.center(), draft.center)
        {
            return Err(FenceError::with_detail(
                ErrorKind::AlreadyFenced,
                format!("center already fenced by {}", existing.uid),
            ));
        }
    }

    // Bounds were checked against u32 limits above.
    let radius = u32::try_from(draft.radius)
        .map_err(|_| FenceError::with_detail(ErrorKind::InvalidFenceObj, "radius overflow"))?;

    Ok(Fence::new(
        draft.uid,
        draft.name,
        draft.payload,
        draft.center,
        radius,
        draft.monitor,
    ))
}

/// Shape-checked but not yet bounds-checked fence fields.
#[derive(Clone, Debug, PartialEq)]
pub struct FenceDraft {
    pub uid: String,
    pub name: String,
    pub payload: String,
    pub center: Coordinate,
    pub radius: i64,
    pub monitor: TransitionType,
}

/// Rule 3 alone: required fields present with the right JSON types.
pub fn parse_fence_options(options: &Value) -> Result<FenceDraft, FenceError> {
    let obj = options
        .as_object()
        .ok_or_else(|| invalid("options is not an object"))?;

    let name = string_field(obj, "name")?;
    let uid = string_field(obj, "uid")?;
    if uid.is_empty() {
        return Err(invalid("uid is empty"));
    }
    let payload = string_field(obj, "payload")?;
    let lat = number_field(obj, "lat")?;
    let lng = number_field(obj, "lng")?;
    let radius = obj
        .get("radius")
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid("radius missing or not an integer"))?;
    let monitor = obj
        .get("monitor")
        .and_then(Value::as_i64)
        .and_then(TransitionType::from_code)
        .ok_or_else(|| invalid("monitor missing or not a transition code"))?;

    Ok(FenceDraft {
        uid,
        name,
        payload,
        center: Coordinate::new(lat, lng),
        radius,
        monitor,
    })
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Result<String, FenceError> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid(format!("{key} missing or not a string")))
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Result<f64, FenceError> {
    obj.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid(format!("{key} missing or not a number")))
}

fn invalid(detail: impl Into<String>) -> FenceError {
    FenceError::with_detail(ErrorKind::InvalidFenceObj, detail)
}

// ---------------------------------------------------------------------------
// removeFence
// ---------------------------------------------------------------------------

/// Extract `fenceUID` from `removeFence` options.
pub fn parse_remove_args(options: &Value) -> Result<String, FenceError> {
    match options.get("fenceUID").and_then(Value::as_str) {
        Some(uid) if !uid.is_empty() => Ok(uid.to_string()),
        _ => Err(ErrorKind::NoOrInvalidArgs.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_ctx(active: &[Fence]) -> ValidationContext<'_> {
        ValidationContext {
            monitoring_available: true,
            background_authorized: true,
            active,
        }
    }

    fn opts(uid: &str, lat: f64, lng: f64, radius: i64) -> Value {
        json!({"name": "n", "uid": uid, "payload": "", "lat": lat, "lng": lng, "radius": radius, "monitor": 3})
    }

    #[test]
    fn wrong_types_are_shape_failures() {
        let mut v = opts("a", 1.0, 1.0, 500);
        v["radius"] = json!(500.5);
        let e = parse_fence_options(&v).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidFenceObj);

        let mut v = opts("a", 1.0, 1.0, 500);
        v["lat"] = json!("1.0");
        assert!(parse_fence_options(&v).is_err());

        let mut v = opts("a", 1.0, 1.0, 500);
        v["monitor"] = json!(0);
        assert!(parse_fence_options(&v).is_err());

        assert!(parse_fence_options(&json!([1, 2])).is_err());
        assert!(parse_fence_options(&opts("", 1.0, 1.0, 500)).is_err());
    }

    #[test]
    fn integer_coordinates_are_numbers() {
        let d = parse_fence_options(&json!({
            "name": "n", "uid": "a", "payload": "", "lat": 1, "lng": 2, "radius": 500, "monitor": 1
        }))
        .unwrap();
        assert_eq!(d.center, Coordinate::new(1.0, 2.0));
        assert_eq!(d.monitor, TransitionType::Enter);
    }

    #[test]
    fn out_of_range_center_is_rejected() {
        let e = validate_new_fence(&FencePolicy::ios(), ok_ctx(&[]), &opts("a", 91.0, 0.0, 500))
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidFenceObj);
    }

    #[test]
    fn android_policy_raises_limit_only() {
        let p = FencePolicy::android();
        assert_eq!(p.limit, 100);
        assert_eq!(p.min_radius_m, FencePolicy::ios().min_radius_m);
    }

    #[test]
    fn remove_args() {
        assert_eq!(parse_remove_args(&json!({"fenceUID": "x"})).unwrap(), "x");
        for bad in [json!({}), json!({"fenceUID": ""}), json!({"fenceUID": 4}), json!(null)] {
            assert_eq!(
                parse_remove_args(&bad).unwrap_err().kind(),
                ErrorKind::NoOrInvalidArgs
            );
        }
    }
}
