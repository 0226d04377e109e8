//! Closed error taxonomy shared by every caller-facing operation.
//!
//! Each [`ErrorKind`] has a stable code (the string hosts match on) and one
//! fixed human-readable message. Rejections never use a generic message.

use std::fmt;

/// The closed set of failure kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    GeofencingUnavailable,
    ClientUninitialized,
    GenericPlatformError,
    IncorrectPermissions,
    ForegroundDenied,
    InvalidFenceObj,
    AlreadyFenced,
    NoOrInvalidArgs,
    FenceNotFound,
    TooManyFences,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 10] = [
        ErrorKind::GeofencingUnavailable,
        ErrorKind::ClientUninitialized,
        ErrorKind::GenericPlatformError,
        ErrorKind::IncorrectPermissions,
        ErrorKind::ForegroundDenied,
        ErrorKind::InvalidFenceObj,
        ErrorKind::AlreadyFenced,
        ErrorKind::NoOrInvalidArgs,
        ErrorKind::FenceNotFound,
        ErrorKind::TooManyFences,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::GeofencingUnavailable => "GEOFENCING_UNAVAILABLE",
            ErrorKind::ClientUninitialized => "CLIENT_UNINITIALIZED",
            ErrorKind::GenericPlatformError => "GENERIC_PLATFORM_ERROR",
            ErrorKind::IncorrectPermissions => "INCORRECT_PERMISSIONS",
            ErrorKind::ForegroundDenied => "FOREGROUND_DENIED",
            ErrorKind::InvalidFenceObj => "INVALID_FENCE_OBJ",
            ErrorKind::AlreadyFenced => "ALREADY_FENCED",
            ErrorKind::NoOrInvalidArgs => "NO_OR_INVALID_ARGS",
            ErrorKind::FenceNotFound => "FENCE_NOT_FOUND",
            ErrorKind::TooManyFences => "TOO_MANY_FENCES",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::GeofencingUnavailable => "This device does not support geofencing.",
            ErrorKind::ClientUninitialized => {
                "Geofencing client has not been initialized, this should happen automatically \
                 after permissions are granted. Try requesting permissions again."
            }
            ErrorKind::GenericPlatformError => "A platform specific error has occurred.",
            ErrorKind::IncorrectPermissions => {
                "Perimeter does not have any of the required location permissions."
            }
            ErrorKind::ForegroundDenied => {
                "This method requires foreground location permissions first. Request \
                 foreground permissions before calling this method."
            }
            ErrorKind::InvalidFenceObj => "An invalid fence object was supplied.",
            ErrorKind::AlreadyFenced => {
                "A region with the specified UID or coordinates is already fenced."
            }
            ErrorKind::NoOrInvalidArgs => "Invalid arguments for this function.",
            ErrorKind::FenceNotFound => {
                "A fence with that UID was not found in the list of active fences."
            }
            ErrorKind::TooManyFences => {
                "Cannot exceed the platform fence limit. Please remove a region first and \
                 then try to add this one."
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A rejected operation: the kind plus optional detail for logs.
///
/// `Display` renders `CODE: message`; the detail is only visible through
/// [`FenceError::detail`] and `Debug`, so hosts always see the fixed message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FenceError {
    kind: ErrorKind,
    detail: Option<String>,
}

impl FenceError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &'static str {
        self.kind.message()
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl From<ErrorKind> for FenceError {
    fn from(kind: ErrorKind) -> Self {
        FenceError::new(kind)
    }
}

impl fmt::Display for FenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.kind.message())
    }
}

impl std::error::Error for FenceError {}
