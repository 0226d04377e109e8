//! perimeter-fence
//!
//! Fence data model, validation, and the authoritative active-fence store.
//!
//! Architectural decisions:
//! - Validation runs in a fixed order; the first failing rule wins
//! - The store is an ordered `Vec`: insertion order is observable by callers
//! - Every rejection carries one closed [`ErrorKind`] with a fixed message
//!
//! Pure deterministic logic. No IO, no platform calls, no clock.

mod error;
mod store;
mod types;
mod validate;

pub use error::{ErrorKind, FenceError};
pub use store::FenceStore;
pub use types::*;
pub use validate::{
    parse_fence_options, parse_remove_args, validate_new_fence, CoordinateMatch, FenceDraft,
    FencePolicy, ValidationContext,
};
