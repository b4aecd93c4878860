//! HTTP surface of the lifecycle engine.
//!
//! Handlers only check identity, role and payload shape before delegating to
//! [`LifecycleService`](crate::marketplace::LifecycleService); they never touch the store.

mod applications;
pub mod error;
mod jobs;
pub mod principal;
mod router;

pub use error::ApiError;
pub use principal::{Principal, ROLE_HEADER, USER_ID_HEADER};
pub use router::lifecycle_router;

use std::str::FromStr;

/// Parses a numeric path segment into one of the id newtypes.
pub(crate) fn parse_id<T>(raw: &str, build: fn(i64) -> T) -> Result<T, ApiError> {
    i64::from_str(raw.trim())
        .ok()
        .filter(|value| *value > 0)
        .map(build)
        .ok_or_else(|| ApiError::InvalidInput(format!("'{raw}' is not a valid id")))
}
