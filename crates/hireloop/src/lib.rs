//! Job and application lifecycle engine for the student recruiting marketplace.
//!
//! The crate owns job postings, job search, and the application review pipeline. Callers
//! arrive pre-authenticated; everything here works from a trusted `(user id, role)` pair and
//! an injected [`persistence::Database`].

pub mod config;
pub mod error;
pub mod marketplace;
pub mod persistence;
pub mod telemetry;
