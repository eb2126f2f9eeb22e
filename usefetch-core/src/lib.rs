// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # usefetch Core
//!
//! Core types shared by every `usefetch` crate.
//!
//! - Request verbs
//! - Lifecycle status and the per-call-site request state
//! - Authorization token accessors
//! - Error types
//!
//! ## Key Types
//!
//! - [`Verb`] - The four supported HTTP verbs
//! - [`Phase`] - The authoritative lifecycle phase of a request
//! - [`Status`] - Flag view of a phase (`is_pending`, `is_fulfilled`, ...)
//! - [`RequestState`] - Data plus status, as observed by a UI call-site
//! - [`AuthToken`] - Literal or lazily computed authorization token

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{AuthToken, Phase, RequestState, Status, Verb};
