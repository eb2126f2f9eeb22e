//! Domain models for usefetch.
//!
//! ## Submodules
//!
//! - [`verb`] - Request verbs
//! - [`status`] - Lifecycle phase and status flags
//! - [`state`] - Request state (data + status)
//! - [`token`] - Authorization token accessors

mod state;
mod status;
mod token;
mod verb;

pub use state::RequestState;
pub use status::{Phase, Status};
pub use token::AuthToken;
pub use verb::Verb;
