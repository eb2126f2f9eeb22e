// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # usefetch
//!
//! Request lifecycle tracking for UI call-sites, with a shared in-memory
//! response cache.
//!
//! ## Pieces
//!
//! - [`RequestDescriptor`] - What a call-site requests and how
//! - [`RequestController`] - The `Idle -> Pending -> Fulfilled/Rejected`
//!   state machine, with cache short-circuit, optimistic updates and
//!   cancellation of superseded requests
//! - [`FetchProvider`] / [`FetchContext`] - The shared context controllers
//!   read the token and cache from
//!
//! ## Example
//!
//! ```ignore
//! use usefetch::{FetchProvider, RequestDescriptor, use_fetch};
//!
//! let provider = FetchProvider::builder("https://api.example.com")
//!     .auth_token("tok")
//!     .mount()?;
//!
//! let users = use_fetch::<Vec<User>>(
//!     &provider.context(),
//!     RequestDescriptor::new("/users").cache(true).dependencies(vec![]),
//! )
//! .await?;
//!
//! let state = users.state();
//! if state.status.is_rejected() {
//!     eprintln!("{}", state.status.err());
//! }
//! ```

pub mod controller;
pub mod descriptor;
pub mod error;
pub mod logging;
pub mod trigger;

pub use controller::{Dispatch, RequestController, Update, use_fetch};
pub use descriptor::{AfterHook, Hook, RequestDescriptor, ShouldDispatch};
pub use error::HookError;

pub use usefetch_core::{AuthToken, Phase, RequestState, Status, Verb};
pub use usefetch_fetch::{RequestOptions, Transport, TransportError};
pub use usefetch_store::{FetchContext, FetchProvider, LogLevel, ProviderConfig};
