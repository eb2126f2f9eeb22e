// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # usefetch Fetch
//!
//! The transport side of `usefetch`.
//!
//! ## Transport
//!
//! - [`transport::Transport`] - The opaque HTTP capability
//! - [`transport::ReqwestTransport`] - `reqwest`-backed implementation
//!
//! ## Adapter
//!
//! - [`http::Http`] - Resolves URLs against a base, attaches auth headers,
//!   merges caller options and turns cancellation into a no-op result
//! - [`call::TransportCall`] - One call's positional arguments
//!
//! ## Cancellation
//!
//! - [`cancel::Cancelable`] - Keeps at most one live request per call-site
//!
//! ## Example
//!
//! ```ignore
//! use usefetch_fetch::{Cancelable, Http, RequestOptions};
//!
//! let http = Http::with_reqwest("https://api.example.com")?;
//! let cancel = Cancelable::new();
//!
//! // A newer call supersedes this one; its result then reads as `None`.
//! let call = TransportCall::get("/users/1", None, RequestOptions::default());
//! let response = cancel.call(&http, call).await?;
//! ```

pub mod call;
pub mod cancel;
pub mod error;
pub mod http;
pub mod options;
pub mod transport;

pub use call::TransportCall;
pub use cancel::{CancelSignal, Cancelable};
pub use error::{TransportError, UsageError};
pub use http::Http;
pub use options::RequestOptions;
pub use transport::{ReqwestTransport, Response, Transport, TransportRequest};
