// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # usefetch Store
//!
//! The shared context every request controller reads from.
//!
//! This crate provides:
//!
//! - **FetchProvider**: Owns the HTTP adapter, the auth token and the
//!   response cache for one subtree; mounting it makes contexts ready
//! - **FetchContext**: Cheap handle controllers use to read the token and
//!   to read or write cache entries, with change notifications
//! - **ProviderConfig**: Serializable provider configuration
//!
//! ## Usage
//!
//! ```ignore
//! use usefetch_store::{FetchProvider, ProviderConfig};
//!
//! let config = ProviderConfig::load_default()?.with_env();
//! let provider = FetchProvider::mount(&config)?;
//! let ctx = provider.context();
//!
//! // Subscribe to cache writes
//! let mut rx = ctx.subscribe()?;
//! while rx.changed().await.is_ok() {
//!     println!("Cache updated!");
//! }
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod error;

pub use cache::CacheEntry;
pub use config::{LogLevel, ProviderConfig};
pub use context::{ContextSnapshot, FetchContext, FetchProvider, ProviderBuilder};
pub use error::StoreError;
