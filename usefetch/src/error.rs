//! Hook error types.

use thiserror::Error;
use usefetch_core::CoreError;
use usefetch_store::StoreError;

/// Errors raised when building a request controller.
///
/// Dispatching never fails: network errors become rejected state.
#[derive(Debug, Error)]
pub enum HookError {
    /// The controller was created without a mounted provider.
    #[error("useFetch must be used within a mounted FetchProvider")]
    ProviderNotMounted,

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid descriptor.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl HookError {
    /// Returns true if this is the missing-provider configuration error.
    pub fn is_not_mounted(&self) -> bool {
        matches!(self, HookError::ProviderNotMounted)
    }
}
