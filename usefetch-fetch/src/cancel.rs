//! At-most-one-live-request cancellation.
//!
//! A [`Cancelable`] belongs to one call-site. Every call through it takes
//! a new generation and cancels the previous signal, so only the newest
//! call can produce a result. Older calls resolve to `Ok(None)` whether
//! they were aborted mid-flight or settled after being superseded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::call::TransportCall;
use crate::error::TransportError;
use crate::http::Http;
use crate::transport::Response;

// ============================================================================
// Cancel Signal
// ============================================================================

/// One call's right to commit its result.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    token: CancellationToken,
    generation: u64,
}

impl CancelSignal {
    /// A signal that is never cancelled by a wrapper.
    pub fn detached() -> Self {
        Self {
            token: CancellationToken::new(),
            generation: 0,
        }
    }

    /// The generation this signal was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true once the signal has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels this signal.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Completes when the signal is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

// ============================================================================
// Cancelable
// ============================================================================

/// Per-call-site cancellation handle.
#[derive(Debug, Default)]
pub struct Cancelable {
    generation: AtomicU64,
    current: Mutex<Option<CancellationToken>>,
}

impl Cancelable {
    /// Creates a handle with no live call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the live signal, if any, and issues a new one.
    pub fn issue(&self) -> CancelSignal {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            previous.cancel();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        *current = Some(token.clone());
        debug!(generation, "Issued cancel signal");

        CancelSignal { token, generation }
    }

    /// Returns true if `generation` is the live one.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// The most recently issued generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cancels the live call without issuing a new one.
    ///
    /// Used on unmount: whatever is in flight resolves to `None`.
    pub fn cancel(&self) {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            previous.cancel();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Cancelled live request");
    }

    /// Forwards `call` to `http` with a fresh cancel signal.
    ///
    /// Returns `Ok(None)` if this call was superseded or cancelled before it
    /// settled, including when it failed after being superseded.
    pub async fn call(
        &self,
        http: &Http,
        mut call: TransportCall,
    ) -> Result<Option<Response>, TransportError> {
        let signal = self.issue();
        let generation = signal.generation();
        call.options.cancel = Some(signal);

        let result = http.execute(call).await;

        if !self.is_current(generation) {
            debug!(generation, "Dropping result of superseded request");
            return Ok(None);
        }
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
