//! Lifecycle phase and status flags.
//!
//! A request is always in exactly one [`Phase`]. [`Status`] is the flag view
//! UI code reads (`is_pending`, `is_fulfilled`, ...); it can only be built
//! through phase constructors so the flags never contradict each other.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message used when a rejection is recorded without any usable text.
const UNKNOWN_ERROR: &str = "Unknown error";

// ============================================================================
// Phase
// ============================================================================

/// The authoritative lifecycle phase of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing dispatched yet.
    #[default]
    Idle,
    /// A request is in flight.
    Pending,
    /// The last request (or cache lookup, or local update) succeeded.
    Fulfilled,
    /// The last request failed.
    Rejected,
}

impl Phase {
    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pending => "Pending",
            Self::Fulfilled => "Fulfilled",
            Self::Rejected => "Rejected",
        }
    }

    /// Returns true if the phase is terminal for one dispatch.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Fulfilled | Self::Rejected)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Status
// ============================================================================

/// Flag view of a request's lifecycle.
///
/// `is_pending` and `is_fulfilled` are never both set, and `err` is
/// non-empty exactly when `is_rejected` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    is_pending: bool,
    is_rejected: bool,
    is_fulfilled: bool,
    is_cached: bool,
    is_mocked: bool,
    err: String,
}

impl Status {
    /// Status before anything was dispatched.
    pub fn idle(mocked: bool) -> Self {
        Self {
            is_mocked: mocked,
            ..Self::default()
        }
    }

    /// Status while a request is in flight.
    pub fn pending(mocked: bool) -> Self {
        Self {
            is_pending: true,
            is_mocked: mocked,
            ..Self::default()
        }
    }

    /// Status after a network response arrived.
    pub fn fulfilled() -> Self {
        Self {
            is_fulfilled: true,
            ..Self::default()
        }
    }

    /// Status when data was served from the shared cache.
    pub fn cached() -> Self {
        Self {
            is_fulfilled: true,
            is_cached: true,
            ..Self::default()
        }
    }

    /// Status after a failed request.
    ///
    /// An empty message is replaced so that `err` stays non-empty.
    pub fn rejected(err: impl Into<String>, mocked: bool) -> Self {
        let mut err = err.into();
        if err.trim().is_empty() {
            err = UNKNOWN_ERROR.to_string();
        }
        Self {
            is_rejected: true,
            is_mocked: mocked,
            err,
            ..Self::default()
        }
    }

    /// Returns the phase these flags describe.
    pub fn phase(&self) -> Phase {
        if self.is_pending {
            Phase::Pending
        } else if self.is_rejected {
            Phase::Rejected
        } else if self.is_fulfilled {
            Phase::Fulfilled
        } else {
            Phase::Idle
        }
    }

    /// True while a request is in flight.
    pub fn is_pending(&self) -> bool {
        self.is_pending
    }

    /// True after a failed request.
    pub fn is_rejected(&self) -> bool {
        self.is_rejected
    }

    /// True after a successful request, cache hit or local update.
    pub fn is_fulfilled(&self) -> bool {
        self.is_fulfilled
    }

    /// True if the current data came from the shared cache.
    pub fn is_cached(&self) -> bool {
        self.is_cached
    }

    /// True while the data is still the caller-supplied mock payload.
    pub fn is_mocked(&self) -> bool {
        self.is_mocked
    }

    /// The rejection message, empty unless rejected.
    pub fn err(&self) -> &str {
        &self.err
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.phase())?;
        if self.is_cached {
            f.write_str(" (cached)")?;
        }
        if self.is_mocked {
            f.write_str(" (mocked)")?;
        }
        if self.is_rejected {
            write!(f, ": {}", self.err)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
