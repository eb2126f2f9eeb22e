//! Cache entries.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use usefetch_core::RequestState;

/// A cached request state with the time it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached state, type-erased to JSON.
    pub state: RequestState<Value>,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stored now.
    pub fn new(state: RequestState<Value>) -> Self {
        Self {
            state,
            stored_at: Utc::now(),
        }
    }

    /// Age of the entry.
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.stored_at)
    }

    /// Returns true if the entry is older than `ttl`. Without a TTL entries
    /// never expire.
    pub fn is_expired(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => {
                self.age() > chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX)
            }
            None => false,
        }
    }
}
