//! Request state as observed by a call-site.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::models::status::{Phase, Status};

/// The data a call-site currently holds plus its lifecycle status.
///
/// Transitions keep `data` unless they carry new data: a pending or failed
/// request never erases the last known good payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestState<T> {
    /// Last known data, or the mock payload before any response.
    pub data: Option<T>,
    /// Lifecycle status.
    pub status: Status,
}

impl<T> RequestState<T> {
    /// Initial state of a call-site. Supplying mock data marks it mocked.
    pub fn initial(mock_data: Option<T>) -> Self {
        let mocked = mock_data.is_some();
        Self {
            data: mock_data,
            status: Status::idle(mocked),
        }
    }

    /// A fulfilled state holding data served from the cache.
    pub fn cached(data: T) -> Self {
        Self {
            data: Some(data),
            status: Status::cached(),
        }
    }

    /// A fulfilled state holding a fresh response.
    pub fn fulfilled(data: T) -> Self {
        Self {
            data: Some(data),
            status: Status::fulfilled(),
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.status.phase()
    }

    /// Moves to pending, keeping data and the mocked flag.
    pub fn begin(&mut self) {
        self.status = Status::pending(self.status.is_mocked());
    }

    /// Moves to fulfilled with fresh data.
    pub fn fulfill(&mut self, data: T) {
        self.data = Some(data);
        self.status = Status::fulfilled();
    }

    /// Moves to fulfilled with data served from the cache.
    pub fn serve_cached(&mut self, data: T) {
        self.data = Some(data);
        self.status = Status::cached();
    }

    /// Moves to rejected, keeping data and the mocked flag.
    pub fn reject(&mut self, err: impl Into<String>) {
        self.status = Status::rejected(err, self.status.is_mocked());
    }

    /// Maps the data while keeping the status.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RequestState<U> {
        RequestState {
            data: self.data.map(f),
            status: self.status,
        }
    }
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self::initial(None)
    }
}

impl<T: Serialize> RequestState<T> {
    /// Converts into a type-erased JSON state for the shared cache.
    pub fn to_json(&self) -> Result<RequestState<Value>, CoreError> {
        let data = self.data.as_ref().map(serde_json::to_value).transpose()?;
        Ok(RequestState {
            data,
            status: self.status.clone(),
        })
    }
}

impl RequestState<Value> {
    /// Decodes a type-erased JSON state into a typed one.
    pub fn decode<T: DeserializeOwned>(self) -> Result<RequestState<T>, CoreError> {
        let data = self.data.map(serde_json::from_value).transpose()?;
        Ok(RequestState {
            data,
            status: self.status,
        })
    }
}
