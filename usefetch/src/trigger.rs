//! Auto-dispatch decisions.

use serde_json::Value;

use crate::descriptor::ShouldDispatch;

/// Decides whether a trigger dispatches on its own.
///
/// An explicit condition wins. Without one, a dependency list means
/// "dispatch whenever it changes". With neither, the caller dispatches.
pub fn should_auto_dispatch(condition: Option<&ShouldDispatch>, has_dependencies: bool) -> bool {
    match condition {
        Some(condition) => condition.evaluate(),
        None => has_dependencies,
    }
}

/// Remembers the last dependency list a controller saw.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    last: Option<Vec<Value>>,
}

impl DependencyTracker {
    /// Creates a tracker that has seen nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `next` and returns true if it differs from the previous list.
    ///
    /// Lists are compared element by element. The first observation always
    /// counts as a change.
    pub fn observe(&mut self, next: &[Value]) -> bool {
        let changed = match &self.last {
            Some(last) => {
                last.len() != next.len() || last.iter().zip(next).any(|(a, b)| a != b)
            }
            None => true,
        };
        if changed {
            self.last = Some(next.to_vec());
        }
        changed
    }

    /// The last recorded list.
    pub fn last(&self) -> Option<&[Value]> {
        self.last.as_deref()
    }
}
