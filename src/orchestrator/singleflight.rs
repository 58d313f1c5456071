//! Per-job-key single-flight registry.
//!
//! Downstream state (accumulated plan JSON, accumulated file content) is
//! mutated incrementally and is not re-entrant safe, so at most one
//! generation may be in flight per logical job key. Unrelated keys do not
//! block each other. Release is RAII: the guard removes its key on drop, so
//! every exit path — success, error, panic unwind — frees the slot.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Tracks which job keys currently have a generation in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlightRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key`, or returns `None` when a generation for it is already
    /// in flight.
    #[must_use]
    pub fn acquire(&self, key: &str) -> Option<InFlightGuard> {
        let mut keys = self.keys.lock().expect("in-flight registry lock");
        if keys.insert(key.to_string()) {
            Some(InFlightGuard { key: key.to_string(), keys: Arc::clone(&self.keys) })
        } else {
            None
        }
    }

    /// Returns `true` while `key` is claimed.
    #[must_use]
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.keys.lock().expect("in-flight registry lock").contains(key)
    }
}

/// Holds one claimed job key; dropping it releases the slot.
#[derive(Debug)]
pub struct InFlightGuard {
    key: String,
    keys: Arc<Mutex<HashSet<String>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys.lock().expect("in-flight registry lock").remove(&self.key);
    }
}
