//! Per-control "busy" tracking.
//!
//! A control (a vote button, a comment form) holds an [`InFlightGuard`] for
//! the duration of its round trip. While the guard lives, a second attempt
//! on the same key is refused instead of interleaving with the first.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

/// Set of keys with a request currently in flight.
#[derive(Debug)]
pub struct InFlight<K> {
    active: Mutex<HashSet<K>>,
}

impl<K> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            active: Mutex::new(HashSet::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` busy, or return `None` if it already is.
    pub fn try_begin(&self, key: K) -> Option<InFlightGuard<'_, K>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard { owner: self, key })
    }

    pub fn is_active(&self, key: &K) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its key when dropped, including on early return or panic.
#[derive(Debug)]
pub struct InFlightGuard<'a, K: Eq + Hash> {
    owner: &'a InFlight<K>,
    key: K,
}

impl<K: Eq + Hash> Drop for InFlightGuard<'_, K> {
    fn drop(&mut self) {
        self.owner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
