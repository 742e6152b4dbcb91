//! In-memory request de-duplication.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Shares one in-flight computation per key.
///
/// The first caller for a key runs the fetch; concurrent callers for the
/// same key block until it finishes and receive a clone of its value. The
/// map lock is held only while looking up the slot, never during a fetch.
#[derive(Debug)]
pub struct RequestCache<K, V> {
    slots: Mutex<HashMap<K, Arc<OnceLock<V>>>>,
}

impl<K, V> Default for RequestCache<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> RequestCache<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, running `fetch` only if no caller has yet.
    pub fn get_or_fetch(&self, key: K, fetch: impl FnOnce() -> V) -> V {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };
        slot.get_or_init(fetch).clone()
    }

    /// Number of distinct keys seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
