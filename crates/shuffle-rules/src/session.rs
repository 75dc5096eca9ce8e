//! Session-wide state shared by every context of one user session
//!
//! Some shuffles span folders, so their halves are seen by different
//! evaluator contexts. The session store links them: a bounded LRU map that
//! all contexts created from the same [`SessionContext`] share.

use hashlink::LruCache;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Capacity used when the configuration does not name one
pub const DEFAULT_SESSION_CAPACITY: usize = 64;

/// Bounded key/value store; the least recently used entry is evicted first.
pub struct SessionStore {
    entries: Mutex<LruCache<String, String>>,
    capacity: usize,
}

impl SessionStore {
    /// A store holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity,
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn record(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries().insert(key.into(), value.into())
    }

    /// Look up `key`, marking it as recently used.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    pub fn forget(&self, key: &str) -> Option<String> {
        self.entries().remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Handle to one session's shared state.
///
/// Cloning is cheap; every clone refers to the same store.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    store: Arc<SessionStore>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Arc::new(SessionStore::new(capacity)),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }
}
