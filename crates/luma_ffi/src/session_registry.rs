//! Handle-keyed registry of mounted views.
//!
//! # Invariants
//! - Handles start at 1 and are never reused within a process; `0` means
//!   "no view".
//! - Removing a handle does not cancel calls that already hold the session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub(crate) struct SessionRegistry<S> {
    next: AtomicU64,
    sessions: Mutex<HashMap<u64, Arc<S>>>,
}

impl<S> SessionRegistry<S> {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<u64, Arc<S>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert(&self, session: S) -> u64 {
        let handle = self.next.fetch_add(1, Ordering::SeqCst);
        self.sessions().insert(handle, Arc::new(session));
        handle
    }

    pub(crate) fn get(&self, handle: u64) -> Option<Arc<S>> {
        self.sessions().get(&handle).cloned()
    }

    pub(crate) fn remove(&self, handle: u64) -> Option<Arc<S>> {
        self.sessions().remove(&handle)
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions().len()
    }
}

#[cfg(test)]
mod tests {
    use super::SessionRegistry;
    use std::sync::Arc;

    #[test]
    fn handles_are_unique_and_never_zero() {
        let registry = SessionRegistry::new();
        let first = registry.insert("a");
        let second = registry.insert("b");

        assert_ne!(first, 0);
        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(second).as_deref(), Some(&"b"));
    }

    #[test]
    fn removed_handle_is_gone_but_held_sessions_survive() {
        let registry = SessionRegistry::new();
        let handle = registry.insert(String::from("detail"));
        let held = registry.get(handle).unwrap();

        let removed = registry.remove(handle).unwrap();
        assert!(Arc::ptr_eq(&held, &removed));
        assert!(registry.get(handle).is_none());
        assert!(registry.remove(handle).is_none());

        let next = registry.insert(String::from("again"));
        assert_ne!(next, handle);
    }
}
