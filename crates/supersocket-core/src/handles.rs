//! Opaque handles for foreign bindings.
//!
//! Bindings hand out a [`Handle`] instead of a pointer. Looking up a handle
//! that was removed or never issued yields `None` rather than undefined
//! behavior.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

/// Opaque identifier of an object in a [`HandleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    /// Raw value for passing across a binding boundary.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Rebuild from a raw value.
    pub const fn from_u64(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Thread-safe map from handles to shared objects. Handles are never reused.
#[derive(Debug)]
pub struct HandleTable<T> {
    next: AtomicU64,
    entries: Mutex<HashMap<u64, Arc<T>>>,
}

impl<T> HandleTable<T> {
    /// Empty table. The first handle is 1, so 0 never names an object.
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1), entries: Mutex::new(HashMap::new()) }
    }

    /// Store `value` and return its handle.
    pub fn insert(&self, value: T) -> Handle {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.entries().insert(id, Arc::new(value));
        Handle(id)
    }

    /// Shared reference to the object behind `handle`.
    pub fn get(&self, handle: Handle) -> Option<Arc<T>> {
        self.entries().get(&handle.0).cloned()
    }

    /// Remove and return the object behind `handle`.
    pub fn remove(&self, handle: Handle) -> Option<Arc<T>> {
        self.entries().remove(&handle.0)
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// True if no handle is live.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<u64, Arc<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let table = HandleTable::new();
        let a = table.insert("a");
        let b = table.insert("b");

        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(a).as_deref(), Some(&"a"));

        assert_eq!(table.remove(a).as_deref(), Some(&"a"));
        assert!(table.get(a).is_none());
        assert!(table.remove(a).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn handles_are_not_reused() {
        let table = HandleTable::new();
        let first = table.insert(1);
        table.remove(first);
        let second = table.insert(2);
        assert_ne!(first, second);
        assert!(table.get(Handle::from_u64(0)).is_none());
    }
}
