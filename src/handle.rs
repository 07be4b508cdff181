//! Revocable display handles
//!
//! A handle is a display-only reference to some bytes (a preview of the
//! original file or of a finished result). Handles are allocated by a
//! [`HandleRegistry`] and must be revoked by their owner before the owner is
//! dropped; the [`ItemStore`](crate::store::ItemStore) does this on every
//! removal path.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

impl HandleId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle:{}", self.0)
    }
}

/// Allocates and revokes display handles.
pub trait HandleRegistry: Send + Sync {
    fn allocate(&self, content: Arc<[u8]>) -> HandleId;

    /// Returns `false` when the handle was already revoked or never allocated.
    fn revoke(&self, handle: HandleId) -> bool;

    fn is_live(&self, handle: HandleId) -> bool;
}

/// In-process registry keeping the referenced bytes alive until revocation.
#[derive(Debug, Default)]
pub struct MemoryHandleRegistry {
    next_id: AtomicU64,
    live: Mutex<HashMap<HandleId, Arc<[u8]>>>,
}

impl MemoryHandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes behind a live handle.
    pub fn resolve(&self, handle: HandleId) -> Option<Arc<[u8]>> {
        self.live.lock().get(&handle).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}

impl HandleRegistry for MemoryHandleRegistry {
    fn allocate(&self, content: Arc<[u8]>) -> HandleId {
        let handle = HandleId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.live.lock().insert(handle, content);
        handle
    }

    fn revoke(&self, handle: HandleId) -> bool {
        self.live.lock().remove(&handle).is_some()
    }

    fn is_live(&self, handle: HandleId) -> bool {
        self.live.lock().contains_key(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_resolve() {
        let registry = MemoryHandleRegistry::new();
        let bytes: Arc<[u8]> = Arc::from(&b"preview"[..]);

        let handle = registry.allocate(bytes.clone());
        assert!(registry.is_live(handle));
        assert_eq!(registry.resolve(handle).as_deref(), Some(&b"preview"[..]));
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_handles_are_unique() {
        let registry = MemoryHandleRegistry::new();
        let a = registry.allocate(Arc::from(&b"a"[..]));
        let b = registry.allocate(Arc::from(&b"b"[..]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_revoke_twice() {
        let registry = MemoryHandleRegistry::new();
        let handle = registry.allocate(Arc::from(&b"x"[..]));

        assert!(registry.revoke(handle));
        assert!(!registry.revoke(handle));
        assert!(!registry.is_live(handle));
        assert!(registry.resolve(handle).is_none());
        assert_eq!(registry.live_count(), 0);
    }
}
