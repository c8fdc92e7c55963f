//! The "a key should be present" marker.
//!
//! The marker outlives a reload so the client can tell "never signed in"
//! apart from "signed in, then lost the key". It carries no security meaning
//! and is never a substitute for the key.

use std::sync::atomic::{AtomicBool, Ordering};

/// Persistence for the key-expected flag.
pub trait MarkerStore: Send + Sync {
    fn mark(&self);
    fn unmark(&self);
    fn is_marked(&self) -> bool;
}

/// Marker held in process memory.
///
/// Share one instance between successive [`crate::KeySession`]s to model
/// storage that survives a reload.
#[derive(Debug, Default)]
pub struct MemoryMarker {
    flag: AtomicBool,
}

impl MemoryMarker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkerStore for MemoryMarker {
    fn mark(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    fn unmark(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    fn is_marked(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_marker() {
        let marker = MemoryMarker::new();
        assert!(!marker.is_marked());

        marker.mark();
        assert!(marker.is_marked());

        marker.unmark();
        assert!(!marker.is_marked());
    }
}
