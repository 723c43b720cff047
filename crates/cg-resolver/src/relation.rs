//! Cross-node relation cache signal
//!
//! Some probes mutate state that makes relation caching stale for the rest
//! of the request. Providers raise that explicitly through this seam.

use std::sync::atomic::{AtomicBool, Ordering};

/// Receiver of "suspend relation caching" signals
#[cfg_attr(test, mockall::automock)]
pub trait RelationCacheSignal: Send + Sync {
    /// Enable or suspend cross-node relation caching
    fn set_active(&self, active: bool);
}

/// Flag-backed signal receiver, active until told otherwise
#[derive(Debug)]
pub struct RelationCacheSwitch {
    active: AtomicBool,
}

impl RelationCacheSwitch {
    /// Create an active switch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
        }
    }

    /// Whether relation caching is currently allowed
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Default for RelationCacheSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationCacheSignal for RelationCacheSwitch {
    fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_toggles() {
        let switch = RelationCacheSwitch::new();
        assert!(switch.is_active());

        switch.set_active(false);
        assert!(!switch.is_active());
    }
}
