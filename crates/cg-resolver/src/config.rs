//! Provider configuration

use crate::cache::DEFAULT_TTL;
use std::time::Duration;

/// Default maximum reference depth below one top-level resolution
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Settings shared by node providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Lifetime of cached raw records
    pub ttl: Duration,
    /// Maximum nesting of resolved references
    pub max_depth: usize,
}

impl ProviderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With cache TTL
    #[inline]
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// With maximum reference depth
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
