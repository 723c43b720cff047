//! Record cache using moka
//!
//! Provides get-or-compute caching of raw records keyed by identifier alone.
//! A later request for the same identifier under a different context gets
//! the cached record; providers needing per-context entries must fold the
//! context into the key.

use crate::error::ResolveError;
use async_trait::async_trait;
use cg_node::RawRecord;
use futures::future::BoxFuture;
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default time-to-live for cached records (30 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(1800);

/// Get-or-compute store for raw records
///
/// # Contract
/// The producer runs at most once per key per TTL window, including under
/// concurrent access. A failed producer caches nothing. Keys are flat, so
/// providers sharing one cache prefix them with their own name.
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// Return the cached record for `key`, or run `producer` and cache its output for `ttl`
    async fn get_or_compute<'a>(
        &'a self,
        key: &'a str,
        ttl: Duration,
        producer: BoxFuture<'a, Result<RawRecord, ResolveError>>,
    ) -> Result<Arc<RawRecord>, ResolveError>;
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

#[derive(Debug, Clone)]
struct CachedRecord {
    record: Arc<RawRecord>,
    ttl: Duration,
}

/// Each entry lives for the TTL it was computed with
struct PerEntryTtl;

impl Expiry<String, CachedRecord> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedRecord,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Concurrent record cache
///
/// Stores records by identifier, enabling:
/// - Single computation per key (concurrent callers share one producer)
/// - Per-entry time-based expiration
/// - Automatic eviction beyond capacity
#[derive(Clone)]
pub struct MokaRecordCache {
    inner: Cache<String, CachedRecord>,
}

impl std::fmt::Debug for MokaRecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaRecordCache")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

impl MokaRecordCache {
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Get record from cache
    #[inline]
    pub async fn get(&self, key: &str) -> Option<Arc<RawRecord>> {
        self.inner.get(key).await.map(|cached| cached.record)
    }

    /// Invalidate cache entry
    #[inline]
    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Check if cache holds a live entry for key
    #[inline]
    pub async fn contains(&self, key: &str) -> bool {
        self.inner.get(key).await.is_some()
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for MokaRecordCache {
    /// Create cache with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl RecordCache for MokaRecordCache {
    async fn get_or_compute<'a>(
        &'a self,
        key: &'a str,
        ttl: Duration,
        producer: BoxFuture<'a, Result<RawRecord, ResolveError>>,
    ) -> Result<Arc<RawRecord>, ResolveError> {
        self.inner
            .try_get_with(key.to_owned(), async move {
                producer.await.map(|record| CachedRecord {
                    record: Arc::new(record),
                    ttl,
                })
            })
            .await
            .map(|cached| cached.record)
            .map_err(|shared| (*shared).clone())
    }
}
