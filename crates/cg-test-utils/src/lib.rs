//! Testing utilities for the content graph workspace
//!
//! In-memory connector, recording observer and record fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use cg_node::{Identifier, RawRecord};
use cg_resolver::{Connector, ResolutionEvent, ResolutionObserver, ResolveError};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// Backend name reported by [`StaticConnector`] transport failures
pub const STATIC_BACKEND: &str = "static";

/// Deterministic GUID-shaped identifier, distinct per `n`
pub fn guid(n: u32) -> String {
    format!("{n:08x}-0000-4000-8000-{n:012x}")
}

/// Record whose fields are the given JSON object
///
/// Non-object `fields` produce an empty record.
pub fn record(schema: &str, fields: Value) -> RawRecord {
    RawRecord::from_json(schema, fields)
}

/// Connector serving records from memory
///
/// Counts calls per key so tests can assert cache behavior. Keys registered
/// with [`Self::fail_with_transport`] return a transport error instead.
#[derive(Debug, Default)]
pub struct StaticConnector {
    by_id: DashMap<String, RawRecord>,
    by_slug: DashMap<String, RawRecord>,
    broken: DashMap<String, String>,
    calls: DashMap<String, usize>,
    accept_unpublished: AtomicBool,
}

impl StaticConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `record` for `id`
    pub fn with_record(self, id: impl Into<String>, record: RawRecord) -> Self {
        self.by_id.insert(id.into(), record);
        self
    }

    /// Serve `record` for `slug`
    pub fn with_slug(self, slug: impl Into<String>, record: RawRecord) -> Self {
        self.by_slug.insert(slug.into(), record);
        self
    }

    /// Fail every fetch of `key` (id or slug) with a transport error
    pub fn fail_with_transport(self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.broken.insert(key.into(), message.into());
        self
    }

    /// Replace the record served for `id`
    pub fn replace(&self, id: impl Into<String>, record: RawRecord) {
        self.by_id.insert(id.into(), record);
    }

    /// Number of fetches of `key` so far
    pub fn calls(&self, key: &str) -> usize {
        self.calls.get(key).map(|c| *c).unwrap_or(0)
    }

    /// Total fetches so far
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }

    pub fn accepts_unpublished(&self) -> bool {
        self.accept_unpublished.load(Ordering::SeqCst)
    }

    fn lookup(
        &self,
        key: &str,
        table: &DashMap<String, RawRecord>,
    ) -> Result<RawRecord, ResolveError> {
        *self.calls.entry(key.to_string()).or_insert(0) += 1;
        if let Some(message) = self.broken.get(key) {
            return Err(ResolveError::transport(STATIC_BACKEND, message.value().clone()));
        }
        table
            .get(key)
            .map(|r| r.value().clone())
            .ok_or_else(|| ResolveError::not_found(key))
    }
}

#[async_trait]
impl Connector for StaticConnector {
    async fn fetch_by_id(&self, identifier: &Identifier) -> Result<RawRecord, ResolveError> {
        self.lookup(identifier.as_str(), &self.by_id)
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<RawRecord, ResolveError> {
        self.lookup(slug, &self.by_slug)
    }

    fn set_accept_unpublished(&self, accept: bool) {
        self.accept_unpublished.store(accept, Ordering::SeqCst);
    }
}

/// Observer keeping every event for later assertions
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ResolutionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn events(&self) -> Vec<ResolutionEvent> {
        self.events.lock().clone()
    }

    /// Events matching `predicate`
    pub fn filtered(&self, predicate: impl Fn(&ResolutionEvent) -> bool) -> Vec<ResolutionEvent> {
        self.events.lock().iter().filter(|e| predicate(e)).cloned().collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ResolutionObserver for RecordingObserver {
    fn observe(&self, event: ResolutionEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guids_are_node_ids() {
        assert!(cg_resolver::is_node_id(&guid(1)));
        assert!(cg_resolver::is_node_id(&guid(u32::MAX)));
        assert_ne!(guid(1), guid(2));
    }
}
