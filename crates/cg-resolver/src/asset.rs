//! Asset catalog seam
//!
//! Used to decide whether a reference-shaped string names an asset before
//! any node fetch is attempted.

use async_trait::async_trait;
use cg_node::{AssetMetadata, Identifier};
use dashmap::DashMap;

/// Asset catalog lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Metadata for a known asset, `None` when the catalog has no record
    async fn lookup(&self, identifier: &Identifier) -> Option<AssetMetadata>;
}

/// Asset catalog held in memory
///
/// Typically filled from a periodic catalog export.
#[derive(Debug, Default)]
pub struct InMemoryAssetCatalog {
    entries: DashMap<Identifier, AssetMetadata>,
}

impl InMemoryAssetCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an asset
    pub fn insert(&self, identifier: impl Into<Identifier>, metadata: AssetMetadata) {
        self.entries.insert(identifier.into(), metadata);
    }

    /// Forget an asset
    pub fn remove(&self, identifier: &Identifier) {
        self.entries.remove(identifier);
    }

    /// Number of known assets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<I: Into<Identifier>> FromIterator<(I, AssetMetadata)> for InMemoryAssetCatalog {
    fn from_iter<T: IntoIterator<Item = (I, AssetMetadata)>>(iter: T) -> Self {
        let catalog = Self::new();
        for (identifier, metadata) in iter {
            catalog.insert(identifier, metadata);
        }
        catalog
    }
}

#[async_trait]
impl AssetResolver for InMemoryAssetCatalog {
    async fn lookup(&self, identifier: &Identifier) -> Option<AssetMetadata> {
        self.entries.get(identifier).map(|entry| entry.value().clone())
    }
}
