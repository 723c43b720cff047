//! Binary asset references

use crate::identifier::Identifier;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata an asset catalog knows about one asset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssetMetadata {
    /// Asset revision, used to build cache-busting URLs
    pub version: Option<u64>,
    /// Any further catalog attributes (mime type, file name, ...)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl AssetMetadata {
    /// Metadata carrying only a version
    #[inline]
    #[must_use]
    pub fn with_version(version: u64) -> Self {
        Self {
            version: Some(version),
            attributes: Map::new(),
        }
    }

    /// Add an attribute
    #[inline]
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Reference to a binary resource
///
/// An asset without metadata is a valid, fully-formed value: it is what an
/// unresolvable reference degrades to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    identifier: Identifier,
    metadata: Option<AssetMetadata>,
}

impl Asset {
    /// Asset known only by its identifier
    #[inline]
    #[must_use]
    pub fn bare(identifier: impl Into<Identifier>) -> Self {
        Self {
            identifier: identifier.into(),
            metadata: None,
        }
    }

    /// Asset with catalog metadata
    #[inline]
    #[must_use]
    pub fn with_metadata(identifier: impl Into<Identifier>, metadata: AssetMetadata) -> Self {
        Self {
            identifier: identifier.into(),
            metadata: Some(metadata),
        }
    }

    /// Asset identifier
    #[inline]
    #[must_use]
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Catalog metadata, absent for bare assets
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> Option<&AssetMetadata> {
        self.metadata.as_ref()
    }

    /// Asset revision if known
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        self.metadata.as_ref().and_then(|m| m.version)
    }

    /// True when no catalog had a record for this asset
    #[inline]
    #[must_use]
    pub fn is_bare(&self) -> bool {
        self.metadata.is_none()
    }

    /// JSON rendering used when printing resolved trees
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("__asset__".to_string(), Value::String(self.identifier.to_string()));
        if let Some(metadata) = &self.metadata {
            if let Some(version) = metadata.version {
                object.insert("version".to_string(), Value::from(version));
            }
            for (key, value) in &metadata.attributes {
                object.insert(key.clone(), value.clone());
            }
        }
        Value::Object(object)
    }
}
