//! Field shape classification
//!
//! Every raw value is classified exactly once into a [`FieldShape`], then
//! converted by dispatching on the tag. Each backend owns its classifier;
//! shapes a backend never produces are simply absent from its output.

use serde_json::{Map, Value};

/// Closed set of raw value shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldShape<'a> {
    /// Plain string, goes through the decorator chain
    Text(&'a str),
    /// Number, boolean or null, passes through unchanged
    Scalar(&'a Value),
    /// Single-value wrapper (e.g. `{"iv": X}`) around the inner value
    Envelope(&'a Value),
    /// String that looks like an identifier of this backend
    ReferenceCandidate(&'a str),
    /// Ordered collection to walk element by element
    Sequence(&'a [Value]),
    /// Keyed collection to walk entry by entry
    Mapping(&'a Map<String, Value>),
    /// Sequence of fully inlined sub-records
    NestedNodeSequence(&'a [Value]),
    /// Sequence of inlined asset descriptors
    AssetSequence(&'a [Value]),
    /// Rich-text document envelope
    RichTextDocument(&'a Value),
    /// Single inlined asset descriptor
    InlineAsset(&'a Map<String, Value>),
}

/// True when `key` is present with a non-null value
#[inline]
pub(crate) fn has_value(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).is_some_and(|v| !v.is_null())
}
