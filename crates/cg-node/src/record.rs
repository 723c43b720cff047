//! Backend-native records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One content item as a connector returns it, before resolution
///
/// Field values are arbitrary JSON and may embed identifiers of other
/// records or assets. The context side-channel (locale, version, publish
/// state, ...) is carried through to the resolved node untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRecord {
    /// Schema / type tag of the record
    pub schema: String,
    /// Field name to raw field value
    pub fields: Map<String, Value>,
    /// Opaque metadata
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl RawRecord {
    /// Create a record with no context
    #[inline]
    #[must_use]
    pub fn new(schema: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            schema: schema.into(),
            fields,
            context: Map::new(),
        }
    }

    /// Attach context metadata
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Build from a JSON object literal, mostly for fixtures
    ///
    /// Non-object values produce a record with no fields.
    #[must_use]
    pub fn from_json(schema: impl Into<String>, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(schema, fields)
    }
}
