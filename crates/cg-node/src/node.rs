//! Resolved nodes and field values

use crate::asset::Asset;
use crate::identifier::Identifier;
use crate::keyword;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// Field name to resolved value, in record order
pub type NodeData = IndexMap<String, FieldValue>;

/// Opaque metadata carried from the raw record
pub type Context = Map<String, Value>;

/// A resolved field value
///
/// # Invariants
/// - A reference-shaped string inside a list or map element never survives
///   as [`FieldValue::Text`]; it becomes an [`Asset`], a [`Node`] or, when
///   revisited on the same resolution path, a [`FieldValue::Reference`].
///   A field whose whole value is such a string stays text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// JSON null, also the sentinel for a field whose conversion failed
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Numeric scalar
    Number(Number),
    /// Decorated text
    Text(String),
    /// Ordered collection
    List(Vec<FieldValue>),
    /// Keyed collection
    Map(IndexMap<String, FieldValue>),
    /// Nested resolved node
    Node(Box<Node>),
    /// Binary asset reference
    Asset(Asset),
    /// Back-reference to a node already being resolved higher up the path
    Reference(Identifier),
}

impl FieldValue {
    /// Text value
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Wrap a node
    #[inline]
    #[must_use]
    pub fn node(node: Node) -> Self {
        Self::Node(Box::new(node))
    }

    /// Convert raw JSON structurally, strings kept verbatim
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Borrow as text
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as node
    #[inline]
    #[must_use]
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Borrow as asset
    #[inline]
    #[must_use]
    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            Self::Asset(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as list
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// True for the null sentinel
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// JSON rendering: nodes become their data, assets and back-references
    /// become marker objects
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Text(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Node(node) => node.to_json(),
            Self::Asset(asset) => asset.to_json(),
            Self::Reference(id) => {
                let mut object = Map::new();
                object.insert("__ref__".to_string(), Value::String(id.to_string()));
                Value::Object(object)
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Asset> for FieldValue {
    fn from(value: Asset) -> Self {
        Self::Asset(value)
    }
}

impl From<Node> for FieldValue {
    fn from(value: Node) -> Self {
        Self::node(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Resolved, canonical representation of one content item
///
/// Immutable once constructed. Two resolutions of the same identifier yield
/// structurally equal but distinct nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    data: NodeData,
    context: Context,
}

impl Node {
    /// Create node from converted data and carried context
    #[inline]
    #[must_use]
    pub fn new(data: NodeData, context: Context) -> Self {
        Self { data, context }
    }

    /// Converted field values
    #[inline]
    #[must_use]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Carried metadata
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Field by name
    #[inline]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.data.get(field)
    }

    /// Schema / type tag
    #[must_use]
    pub fn node_type(&self) -> Option<&str> {
        self.get(keyword::NODE_TYPE).and_then(FieldValue::as_text)
    }

    /// Backend record identifier, when the backend reports one
    #[must_use]
    pub fn node_id(&self) -> Option<&str> {
        self.get(keyword::NODE_ID).and_then(FieldValue::as_text)
    }

    /// Split into data and context
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (NodeData, Context) {
        (self.data, self.context)
    }

    /// JSON rendering of the node data
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Node", 2)?;
        state.serialize_field("data", &self.to_json())?;
        state.serialize_field("context", &self.context)?;
        state.end()
    }
}
