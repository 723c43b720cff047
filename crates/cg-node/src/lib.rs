//! Content Graph Node Model
//!
//! Typed representation of content records after resolution.
//!
//! # Core Concepts
//!
//! - [`Identifier`]: Opaque token naming one content item or asset at a backend
//! - [`RawRecord`]: Backend-native record as returned by a connector
//! - [`Node`]: Resolved record, its fields converted into [`FieldValue`]s
//! - [`Asset`]: Reference to a binary resource, with optional version metadata
//!
//! # Example
//!
//! ```rust
//! use cg_node::{Asset, FieldValue, Node, NodeData};
//!
//! let mut data = NodeData::new();
//! data.insert("title".to_string(), FieldValue::text("Hello"));
//! data.insert("cover".to_string(), FieldValue::Asset(Asset::bare("c0ffee")));
//!
//! let node = Node::new(data, Default::default());
//! assert_eq!(node.get("title").and_then(FieldValue::as_text), Some("Hello"));
//! ```

#![warn(unreachable_pub)]

mod asset;
mod identifier;
pub mod keyword;
mod node;
mod record;

pub use asset::{Asset, AssetMetadata};
pub use identifier::Identifier;
pub use node::{Context, FieldValue, Node, NodeData};
pub use record::RawRecord;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
