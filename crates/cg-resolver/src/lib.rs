//! Content Graph Resolver
//!
//! Turns identifiers and slugs into [`Node`] trees by fetching records from
//! a content backend and converting their fields.
//!
//! # Core Concepts
//!
//! - [`Connector`]: Fetches [`RawRecord`]s from one backend instance
//! - [`NodeProvider`]: Claims candidates and resolves them into nodes
//! - [`SquidexNodeProvider`]: GUID-addressed backend, references fetched lazily
//! - [`StoryblokNodeProvider`]: Slug-addressed backend, content inlined
//! - [`ProviderRegistry`]: Routes a candidate to the first claiming provider
//! - [`RecordCache`]: Per-identifier raw record cache with a TTL
//! - [`DecoratorChain`]: Text post-processing applied to every text leaf
//!
//! # Example
//!
//! ```rust,ignore
//! use cg_resolver::prelude::*;
//!
//! let provider = SquidexNodeProvider::new(connector)
//!     .with_cache(Arc::new(MokaRecordCache::default()))
//!     .with_asset_resolver(catalog);
//!
//! let node = provider
//!     .resolve_by_id(&Identifier::from(id), &ResolveContext::new())
//!     .await?;
//! ```
//!
//! [`Node`]: cg_node::Node
//! [`RawRecord`]: cg_node::RawRecord

#![warn(unreachable_pub)]

pub mod asset;
pub mod cache;
pub mod config;
pub mod connector;
pub mod context;
pub mod decorator;
pub mod error;
pub mod observer;
pub mod provider;
pub mod registry;
pub mod relation;
pub mod richtext;
pub mod shape;

pub use asset::{AssetResolver, InMemoryAssetCatalog};
pub use cache::{CacheStats, MokaRecordCache, RecordCache, DEFAULT_TTL};
pub use config::{ProviderConfig, DEFAULT_MAX_DEPTH};
pub use connector::Connector;
pub use context::ResolveContext;
pub use decorator::{DecorateError, Decorator, DecoratorChain, FnDecorator};
pub use error::{FieldConversionFailure, ResolveError, ResolveResult};
pub use observer::{ResolutionEvent, ResolutionObserver, TracingObserver};
pub use provider::{
    is_node_id, NodeProvider, SquidexNodeProvider, StoryblokNodeProvider, DEFAULT_SLUG_PREFIX,
};
pub use registry::ProviderRegistry;
pub use relation::{RelationCacheSignal, RelationCacheSwitch};
pub use richtext::{PlainTextRenderer, RichTextRenderer};
pub use shape::FieldShape;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{
        AssetResolver, Connector, DecoratorChain, InMemoryAssetCatalog, MokaRecordCache,
        NodeProvider, ProviderConfig, ProviderRegistry, RecordCache, ResolveContext,
        ResolveError, SquidexNodeProvider, StoryblokNodeProvider,
    };
    pub use cg_node::{Asset, FieldValue, Identifier, Node, RawRecord};
    pub use std::sync::Arc;
}
