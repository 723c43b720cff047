//! Node providers
//!
//! One provider per backend kind. A provider claims candidates through
//! [`NodeProvider::can_resolve`] and turns identifiers into [`Node`]s through
//! [`NodeProvider::resolve_by_id`].

use crate::context::ResolveContext;
use crate::error::ResolveError;
use async_trait::async_trait;
use cg_node::{Identifier, Node};

mod squidex;
mod storyblok;

pub use squidex::{is_node_id, SquidexNodeProvider};
pub use storyblok::{StoryblokNodeProvider, DEFAULT_SLUG_PREFIX};

/// Backend-specific resolver of identifiers into nodes
///
/// # Errors contract
/// - `NotFound`: the backend has no such identifier; a router may try
///   another provider
/// - `Transport`: the backend is unreachable; likely fatal for the request
#[async_trait]
pub trait NodeProvider: Send + Sync {
    /// Provider name, also written into diagnostics
    fn name(&self) -> &str;

    /// Provider priority (higher = probed first by a router)
    fn priority(&self) -> i32 {
        0
    }

    /// Whether this provider claims the candidate
    ///
    /// Never fails: a provider that cannot tell answers `false`.
    async fn can_resolve(&self, candidate: &str, hint: &str) -> bool;

    /// Resolve one identifier into a node
    async fn resolve_by_id(
        &self,
        identifier: &Identifier,
        ctx: &ResolveContext,
    ) -> Result<Node, ResolveError>;

    /// Toggle whether draft content is returned
    fn set_accept_unpublished(&self, accept: bool);
}
