//! Provider registry
//!
//! Routes a candidate to the first provider that claims it. Providers are
//! probed in descending priority; equal priorities keep registration order.

use crate::context::ResolveContext;
use crate::error::ResolveError;
use crate::provider::NodeProvider;
use cg_node::{Identifier, Node};
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::debug;

/// Ordered set of node providers
///
/// Probing a slug-addressed provider primes per-instance state, so a
/// registry shared between concurrent requests must not hold such
/// providers. Build one registry per request in that case.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn NodeProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl ProviderRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider
    pub fn register(&mut self, provider: impl NodeProvider + 'static) {
        self.register_arc(Arc::new(provider));
    }

    /// Register a shared provider
    pub fn register_arc(&mut self, provider: Arc<dyn NodeProvider>) {
        self.providers.push(provider);
        // stable: ties keep registration order
        self.providers.sort_by_key(|p| Reverse(p.priority()));
    }

    /// Builder form of [`Self::register`]
    #[must_use]
    pub fn with(mut self, provider: impl NodeProvider + 'static) -> Self {
        self.register(provider);
        self
    }

    /// Number of registered providers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in probe order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First provider claiming the candidate
    ///
    /// Probes stop at the first claim; later providers are never asked.
    pub async fn find(&self, candidate: &str, hint: &str) -> Option<Arc<dyn NodeProvider>> {
        for provider in &self.providers {
            if provider.can_resolve(candidate, hint).await {
                debug!(provider = provider.name(), candidate, "provider claimed candidate");
                return Some(Arc::clone(provider));
            }
        }
        None
    }

    /// Route and resolve a candidate
    ///
    /// # Errors
    /// `NotFound` when no provider claims the candidate, otherwise whatever
    /// the claiming provider returns.
    pub async fn resolve(
        &self,
        candidate: &str,
        hint: &str,
        ctx: &ResolveContext,
    ) -> Result<Node, ResolveError> {
        let identifier = Identifier::from(candidate);
        match self.find(candidate, hint).await {
            Some(provider) => provider.resolve_by_id(&identifier, ctx).await,
            None => Err(ResolveError::not_found(identifier)),
        }
    }

    /// Forward the draft-content toggle to every provider
    pub fn set_accept_unpublished(&self, accept: bool) {
        for provider in &self.providers {
            provider.set_accept_unpublished(accept);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cg_node::{FieldValue, NodeData};
    use pretty_assertions::assert_eq;
    use serde_json::Map;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Prefixed {
        name: &'static str,
        prefix: &'static str,
        priority: i32,
        probes: AtomicUsize,
        unpublished: AtomicBool,
    }

    impl Prefixed {
        fn new(name: &'static str, prefix: &'static str, priority: i32) -> Self {
            Self {
                name,
                prefix,
                priority,
                probes: AtomicUsize::new(0),
                unpublished: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl NodeProvider for Prefixed {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn can_resolve(&self, candidate: &str, _hint: &str) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            candidate.starts_with(self.prefix)
        }

        async fn resolve_by_id(
            &self,
            identifier: &Identifier,
            _ctx: &ResolveContext,
        ) -> Result<Node, ResolveError> {
            let mut data = NodeData::new();
            data.insert("by".to_string(), FieldValue::text(self.name));
            data.insert("id".to_string(), FieldValue::text(identifier.as_str()));
            Ok(Node::new(data, Map::new()))
        }

        fn set_accept_unpublished(&self, accept: bool) {
            self.unpublished.store(accept, Ordering::SeqCst);
        }
    }

    #[test]
    fn priority_orders_probes() {
        let registry = ProviderRegistry::new()
            .with(Prefixed::new("low", "", -1))
            .with(Prefixed::new("first", "", 0))
            .with(Prefixed::new("high", "", 5))
            .with(Prefixed::new("second", "", 0));

        assert_eq!(registry.names(), vec!["high", "first", "second", "low"]);
    }

    #[tokio::test]
    async fn first_claim_wins() {
        let greedy = Arc::new(Prefixed::new("greedy", "a", 1));
        let later = Arc::new(Prefixed::new("later", "a", 0));
        let mut registry = ProviderRegistry::new();
        registry.register_arc(later.clone());
        registry.register_arc(greedy.clone());

        let node = registry
            .resolve("abc", "", &ResolveContext::new())
            .await
            .unwrap();
        assert_eq!(node.get("by"), Some(&FieldValue::text("greedy")));
        assert_eq!(later.probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_through_to_claiming_provider() {
        let registry = ProviderRegistry::new()
            .with(Prefixed::new("x", "x", 1))
            .with(Prefixed::new("y", "y", 0));

        let node = registry
            .resolve("yes", "", &ResolveContext::new())
            .await
            .unwrap();
        assert_eq!(node.get("by"), Some(&FieldValue::text("y")));
    }

    #[tokio::test]
    async fn unclaimed_candidate_is_not_found() {
        let registry = ProviderRegistry::new().with(Prefixed::new("x", "x", 0));
        let err = registry
            .resolve("nope", "", &ResolveContext::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn unpublished_toggle_reaches_all() {
        let a = Arc::new(Prefixed::new("a", "a", 0));
        let b = Arc::new(Prefixed::new("b", "b", 0));
        let mut registry = ProviderRegistry::new();
        registry.register_arc(a.clone());
        registry.register_arc(b.clone());

        registry.set_accept_unpublished(true);
        assert!(a.unpublished.load(Ordering::SeqCst));
        assert!(b.unpublished.load(Ordering::SeqCst));
    }
}
