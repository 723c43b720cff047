//! Per-call resolution context
//!
//! Threaded explicitly through every resolution entry point. Besides the
//! caller's request flags it tracks which identifiers are being resolved on
//! the current path, so that a reference cycle (a → b → a) is cut instead of
//! recursing forever.

use crate::error::ResolveError;
use cg_node::Identifier;

/// Request-scoped resolution state
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    hot_reload: bool,
    path: im::HashSet<Identifier>,
    depth: usize,
}

impl ResolveContext {
    /// Fresh context for a top-level resolution
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the request as a live-preview (hot reload) request
    #[inline]
    #[must_use]
    pub fn with_hot_reload(mut self, hot_reload: bool) -> Self {
        self.hot_reload = hot_reload;
        self
    }

    /// Whether the request is a live-preview request
    #[inline]
    #[must_use]
    pub fn hot_reload(&self) -> bool {
        self.hot_reload
    }

    /// Number of identifiers entered on this path
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether `identifier` is already being resolved higher up this path
    #[inline]
    #[must_use]
    pub fn is_on_path(&self, identifier: &Identifier) -> bool {
        self.path.contains(identifier)
    }

    /// Context for the record a caller asked for by id
    ///
    /// Records `identifier` on the path without checking any depth limit:
    /// the limit bounds how far references are followed, never whether the
    /// requested record itself is returned.
    #[must_use]
    pub fn root(&self, identifier: &Identifier) -> Self {
        self.push(identifier)
    }

    /// Child context for following a reference to `identifier`
    ///
    /// # Errors
    /// Returns `ResolveError::DepthExceeded` when the path is already
    /// `max_depth` identifiers deep.
    pub fn enter(&self, identifier: &Identifier, max_depth: usize) -> Result<Self, ResolveError> {
        if self.depth >= max_depth {
            return Err(ResolveError::DepthExceeded {
                identifier: identifier.clone(),
                depth: max_depth,
            });
        }
        Ok(self.push(identifier))
    }

    fn push(&self, identifier: &Identifier) -> Self {
        Self {
            hot_reload: self.hot_reload,
            path: self.path.update(identifier.clone()),
            depth: self.depth + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_tracks_path_without_touching_parent() {
        let root = ResolveContext::new().with_hot_reload(true);
        let a = Identifier::from("a");

        let child = root.enter(&a, 4).unwrap();
        assert!(child.is_on_path(&a));
        assert!(!root.is_on_path(&a));
        assert_eq!(child.depth(), 1);
        assert!(child.hot_reload());
    }

    #[test]
    fn enter_respects_max_depth() {
        let ctx = ResolveContext::new()
            .enter(&Identifier::from("a"), 2)
            .and_then(|c| c.enter(&Identifier::from("b"), 2))
            .unwrap();

        let err = ctx.enter(&Identifier::from("c"), 2).unwrap_err();
        assert!(matches!(err, ResolveError::DepthExceeded { depth: 2, .. }));
    }

    #[test]
    fn root_ignores_depth_limit() {
        let deep = ResolveContext::new()
            .enter(&Identifier::from("a"), 1)
            .unwrap();
        assert!(deep.enter(&Identifier::from("b"), 1).is_err());

        let top = deep.root(&Identifier::from("b"));
        assert_eq!(top.depth(), 2);
        assert!(top.is_on_path(&Identifier::from("a")));
        assert!(top.is_on_path(&Identifier::from("b")));

        assert!(ResolveContext::new().enter(&Identifier::from("c"), 0).is_err());
        assert_eq!(ResolveContext::new().root(&Identifier::from("c")).depth(), 1);
    }
}
