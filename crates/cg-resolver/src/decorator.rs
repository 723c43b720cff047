//! Leaf text decoration
//!
//! Every resolved text value passes through a [`DecoratorChain`] before it
//! lands in the output tree (localization, sanitization, link rewriting...).

use std::fmt;
use std::sync::Arc;

/// Failure inside a single decorator, absorbed by the chain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("decorator '{decorator}' failed: {message}")]
pub struct DecorateError {
    /// Decorator name
    pub decorator: String,
    /// Failure description
    pub message: String,
}

/// One text transformation step
pub trait Decorator: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Transform text
    ///
    /// # Errors
    /// Returns `DecorateError` when this step cannot handle the input; the
    /// chain then keeps the input unchanged.
    fn decorate(&self, text: &str) -> Result<String, DecorateError>;

    /// Decorator priority (higher = applied first)
    fn priority(&self) -> i32 {
        0
    }
}

/// Decorator built from a closure
pub struct FnDecorator<F> {
    name: String,
    priority: i32,
    f: F,
}

impl<F> FnDecorator<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    /// Wrap an infallible closure
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            f,
        }
    }

    /// Set priority
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl<F> Decorator for FnDecorator<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn decorate(&self, text: &str) -> Result<String, DecorateError> {
        Ok((self.f)(text))
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Ordered decorator pipeline
///
/// Total: it never fails. A failing step is skipped and logged.
#[derive(Clone, Default)]
pub struct DecoratorChain {
    decorators: Vec<Arc<dyn Decorator>>,
}

impl fmt::Debug for DecoratorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorChain")
            .field(
                "decorators",
                &self.decorators.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl DecoratorChain {
    /// Create empty chain (identity)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decorator
    pub fn register(&mut self, decorator: impl Decorator + 'static) {
        self.decorators.push(Arc::new(decorator));
        // Stable sort keeps registration order among equal priorities
        self.decorators
            .sort_by_key(|d| std::cmp::Reverse(d.priority()));
    }

    /// Builder form of [`DecoratorChain::register`]
    #[must_use]
    pub fn with(mut self, decorator: impl Decorator + 'static) -> Self {
        self.register(decorator);
        self
    }

    /// Number of registered decorators
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    /// True when the chain is the identity
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Run text through every decorator
    #[must_use]
    pub fn decorate(&self, text: &str) -> String {
        let mut current = text.to_string();
        for decorator in &self.decorators {
            match decorator.decorate(&current) {
                Ok(next) => current = next,
                Err(error) => {
                    tracing::warn!(decorator = decorator.name(), %error, "decorator skipped");
                }
            }
        }
        current
    }
}
