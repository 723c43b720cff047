//! Error types for node resolution
//!
//! Distinguishes:
//! - Missing records (recoverable: try another provider, or degrade to an asset)
//! - Transport failures (never downgraded, surfaced to the caller)
//! - Failures local to one field (recorded as diagnostics, never thrown)

use cg_node::Identifier;

/// Errors raised while resolving an identifier
///
/// `Clone` so a single failed cache computation can be handed to every
/// caller waiting on the same key.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// Identifier does not exist at this backend
    #[error("not found: {identifier}")]
    NotFound {
        /// Identifier that was looked up
        identifier: Identifier,
    },

    /// Upstream unreachable or answered with something unusable
    #[error("transport error from {backend}: {message}")]
    Transport {
        /// Backend kind that failed
        backend: String,
        /// Failure description
        message: String,
    },

    /// Reference chain deeper than the configured limit
    #[error("resolution depth {depth} exceeded at {identifier}")]
    DepthExceeded {
        /// Identifier at which the limit was hit
        identifier: Identifier,
        /// Configured limit
        depth: usize,
    },

    /// Rich-text renderer rejected a document
    #[error("rich text rendering failed: {0}")]
    RichText(String),
}

impl ResolveError {
    /// Create not-found error
    #[inline]
    pub fn not_found(identifier: impl Into<Identifier>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Create transport error
    #[inline]
    pub fn transport(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Check if the identifier simply does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if the backend could not be reached
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Diagnostic for one field that could not be converted
///
/// The field's value in the node is [`cg_node::FieldValue::Null`]; sibling
/// fields convert normally.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConversionFailure {
    /// Record being converted, when it has a known identifier
    pub record: Option<Identifier>,
    /// Field name
    pub field: String,
    /// Underlying failure
    pub error: ResolveError,
}

impl std::fmt::Display for FieldConversionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.record {
            Some(record) => write!(f, "field '{}' of {}: {}", self.field, record, self.error),
            None => write!(f, "field '{}': {}", self.field, self.error),
        }
    }
}

/// Result type alias for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = ResolveError::not_found("abc");
        assert_eq!(err.to_string(), "not found: abc");
        assert!(err.is_not_found());
        assert!(!err.is_transport());
    }

    #[test]
    fn transport_display() {
        let err = ResolveError::transport("squidex", "connection refused");
        assert_eq!(err.to_string(), "transport error from squidex: connection refused");
        assert!(err.is_transport());
    }

    #[test]
    fn field_failure_display() {
        let failure = FieldConversionFailure {
            record: Some(Identifier::from("rec")),
            field: "body".to_string(),
            error: ResolveError::RichText("bad node".to_string()),
        };
        assert_eq!(
            failure.to_string(),
            "field 'body' of rec: rich text rendering failed: bad node"
        );
    }
}
