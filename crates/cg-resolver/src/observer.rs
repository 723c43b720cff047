//! Resolution observation points
//!
//! The resolution algorithm reports what it does through an injected
//! [`ResolutionObserver`] instead of logging inline. [`TracingObserver`] is
//! the default and forwards everything to `tracing`.

use crate::error::{FieldConversionFailure, ResolveError};
use cg_node::Identifier;

/// Something noteworthy that happened during resolution
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionEvent {
    /// A capability probe is about to hit the backend
    ProbeAttempted {
        /// Provider name
        provider: String,
        /// Candidate being probed
        candidate: String,
    },
    /// Probe found the candidate; its record is primed for the next resolve
    ProbeSucceeded {
        /// Provider name
        provider: String,
        /// Candidate being probed
        candidate: String,
    },
    /// Probe failed; the provider declined the candidate
    ProbeFailed {
        /// Provider name
        provider: String,
        /// Candidate being probed
        candidate: String,
        /// Why
        error: ResolveError,
    },
    /// Raw record obtained (from cache or connector)
    FetchSucceeded {
        /// Provider name
        provider: String,
        /// Record identifier
        identifier: Identifier,
    },
    /// Raw record could not be obtained
    FetchFailed {
        /// Provider name
        provider: String,
        /// Record identifier
        identifier: Identifier,
        /// Why
        error: ResolveError,
    },
    /// Dangling reference replaced by an identifier-only asset
    ReferenceDegraded {
        /// Provider name
        provider: String,
        /// Dangling identifier
        identifier: Identifier,
    },
    /// Identifier revisited on its own resolution path
    CycleDetected {
        /// Provider name
        provider: String,
        /// Revisited identifier
        identifier: Identifier,
    },
    /// One field was replaced by null
    FieldConversionFailed {
        /// Provider name
        provider: String,
        /// Diagnostic
        failure: FieldConversionFailure,
    },
}

/// Receiver of resolution events
pub trait ResolutionObserver: Send + Sync {
    /// Called synchronously at each observation point
    fn observe(&self, event: ResolutionEvent);
}

/// Observer forwarding events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ResolutionObserver for TracingObserver {
    fn observe(&self, event: ResolutionEvent) {
        match event {
            ResolutionEvent::ProbeAttempted { provider, candidate } => {
                tracing::debug!(%provider, %candidate, "probing candidate");
            }
            ResolutionEvent::ProbeSucceeded { provider, candidate } => {
                tracing::debug!(%provider, %candidate, "probe succeeded");
            }
            ResolutionEvent::ProbeFailed {
                provider,
                candidate,
                error,
            } => {
                tracing::debug!(%provider, %candidate, %error, "probe declined");
            }
            ResolutionEvent::FetchSucceeded {
                provider,
                identifier,
            } => {
                tracing::debug!(%provider, %identifier, "record fetched");
            }
            ResolutionEvent::FetchFailed {
                provider,
                identifier,
                error,
            } => {
                tracing::warn!(%provider, %identifier, %error, "record fetch failed");
            }
            ResolutionEvent::ReferenceDegraded {
                provider,
                identifier,
            } => {
                tracing::debug!(%provider, %identifier, "dangling reference kept as bare asset");
            }
            ResolutionEvent::CycleDetected {
                provider,
                identifier,
            } => {
                tracing::warn!(%provider, %identifier, "reference cycle cut");
            }
            ResolutionEvent::FieldConversionFailed { provider, failure } => {
                tracing::warn!(%provider, %failure, "field conversion failed");
            }
        }
    }
}
