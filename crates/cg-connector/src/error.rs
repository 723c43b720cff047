//! Connector construction errors

use cg_resolver::ResolveError;

/// Failure to build a connector
///
/// Request-time failures are reported as [`ResolveError`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// HTTP client could not be built
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),

    /// Configured value is not a valid header
    #[error("invalid header value for {name}")]
    InvalidHeader {
        /// Header name
        name: &'static str,
    },
}

/// Map a request-time `reqwest` failure to a transport error
pub(crate) fn transport(backend: &str, error: &reqwest::Error) -> ResolveError {
    let message = if error.is_timeout() {
        format!("timed out: {error}")
    } else {
        error.to_string()
    };
    ResolveError::transport(backend, message)
}
