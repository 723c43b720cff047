//! Backend connector seam
//!
//! A connector owns transport and authentication for one backend kind and
//! answers raw records. It knows nothing about references or nodes.

use crate::error::ResolveError;
use async_trait::async_trait;
use cg_node::{Identifier, RawRecord};

/// Raw record source for one backend kind
///
/// # Errors
/// Implementations report a missing record as [`ResolveError::NotFound`]
/// and every other failure (timeout, refused connection, undecodable body)
/// as [`ResolveError::Transport`]. Retry policy, if any, lives here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Fetch one record by identifier
    async fn fetch_by_id(&self, identifier: &Identifier) -> Result<RawRecord, ResolveError>;

    /// Fetch one record by slug path
    ///
    /// Only slug-addressed backends support this; the default reports every
    /// slug as missing.
    async fn fetch_by_slug(&self, slug: &str) -> Result<RawRecord, ResolveError> {
        Err(ResolveError::not_found(slug))
    }

    /// Toggle whether draft content is returned
    fn set_accept_unpublished(&self, accept: bool);
}
