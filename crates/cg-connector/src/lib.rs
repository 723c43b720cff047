//! Content Graph HTTP Connectors
//!
//! [`Connector`](cg_resolver::Connector) and
//! [`AssetResolver`](cg_resolver::AssetResolver) implementations over
//! `reqwest` for the two supported backend kinds.
//!
//! Response decoding is kept in pure functions so it can be tested without
//! a network.

#![warn(unreachable_pub)]

mod asset;
mod config;
mod error;
mod http;
mod squidex;
mod storyblok;

pub use asset::SquidexAssetResolver;
pub use config::{SquidexConfig, StoryblokConfig, DEFAULT_TIMEOUT_SECS};
pub use error::ConnectorError;
pub use squidex::{parse_content_response, SquidexConnector};
pub use storyblok::{parse_story_response, StoryblokConnector, StoryVersion};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
