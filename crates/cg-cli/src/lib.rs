//! Command line front end support
//!
//! Configuration file loading, logging setup and registry assembly for the
//! `cg` binary.

#![warn(unreachable_pub)]

mod config;
mod logging;

pub use config::{AppConfig, CacheSettings, StoryblokSettings};
pub use logging::init_tracing;

use anyhow::{Context, Result};
use cg_connector::{SquidexAssetResolver, SquidexConnector, StoryblokConnector};
use cg_resolver::{
    MokaRecordCache, ProviderConfig, ProviderRegistry, RelationCacheSwitch, SquidexNodeProvider,
    StoryblokNodeProvider,
};
use std::sync::Arc;

/// Build a registry with every backend present in `config`
///
/// The GUID-addressed backend is probed first: its probe is syntactic and
/// costs nothing, while the slug-addressed probe is a real fetch.
///
/// # Errors
/// Fails when a connector cannot be built or no backend is configured.
pub fn build_registry(config: &AppConfig) -> Result<ProviderRegistry> {
    let provider_config = ProviderConfig::new()
        .with_ttl(config.cache.ttl())
        .with_max_depth(config.cache.max_depth);
    let cache = config
        .cache
        .enabled
        .then(|| Arc::new(MokaRecordCache::new(config.cache.capacity)));

    let mut registry = ProviderRegistry::new();

    if let Some(squidex) = &config.squidex {
        let connector =
            SquidexConnector::new(squidex.clone()).context("building squidex connector")?;
        let assets =
            SquidexAssetResolver::new(squidex.clone()).context("building squidex asset resolver")?;
        let mut provider = SquidexNodeProvider::new(Arc::new(connector))
            .with_asset_resolver(Arc::new(assets))
            .with_config(provider_config);
        if let Some(cache) = &cache {
            provider = provider.with_cache(cache.clone());
        }
        registry.register(provider);
    }

    if let Some(storyblok) = &config.storyblok {
        let connector = StoryblokConnector::new(storyblok.api.clone())
            .context("building storyblok connector")?;
        let mut provider = StoryblokNodeProvider::new(Arc::new(connector))
            .with_slug_prefix(storyblok.slug_prefix.clone())
            .with_relation_cache(Arc::new(RelationCacheSwitch::new()))
            .with_config(provider_config)
            .with_priority(-1);
        if let Some(cache) = &cache {
            provider = provider.with_cache(cache.clone());
        }
        registry.register(provider);
    }

    anyhow::ensure!(!registry.is_empty(), "no backend configured");
    Ok(registry)
}
