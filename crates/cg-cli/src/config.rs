//! Configuration file

use anyhow::{Context, Result};
use cg_connector::{SquidexConfig, StoryblokConfig};
use cg_resolver::{DEFAULT_MAX_DEPTH, DEFAULT_SLUG_PREFIX, DEFAULT_TTL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_slug_prefix() -> String {
    DEFAULT_SLUG_PREFIX.to_string()
}

/// Whole configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Record cache and traversal limits
    #[serde(default)]
    pub cache: CacheSettings,
    /// GUID-addressed backend, if any
    #[serde(default)]
    pub squidex: Option<SquidexConfig>,
    /// Slug-addressed backend, if any
    #[serde(default)]
    pub storyblok: Option<StoryblokSettings>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            cache: CacheSettings::default(),
            squidex: None,
            storyblok: None,
        }
    }
}

impl AppConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Fails on malformed TOML or missing required keys.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing configuration")
    }

    /// Load from a file
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// `[cache]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Cache raw records at all
    pub enabled: bool,
    /// Entry lifetime in seconds
    pub ttl_secs: u64,
    /// Maximum number of cached records
    pub capacity: u64,
    /// Reference nesting limit
    pub max_depth: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_TTL.as_secs(),
            capacity: 10_000,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CacheSettings {
    /// Entry lifetime
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// `[storyblok]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryblokSettings {
    /// Delivery API settings
    #[serde(flatten)]
    pub api: StoryblokConfig,
    /// Prepended to every candidate to form the slug
    #[serde(default = "default_slug_prefix")]
    pub slug_prefix: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn full_file() {
        let config = AppConfig::from_toml(
            r#"
            log_filter = "debug"

            [cache]
            ttl_secs = 60

            [squidex]
            base_url = "https://cms.local"
            app = "site"
            token = "secret"
            host = "cms.internal"

            [storyblok]
            token = "public"
            slug_prefix = "pages/"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.cache.ttl(), Duration::from_secs(60));
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_depth, DEFAULT_MAX_DEPTH);

        let squidex = config.squidex.unwrap();
        assert_eq!(squidex.host.as_deref(), Some("cms.internal"));
        assert_eq!(squidex.timeout_secs, 5);

        let storyblok = config.storyblok.unwrap();
        assert_eq!(storyblok.api.token, "public");
        assert_eq!(storyblok.slug_prefix, "pages/");
    }

    #[test]
    fn storyblok_prefix_defaults() {
        let config = AppConfig::from_toml("[storyblok]\ntoken = \"t\"").unwrap();
        assert_eq!(config.storyblok.unwrap().slug_prefix, "cms/");
    }

    #[test]
    fn squidex_requires_token() {
        assert!(AppConfig::from_toml("[squidex]\nbase_url = \"x\"\napp = \"a\"").is_err());
    }
}
