//! Connector configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

const DEFAULT_STORYBLOK_URL: &str = "https://api.storyblok.com";

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_storyblok_url() -> String {
    DEFAULT_STORYBLOK_URL.to_string()
}

/// GUID-addressed backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquidexConfig {
    /// Scheme and authority, e.g. `https://cloud.squidex.io`
    pub base_url: String,
    /// App name, part of every content path
    pub app: String,
    /// Bearer token
    pub token: String,
    /// `Host` header override, for instances behind a proxy
    #[serde(default)]
    pub host: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl SquidexConfig {
    /// Create config with the default timeout and no host override
    pub fn new(
        base_url: impl Into<String>,
        app: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            app: app.into(),
            token: token.into(),
            host: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// With `Host` header override
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Slug-addressed backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryblokConfig {
    /// Scheme and authority of the delivery API
    #[serde(default = "default_storyblok_url")]
    pub base_url: String,
    /// Delivery token
    pub token: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl StoryblokConfig {
    /// Create config for the public delivery API
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: default_storyblok_url(),
            token: token.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// With another API endpoint
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn squidex_defaults_from_toml() {
        let config: SquidexConfig =
            toml::from_str("base_url = \"https://cms.local\"\napp = \"site\"\ntoken = \"t\"")
                .unwrap();
        assert_eq!(config, SquidexConfig::new("https://cms.local", "site", "t"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn storyblok_defaults_from_toml() {
        let config: StoryblokConfig = toml::from_str("token = \"abc\"\ntimeout_secs = 2").unwrap();
        assert_eq!(config.base_url, "https://api.storyblok.com");
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }
}
