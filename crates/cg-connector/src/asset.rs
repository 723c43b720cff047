//! Asset catalog backed by the asset API

use crate::config::SquidexConfig;
use crate::error::ConnectorError;
use crate::http::{build_client, get_json, Fetched};
use async_trait::async_trait;
use cg_node::{AssetMetadata, Identifier};
use cg_resolver::AssetResolver;
use reqwest::header::HOST;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

const BACKEND: &str = "squidex-assets";

/// Attributes copied from the asset descriptor besides the version
const ATTRIBUTE_KEYS: &[&str] = &["fileName", "mimeType", "isImage", "fileSize"];

/// Looks identifiers up in the asset API of one app
///
/// Any failure, including transport errors, counts as "not an asset".
#[derive(Debug)]
pub struct SquidexAssetResolver {
    client: Client,
    config: SquidexConfig,
}

impl SquidexAssetResolver {
    /// Create resolver sharing the content connector's settings
    ///
    /// # Errors
    /// Returns `ConnectorError` if the HTTP client cannot be built.
    pub fn new(config: SquidexConfig) -> Result<Self, ConnectorError> {
        let client = build_client(config.timeout(), Some(&config.token))?;
        Ok(Self { client, config })
    }

    /// Asset endpoint for one identifier
    #[must_use]
    pub fn asset_url(&self, identifier: &Identifier) -> String {
        format!(
            "{}/api/apps/{}/assets/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.app,
            identifier
        )
    }
}

/// Asset metadata from an asset descriptor, if it carries a version
fn parse_asset(body: &Value) -> Option<AssetMetadata> {
    let version = body.get("version").and_then(Value::as_u64)?;
    Some(
        ATTRIBUTE_KEYS
            .iter()
            .filter_map(|key| body.get(*key).map(|v| (*key, v.clone())))
            .fold(AssetMetadata::with_version(version), |meta, (k, v)| {
                meta.attribute(k, v)
            }),
    )
}

#[async_trait]
impl AssetResolver for SquidexAssetResolver {
    async fn lookup(&self, identifier: &Identifier) -> Option<AssetMetadata> {
        let mut request = self.client.get(self.asset_url(identifier));
        if let Some(host) = &self.config.host {
            request = request.header(HOST, host.as_str());
        }

        match get_json(BACKEND, request).await {
            Ok(Fetched::Found(body)) => parse_asset(&body),
            Ok(Fetched::Missing) => None,
            Err(error) => {
                debug!(%identifier, %error, "asset lookup failed");
                None
            }
        }
    }
}
