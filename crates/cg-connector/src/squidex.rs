//! GUID-addressed content API connector

use crate::config::SquidexConfig;
use crate::error::ConnectorError;
use crate::http::{build_client, get_json, Fetched};
use async_trait::async_trait;
use cg_node::{Identifier, RawRecord};
use cg_resolver::{Connector, ResolveError};
use reqwest::header::HOST;
use reqwest::Client;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, instrument};

const BACKEND: &str = "squidex";

/// Item keys copied into the record context
const CONTEXT_KEYS: &[&str] = &["version", "status", "lastModified"];

/// Connector for the content API of one app
#[derive(Debug)]
pub struct SquidexConnector {
    client: Client,
    config: SquidexConfig,
    accept_unpublished: AtomicBool,
}

impl SquidexConnector {
    /// Create connector
    ///
    /// # Errors
    /// Returns `ConnectorError` if the token is not a valid header value or
    /// the HTTP client cannot be built.
    pub fn new(config: SquidexConfig) -> Result<Self, ConnectorError> {
        let client = build_client(config.timeout(), Some(&config.token))?;
        Ok(Self {
            client,
            config,
            accept_unpublished: AtomicBool::new(false),
        })
    }

    /// Content query endpoint of the app
    #[must_use]
    pub fn content_url(&self) -> String {
        format!(
            "{}/api/content/{}/",
            self.config.base_url.trim_end_matches('/'),
            self.config.app
        )
    }
}

#[async_trait]
impl Connector for SquidexConnector {
    #[instrument(skip(self), fields(backend = BACKEND))]
    async fn fetch_by_id(&self, identifier: &Identifier) -> Result<RawRecord, ResolveError> {
        let mut request = self
            .client
            .get(self.content_url())
            .query(&[("ids", identifier.as_str())]);
        if let Some(host) = &self.config.host {
            request = request.header(HOST, host.as_str());
        }
        if self.accept_unpublished.load(Ordering::Relaxed) {
            request = request.header("X-Unpublished", "1");
        }

        match get_json(BACKEND, request).await? {
            Fetched::Found(body) => parse_content_response(identifier, &body),
            Fetched::Missing => {
                debug!("content endpoint answered 404");
                Err(ResolveError::not_found(identifier.clone()))
            }
        }
    }

    fn set_accept_unpublished(&self, accept: bool) {
        self.accept_unpublished.store(accept, Ordering::Relaxed);
    }
}

/// Decode a content query response into the record for `identifier`
///
/// The schema comes from `schemaName`, the fields from `data`, and the
/// context from the item's version, status and modification time.
///
/// # Errors
/// `NotFound` when no item carries the requested id, `Transport` when the
/// matching item has no `data` object.
pub fn parse_content_response(
    identifier: &Identifier,
    body: &Value,
) -> Result<RawRecord, ResolveError> {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let item = items
        .iter()
        .find(|item| item.get("id").and_then(Value::as_str) == Some(identifier.as_str()))
        .ok_or_else(|| ResolveError::not_found(identifier.clone()))?;

    let fields = item.get("data").and_then(Value::as_object).cloned().ok_or_else(|| {
        ResolveError::transport(BACKEND, format!("item {identifier} has no data object"))
    })?;

    let schema = item
        .get("schemaName")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let context: Map<String, Value> = CONTEXT_KEYS
        .iter()
        .filter_map(|key| item.get(*key).map(|v| ((*key).to_string(), v.clone())))
        .collect();

    Ok(RawRecord::new(schema, fields).with_context(context))
}
