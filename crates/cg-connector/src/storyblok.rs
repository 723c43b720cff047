//! Slug-addressed delivery API connector

use crate::config::StoryblokConfig;
use crate::error::ConnectorError;
use crate::http::{build_client, get_json, Fetched};
use async_trait::async_trait;
use cg_node::{Identifier, RawRecord};
use cg_resolver::{Connector, ResolveError};
use reqwest::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::instrument;

const BACKEND: &str = "storyblok";

/// Which version of a story the delivery API returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryVersion {
    /// Last published version
    Published,
    /// Current draft
    Draft,
}

impl StoryVersion {
    /// Query parameter value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Draft => "draft",
        }
    }
}

/// Connector for the story delivery API
#[derive(Debug)]
pub struct StoryblokConnector {
    client: Client,
    config: StoryblokConfig,
    accept_unpublished: AtomicBool,
}

impl StoryblokConnector {
    /// Create connector
    ///
    /// # Errors
    /// Returns `ConnectorError` if the HTTP client cannot be built.
    pub fn new(config: StoryblokConfig) -> Result<Self, ConnectorError> {
        let client = build_client(config.timeout(), None)?;
        Ok(Self {
            client,
            config,
            accept_unpublished: AtomicBool::new(false),
        })
    }

    /// Version requested given the draft toggle
    #[must_use]
    pub fn version(&self) -> StoryVersion {
        if self.accept_unpublished.load(Ordering::Relaxed) {
            StoryVersion::Draft
        } else {
            StoryVersion::Published
        }
    }

    /// Story endpoint for a slug or uuid
    #[must_use]
    pub fn story_url(&self, path: &str) -> String {
        format!(
            "{}/v2/cdn/stories/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn fetch_story(
        &self,
        path: &str,
        find_by_uuid: bool,
    ) -> Result<RawRecord, ResolveError> {
        let mut request = self.client.get(self.story_url(path)).query(&[
            ("token", self.config.token.as_str()),
            ("version", self.version().as_str()),
        ]);
        if find_by_uuid {
            request = request.query(&[("find_by", "uuid")]);
        }

        match get_json(BACKEND, request).await? {
            Fetched::Found(body) => parse_story_response(path, &body),
            Fetched::Missing => Err(ResolveError::not_found(path)),
        }
    }
}

#[async_trait]
impl Connector for StoryblokConnector {
    #[instrument(skip(self), fields(backend = BACKEND))]
    async fn fetch_by_id(&self, identifier: &Identifier) -> Result<RawRecord, ResolveError> {
        self.fetch_story(identifier.as_str(), true).await
    }

    #[instrument(skip(self), fields(backend = BACKEND))]
    async fn fetch_by_slug(&self, slug: &str) -> Result<RawRecord, ResolveError> {
        self.fetch_story(slug, false).await
    }

    fn set_accept_unpublished(&self, accept: bool) {
        self.accept_unpublished.store(accept, Ordering::Relaxed);
    }
}

/// Decode a single-story response
///
/// Fields are the story's `content`, the schema its `component`, and the
/// context every other story attribute (name, slug, timestamps...).
///
/// # Errors
/// `Transport` when there is no story or its content is not an object: the
/// backend answered 200 with a body it should never send.
pub fn parse_story_response(path: &str, body: &Value) -> Result<RawRecord, ResolveError> {
    let mut story = body
        .get("story")
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| ResolveError::transport(BACKEND, format!("{path}: response has no story")))?;

    let content = match story.remove("content") {
        Some(Value::Object(content)) => content,
        _ => {
            return Err(ResolveError::transport(
                BACKEND,
                format!("{path}: story content is not an object"),
            ))
        }
    };

    let schema = content
        .get("component")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(RawRecord::new(schema, content).with_context(story))
}
