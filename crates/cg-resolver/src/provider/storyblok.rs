//! Slug-addressed provider with inlined content
//!
//! Capability is decided by actually fetching the candidate slug. A
//! successful probe primes the fetched record in a single slot which the
//! following [`NodeProvider::resolve_by_id`] consumes, so the backend is hit
//! once per request.
//!
//! The slot makes `can_resolve` + `resolve_by_id` a two-phase protocol on
//! one instance: concurrent probes on a shared instance may consume each
//! other's primed record. Use one instance per request when requests run
//! concurrently.
//!
//! Content arrives fully inlined: nested records, asset descriptors and
//! rich-text documents are classified by shape, no further fetches happen.

use crate::cache::RecordCache;
use crate::config::ProviderConfig;
use crate::connector::Connector;
use crate::context::ResolveContext;
use crate::decorator::DecoratorChain;
use crate::error::{FieldConversionFailure, ResolveError, ResolveResult};
use crate::observer::{ResolutionEvent, ResolutionObserver, TracingObserver};
use crate::provider::NodeProvider;
use crate::relation::RelationCacheSignal;
use crate::richtext::{PlainTextRenderer, RichTextRenderer};
use crate::shape::{has_value, FieldShape};
use async_trait::async_trait;
use cg_node::{keyword, Asset, AssetMetadata, FieldValue, Identifier, Node, NodeData, RawRecord};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Provider name
const PROVIDER_NAME: &str = "storyblok";

/// Marker written into every node under [`keyword::CMS_PROVIDER`]
const CMS_MARKER: &str = "StoryBlok";

/// Default prefix prepended to candidates to form the slug path
pub const DEFAULT_SLUG_PREFIX: &str = "cms/";

/// Reserved key holding a record's identifier
const KEY_UID: &str = "_uid";
/// Reserved key holding a record's type
const KEY_COMPONENT: &str = "component";
/// Asset descriptor keys
const KEY_ASSET_ID: &str = "id";
const KEY_FILENAME: &str = "filename";
/// Rich-text envelope marker
const RICH_TEXT_TYPE: &str = "doc";

/// Record fetched by a successful probe, waiting for the next resolve
#[derive(Debug)]
struct PrimedRecord {
    candidate: String,
    record: Arc<RawRecord>,
}

/// Non-empty sequence whose every element is an object carrying a record id
fn is_nested_node_array(items: &[Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|item| item.as_object().is_some_and(|map| has_value(map, KEY_UID)))
}

/// Sequence whose first element is an asset descriptor
fn is_asset_array(items: &[Value]) -> bool {
    items
        .first()
        .and_then(Value::as_object)
        .is_some_and(is_asset_object)
}

fn is_asset_object(map: &Map<String, Value>) -> bool {
    has_value(map, KEY_ASSET_ID) && has_value(map, KEY_FILENAME)
}

/// Classify a raw value
///
/// Order matters: nested records before asset sequences before generic
/// sequences, since each later predicate is looser.
fn classify(value: &Value) -> FieldShape<'_> {
    match value {
        Value::Array(items) if is_nested_node_array(items) => FieldShape::NestedNodeSequence(items),
        Value::Array(items) if is_asset_array(items) => FieldShape::AssetSequence(items),
        Value::Array(items) => FieldShape::Sequence(items),
        Value::Object(map)
            if map.get("type").and_then(Value::as_str) == Some(RICH_TEXT_TYPE) =>
        {
            FieldShape::RichTextDocument(value)
        }
        Value::Object(map) if is_asset_object(map) => FieldShape::InlineAsset(map),
        Value::Object(map) => FieldShape::Mapping(map),
        Value::String(s) => FieldShape::Text(s),
        other => FieldShape::Scalar(other),
    }
}

fn asset_identifier(map: &Map<String, Value>) -> Identifier {
    match map.get(KEY_ASSET_ID) {
        Some(Value::String(id)) => Identifier::new(id.clone()),
        Some(other) => Identifier::new(other.to_string()),
        None => Identifier::new(String::new()),
    }
}

fn asset_from_descriptor(map: &Map<String, Value>) -> Asset {
    let metadata = AssetMetadata {
        version: None,
        attributes: map.clone(),
    };
    Asset::with_metadata(asset_identifier(map), metadata)
}

/// Node provider for slug-addressed backends with inlined content
pub struct StoryblokNodeProvider {
    connector: Arc<dyn Connector>,
    cache: Option<Arc<dyn RecordCache>>,
    renderer: Arc<dyn RichTextRenderer>,
    decorators: DecoratorChain,
    observer: Arc<dyn ResolutionObserver>,
    relation_cache: Option<Arc<dyn RelationCacheSignal>>,
    config: ProviderConfig,
    slug_prefix: String,
    priority: i32,
    primed: Mutex<Option<PrimedRecord>>,
}

impl std::fmt::Debug for StoryblokNodeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryblokNodeProvider")
            .field("slug_prefix", &self.slug_prefix)
            .field("cached", &self.cache.is_some())
            .field("decorators", &self.decorators)
            .field("primed", &self.primed.lock().as_ref().map(|p| p.candidate.clone()))
            .finish()
    }
}

impl StoryblokNodeProvider {
    /// Create provider with the default slug prefix and plain-text rich text
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            cache: None,
            renderer: Arc::new(PlainTextRenderer),
            decorators: DecoratorChain::new(),
            observer: Arc::new(TracingObserver),
            relation_cache: None,
            config: ProviderConfig::default(),
            slug_prefix: DEFAULT_SLUG_PREFIX.to_string(),
            priority: 0,
            primed: Mutex::new(None),
        }
    }

    /// With record cache, used when no primed record is available
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn RecordCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// With rich-text renderer
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn RichTextRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// With decorator chain
    #[must_use]
    pub fn with_decorators(mut self, decorators: DecoratorChain) -> Self {
        self.decorators = decorators;
        self
    }

    /// With observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// With relation cache to suspend after a successful probe
    #[must_use]
    pub fn with_relation_cache(mut self, relation_cache: Arc<dyn RelationCacheSignal>) -> Self {
        self.relation_cache = Some(relation_cache);
        self
    }

    /// With configuration
    #[must_use]
    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    /// With slug prefix
    #[must_use]
    pub fn with_slug_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.slug_prefix = prefix.into();
        self
    }

    /// With router priority
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Whether a probed record is waiting to be consumed
    #[must_use]
    pub fn is_primed(&self) -> bool {
        self.primed.lock().is_some()
    }

    fn emit(&self, event: ResolutionEvent) {
        self.observer.observe(event);
    }

    fn slug_for(&self, candidate: &str) -> String {
        format!("{}{}", self.slug_prefix, candidate)
    }

    /// Take the primed record; the slot is cleared either way
    fn take_primed(&self, candidate: &str) -> Option<Arc<RawRecord>> {
        match self.primed.lock().take() {
            Some(primed) if primed.candidate == candidate => Some(primed.record),
            _ => None,
        }
    }

    async fn fetch(&self, identifier: &Identifier) -> ResolveResult<Arc<RawRecord>> {
        let slug = self.slug_for(identifier.as_str());
        let fetch = self.connector.fetch_by_slug(&slug);
        let result = match &self.cache {
            Some(cache) => {
                let key = format!("{PROVIDER_NAME}:{slug}");
                cache.get_or_compute(&key, self.config.ttl, fetch).await
            }
            None => fetch.await.map(Arc::new),
        };

        match &result {
            Ok(_) => self.emit(ResolutionEvent::FetchSucceeded {
                provider: PROVIDER_NAME.to_string(),
                identifier: identifier.clone(),
            }),
            Err(error) => self.emit(ResolutionEvent::FetchFailed {
                provider: PROVIDER_NAME.to_string(),
                identifier: identifier.clone(),
                error: error.clone(),
            }),
        }
        result
    }

    /// Convert one inlined record
    ///
    /// Reserved keys map to the synthetic id/type fields; everything else
    /// goes through shape classification.
    fn convert_content(
        &self,
        record: Option<&Identifier>,
        content: &Map<String, Value>,
        ctx: &ResolveContext,
    ) -> NodeData {
        let mut data = NodeData::with_capacity(content.len() + 2);
        data.insert(keyword::CMS_PROVIDER.to_string(), FieldValue::text(CMS_MARKER));
        data.insert(keyword::HOT_RELOAD.to_string(), FieldValue::Bool(ctx.hot_reload()));

        for (key, value) in content {
            match key.as_str() {
                KEY_UID => {
                    data.insert(keyword::NODE_ID.to_string(), FieldValue::from_json(value));
                }
                KEY_COMPONENT => {
                    data.insert(keyword::NODE_TYPE.to_string(), FieldValue::from_json(value));
                }
                _ => {
                    let converted = match self.convert_value(value, ctx) {
                        Ok(converted) => converted,
                        Err(error) => {
                            self.emit(ResolutionEvent::FieldConversionFailed {
                                provider: PROVIDER_NAME.to_string(),
                                failure: FieldConversionFailure {
                                    record: record.cloned(),
                                    field: key.clone(),
                                    error,
                                },
                            });
                            FieldValue::Null
                        }
                    };
                    data.insert(key.clone(), converted);
                }
            }
        }
        data
    }

    fn convert_value(&self, value: &Value, ctx: &ResolveContext) -> ResolveResult<FieldValue> {
        match classify(value) {
            FieldShape::NestedNodeSequence(items) => Ok(FieldValue::List(
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|content| {
                        let uid = content
                            .get(KEY_UID)
                            .and_then(Value::as_str)
                            .map(Identifier::from);
                        FieldValue::node(Node::new(
                            self.convert_content(uid.as_ref(), content, ctx),
                            Map::new(),
                        ))
                    })
                    .collect(),
            )),
            FieldShape::AssetSequence(items) => Ok(FieldValue::List(
                items
                    .iter()
                    .map(|item| match item.as_object() {
                        Some(map) => FieldValue::Asset(asset_from_descriptor(map)),
                        None => FieldValue::from_json(item),
                    })
                    .collect(),
            )),
            FieldShape::RichTextDocument(document) => {
                let rendered = self.renderer.render(document)?;
                Ok(FieldValue::Text(self.decorators.decorate(&rendered)))
            }
            FieldShape::InlineAsset(map) => {
                let mut asset_data = map.clone();
                if let Some(id) = map.get(KEY_ASSET_ID) {
                    asset_data.insert(keyword::NODE_ID.to_string(), id.clone());
                }
                Ok(FieldValue::Asset(asset_from_descriptor(&asset_data)))
            }
            FieldShape::Text(text) => Ok(FieldValue::Text(self.decorators.decorate(text))),
            FieldShape::Sequence(_)
            | FieldShape::Mapping(_)
            | FieldShape::Scalar(_)
            | FieldShape::Envelope(_)
            | FieldShape::ReferenceCandidate(_) => Ok(FieldValue::from_json(value)),
        }
    }

    fn convert_record(
        &self,
        identifier: &Identifier,
        record: &RawRecord,
        ctx: &ResolveContext,
    ) -> Node {
        let mut data = self.convert_content(Some(identifier), &record.fields, ctx);
        if !data.contains_key(keyword::NODE_TYPE) && !record.schema.is_empty() {
            data.insert(keyword::NODE_TYPE.to_string(), FieldValue::text(&record.schema));
        }
        Node::new(data, record.context.clone())
    }
}

#[async_trait]
impl NodeProvider for StoryblokNodeProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn can_resolve(&self, candidate: &str, _hint: &str) -> bool {
        self.emit(ResolutionEvent::ProbeAttempted {
            provider: PROVIDER_NAME.to_string(),
            candidate: candidate.to_string(),
        });

        match self.connector.fetch_by_slug(&self.slug_for(candidate)).await {
            Ok(record) => {
                *self.primed.lock() = Some(PrimedRecord {
                    candidate: candidate.to_string(),
                    record: Arc::new(record),
                });
                if let Some(relation_cache) = &self.relation_cache {
                    relation_cache.set_active(false);
                }
                self.emit(ResolutionEvent::ProbeSucceeded {
                    provider: PROVIDER_NAME.to_string(),
                    candidate: candidate.to_string(),
                });
                true
            }
            Err(error) => {
                self.emit(ResolutionEvent::ProbeFailed {
                    provider: PROVIDER_NAME.to_string(),
                    candidate: candidate.to_string(),
                    error,
                });
                false
            }
        }
    }

    async fn resolve_by_id(
        &self,
        identifier: &Identifier,
        ctx: &ResolveContext,
    ) -> Result<Node, ResolveError> {
        let scope = ctx.root(identifier);
        let record = match self.take_primed(identifier.as_str()) {
            Some(record) => record,
            None => self.fetch(identifier).await?,
        };
        Ok(self.convert_record(identifier, &record, &scope))
    }

    fn set_accept_unpublished(&self, accept: bool) {
        self.connector.set_accept_unpublished(accept);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MockConnector;
    use crate::decorator::FnDecorator;
    use crate::relation::MockRelationCacheSignal;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn story() -> RawRecord {
        RawRecord::from_json(
            "page",
            json!({
                "_uid": "root-uid",
                "component": "page",
                "title": "Welcome",
                "body": [
                    {"_uid": "b1", "component": "teaser", "headline": "First"},
                    {"_uid": "b2", "component": "teaser", "headline": "Second", "id": 9, "filename": "x.png"}
                ],
                "gallery": [
                    {"id": 1, "filename": "https://a.example/1.png", "alt": "one"},
                    {"id": 2, "filename": "https://a.example/2.png"}
                ],
                "hero": {"id": 7, "filename": "https://a.example/7.png"},
                "intro": {"type": "doc", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "Hi"}]}]},
                "tags": ["a", "b"],
                "count": 3
            }),
        )
    }

    #[test]
    fn classification_order() {
        let nested = json!([{"_uid": "1", "id": 1, "filename": "f"}]);
        assert!(matches!(classify(&nested), FieldShape::NestedNodeSequence(_)));

        let assets = json!([{"id": 1, "filename": "f"}]);
        assert!(matches!(classify(&assets), FieldShape::AssetSequence(_)));

        let mixed = json!([{"_uid": "1"}, {"id": 1}]);
        assert!(matches!(classify(&mixed), FieldShape::Sequence(_)));

        assert!(matches!(classify(&json!([])), FieldShape::Sequence(_)));
        assert!(matches!(
            classify(&json!({"type": "doc", "content": []})),
            FieldShape::RichTextDocument(_)
        ));
        assert!(matches!(
            classify(&json!({"id": 1, "filename": "f"})),
            FieldShape::InlineAsset(_)
        ));
        assert!(matches!(
            classify(&json!({"id": 1, "filename": null})),
            FieldShape::Mapping(_)
        ));
    }

    #[tokio::test]
    async fn probe_primes_the_following_resolve() {
        let mut connector = MockConnector::new();
        connector
            .expect_fetch_by_slug()
            .with(eq("cms/home"))
            .times(1)
            .returning(|_| Ok(story()));

        let provider = StoryblokNodeProvider::new(Arc::new(connector));
        assert!(provider.can_resolve("home", "page").await);
        assert!(provider.is_primed());

        let node = provider
            .resolve_by_id(&Identifier::from("home"), &ResolveContext::new())
            .await
            .unwrap();
        assert!(!provider.is_primed());
        assert_eq!(node.node_id(), Some("root-uid"));
        assert_eq!(node.node_type(), Some("page"));
    }

    #[tokio::test]
    async fn failed_probe_declines() {
        let mut connector = MockConnector::new();
        connector
            .expect_fetch_by_slug()
            .returning(|_| Err(ResolveError::transport("storyblok", "502")));

        let provider = StoryblokNodeProvider::new(Arc::new(connector));
        assert!(!provider.can_resolve("home", "page").await);
        assert!(!provider.is_primed());
    }

    #[tokio::test]
    async fn successful_probe_suspends_relation_cache() {
        let mut connector = MockConnector::new();
        connector.expect_fetch_by_slug().returning(|_| Ok(story()));
        let mut relation = MockRelationCacheSignal::new();
        relation.expect_set_active().with(eq(false)).times(1).return_const(());

        let provider = StoryblokNodeProvider::new(Arc::new(connector))
            .with_relation_cache(Arc::new(relation));
        assert!(provider.can_resolve("home", "").await);
    }

    #[tokio::test]
    async fn resolve_without_probe_fetches() {
        let mut connector = MockConnector::new();
        connector
            .expect_fetch_by_slug()
            .with(eq("pages/about"))
            .times(1)
            .returning(|_| Ok(story()));

        let provider =
            StoryblokNodeProvider::new(Arc::new(connector)).with_slug_prefix("pages/");
        let node = provider
            .resolve_by_id(&Identifier::from("about"), &ResolveContext::new())
            .await
            .unwrap();
        assert_eq!(node.get("title"), Some(&FieldValue::text("Welcome")));
    }

    #[tokio::test]
    async fn content_conversion() {
        let mut connector = MockConnector::new();
        connector.expect_fetch_by_slug().returning(|_| Ok(story()));

        let provider = StoryblokNodeProvider::new(Arc::new(connector)).with_decorators(
            DecoratorChain::new().with(FnDecorator::new("bang", |t: &str| format!("{t}!"))),
        );
        let node = provider
            .resolve_by_id(
                &Identifier::from("home"),
                &ResolveContext::new().with_hot_reload(true),
            )
            .await
            .unwrap();

        assert_eq!(node.get(keyword::CMS_PROVIDER), Some(&FieldValue::text("StoryBlok")));
        assert_eq!(node.get(keyword::HOT_RELOAD), Some(&FieldValue::Bool(true)));
        assert_eq!(node.get("title"), Some(&FieldValue::text("Welcome!")));
        assert_eq!(node.get("intro"), Some(&FieldValue::text("Hi!")));
        assert_eq!(node.get("count"), Some(&FieldValue::Number(3.into())));
        // generic arrays pass through undecorated
        assert_eq!(
            node.get("tags"),
            Some(&FieldValue::List(vec![FieldValue::text("a"), FieldValue::text("b")]))
        );

        let body = node.get("body").and_then(FieldValue::as_list).unwrap();
        assert_eq!(body.len(), 2);
        let second = body[1].as_node().unwrap();
        assert_eq!(second.node_type(), Some("teaser"));
        assert_eq!(second.node_id(), Some("b2"));
        assert_eq!(second.get("headline"), Some(&FieldValue::text("Second!")));
        assert!(second.context().is_empty());

        let gallery = node.get("gallery").and_then(FieldValue::as_list).unwrap();
        assert_eq!(gallery[0].as_asset().map(|a| a.identifier().as_str()), Some("1"));
        assert_eq!(gallery[1].as_asset().map(|a| a.identifier().as_str()), Some("2"));

        let hero = node.get("hero").and_then(FieldValue::as_asset).unwrap();
        assert_eq!(hero.identifier().as_str(), "7");
        assert_eq!(
            hero.metadata().and_then(|m| m.attributes.get(keyword::NODE_ID)),
            Some(&json!(7))
        );
    }

    #[tokio::test]
    async fn broken_rich_text_only_nulls_its_field() {
        let mut connector = MockConnector::new();
        connector.expect_fetch_by_slug().returning(|_| {
            Ok(RawRecord::from_json(
                "page",
                json!({"component": "page", "intro": {"type": "doc", "content": 5}, "title": "ok"}),
            ))
        });

        let provider = StoryblokNodeProvider::new(Arc::new(connector));
        let node = provider
            .resolve_by_id(&Identifier::from("home"), &ResolveContext::new())
            .await
            .unwrap();

        assert_eq!(node.get("intro"), Some(&FieldValue::Null));
        assert_eq!(node.get("title"), Some(&FieldValue::text("ok")));
    }
}
