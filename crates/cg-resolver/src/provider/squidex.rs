//! Identifier-addressed provider
//!
//! Records reference each other (and assets) by GUID. Field values may be
//! wrapped in an invariant-language envelope `{"iv": X}`. Reference-shaped
//! strings inside collections are disambiguated asset-first, because an
//! asset lookup is cheaper than the node fetch it would otherwise waste.

use crate::asset::AssetResolver;
use crate::cache::RecordCache;
use crate::config::ProviderConfig;
use crate::connector::Connector;
use crate::context::ResolveContext;
use crate::decorator::DecoratorChain;
use crate::error::{FieldConversionFailure, ResolveError, ResolveResult};
use crate::observer::{ResolutionEvent, ResolutionObserver, TracingObserver};
use crate::provider::NodeProvider;
use crate::shape::FieldShape;
use async_trait::async_trait;
use cg_node::{keyword, Asset, FieldValue, Identifier, Node, NodeData, RawRecord};
use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

/// Provider name
const PROVIDER_NAME: &str = "squidex";

/// Key of the invariant-language envelope
const ENVELOPE_KEY: &str = "iv";

static NODE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("static pattern compiles")
});

/// Key under which a record is cached; shared caches hold other providers' keys too
fn cache_key(identifier: &Identifier) -> String {
    format!("{PROVIDER_NAME}:{identifier}")
}

/// Whether a string is shaped like a record/asset identifier (a GUID)
#[inline]
#[must_use]
pub fn is_node_id(candidate: &str) -> bool {
    NODE_ID_PATTERN.is_match(candidate)
}

/// Classify a raw value
///
/// `in_collection` is set for elements of sequences and mappings: only
/// there is a GUID-shaped string treated as a reference.
fn classify(value: &Value, in_collection: bool) -> FieldShape<'_> {
    match value {
        Value::Object(map) => match map.get(ENVELOPE_KEY) {
            Some(inner) if !inner.is_null() => FieldShape::Envelope(inner),
            _ => FieldShape::Mapping(map),
        },
        Value::String(s) if in_collection && is_node_id(s) => FieldShape::ReferenceCandidate(s),
        Value::String(s) => FieldShape::Text(s),
        Value::Array(items) => FieldShape::Sequence(items),
        other => FieldShape::Scalar(other),
    }
}

/// Node provider for GUID-addressed backends
pub struct SquidexNodeProvider {
    connector: Arc<dyn Connector>,
    cache: Option<Arc<dyn RecordCache>>,
    assets: Option<Arc<dyn AssetResolver>>,
    decorators: DecoratorChain,
    observer: Arc<dyn ResolutionObserver>,
    config: ProviderConfig,
}

impl std::fmt::Debug for SquidexNodeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SquidexNodeProvider")
            .field("cached", &self.cache.is_some())
            .field("asset_catalog", &self.assets.is_some())
            .field("decorators", &self.decorators)
            .field("config", &self.config)
            .finish()
    }
}

impl SquidexNodeProvider {
    /// Create provider with no cache, no asset catalog and no decorators
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            cache: None,
            assets: None,
            decorators: DecoratorChain::new(),
            observer: Arc::new(TracingObserver),
            config: ProviderConfig::default(),
        }
    }

    /// With record cache
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn RecordCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// With asset catalog
    ///
    /// Without one, every reference-shaped string is taken to be an asset.
    #[must_use]
    pub fn with_asset_resolver(mut self, assets: Arc<dyn AssetResolver>) -> Self {
        self.assets = Some(assets);
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

    /// With configuration
    #[must_use]
    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn emit(&self, event: ResolutionEvent) {
        self.observer.observe(event);
    }

    async fn fetch_raw(&self, identifier: &Identifier) -> ResolveResult<Arc<RawRecord>> {
        let fetch = async move { self.connector.fetch_by_id(identifier).await };
        let result = match &self.cache {
            Some(cache) => {
                cache
                    .get_or_compute(&cache_key(identifier), self.config.ttl, fetch.boxed())
                    .await
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

    /// Fetch and convert `identifier`; `scope` already has it on its path
    fn resolve_scoped<'a>(
        &'a self,
        identifier: &'a Identifier,
        scope: &'a ResolveContext,
    ) -> BoxFuture<'a, ResolveResult<Node>> {
        async move {
            let raw = self.fetch_raw(identifier).await?;
            let data = self.convert_data(identifier, &raw, scope).await?;
            Ok(Node::new(data, raw.context.clone()))
        }
        .boxed()
    }

    /// Convert every field; failures stay local to their field except
    /// transport failures, which abort the record
    async fn convert_data(
        &self,
        identifier: &Identifier,
        raw: &RawRecord,
        scope: &ResolveContext,
    ) -> ResolveResult<NodeData> {
        let mut data = NodeData::with_capacity(raw.fields.len() + 1);
        data.insert(keyword::NODE_TYPE.to_string(), FieldValue::text(&raw.schema));

        for (field, value) in &raw.fields {
            let converted = match self.convert_value(value, false, scope).await {
                Ok(converted) => converted,
                Err(error) if error.is_transport() => return Err(error),
                Err(error) => {
                    self.emit(ResolutionEvent::FieldConversionFailed {
                        provider: PROVIDER_NAME.to_string(),
                        failure: FieldConversionFailure {
                            record: Some(identifier.clone()),
                            field: field.clone(),
                            error,
                        },
                    });
                    FieldValue::Null
                }
            };
            data.insert(field.clone(), converted);
        }
        Ok(data)
    }

    fn convert_value<'a>(
        &'a self,
        value: &'a Value,
        in_collection: bool,
        scope: &'a ResolveContext,
    ) -> BoxFuture<'a, ResolveResult<FieldValue>> {
        async move {
            match classify(value, in_collection) {
                FieldShape::Envelope(inner) => self.convert_value(inner, false, scope).await,
                FieldShape::Text(text) => Ok(FieldValue::Text(self.decorators.decorate(text))),
                FieldShape::ReferenceCandidate(id) => {
                    self.resolve_reference(Identifier::from(id), scope).await
                }
                FieldShape::Sequence(items) => {
                    let mut converted = Vec::with_capacity(items.len());
                    for item in items {
                        converted.push(self.convert_value(item, true, scope).await?);
                    }
                    Ok(FieldValue::List(converted))
                }
                FieldShape::Mapping(map) => {
                    let mut converted = IndexMap::with_capacity(map.len());
                    for (key, item) in map {
                        converted.insert(key.clone(), self.convert_value(item, true, scope).await?);
                    }
                    Ok(FieldValue::Map(converted))
                }
                // Never produced by this backend's classifier
                FieldShape::Scalar(_)
                | FieldShape::NestedNodeSequence(_)
                | FieldShape::AssetSequence(_)
                | FieldShape::RichTextDocument(_)
                | FieldShape::InlineAsset(_) => Ok(FieldValue::from_json(value)),
            }
        }
        .boxed()
    }

    /// Asset first, then node, then identifier-only asset for dangling references
    async fn resolve_reference(
        &self,
        identifier: Identifier,
        scope: &ResolveContext,
    ) -> ResolveResult<FieldValue> {
        if let Some(asset) = self.lookup_asset(&identifier).await {
            return Ok(FieldValue::Asset(asset));
        }

        if scope.is_on_path(&identifier) {
            self.emit(ResolutionEvent::CycleDetected {
                provider: PROVIDER_NAME.to_string(),
                identifier: identifier.clone(),
            });
            return Ok(FieldValue::Reference(identifier));
        }

        let child = scope.enter(&identifier, self.config.max_depth)?;
        match self.resolve_scoped(&identifier, &child).await {
            Ok(node) => Ok(FieldValue::node(node)),
            Err(error) if error.is_not_found() => {
                self.emit(ResolutionEvent::ReferenceDegraded {
                    provider: PROVIDER_NAME.to_string(),
                    identifier: identifier.clone(),
                });
                Ok(FieldValue::Asset(Asset::bare(identifier)))
            }
            Err(error) => Err(error),
        }
    }

    async fn lookup_asset(&self, identifier: &Identifier) -> Option<Asset> {
        match &self.assets {
            Some(assets) => assets
                .lookup(identifier)
                .await
                .map(|metadata| Asset::with_metadata(identifier.clone(), metadata)),
            None => Some(Asset::bare(identifier.clone())),
        }
    }
}

#[async_trait]
impl NodeProvider for SquidexNodeProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn can_resolve(&self, candidate: &str, _hint: &str) -> bool {
        is_node_id(candidate)
    }

    async fn resolve_by_id(
        &self,
        identifier: &Identifier,
        ctx: &ResolveContext,
    ) -> Result<Node, ResolveError> {
        let scope = ctx.root(identifier);
        self.resolve_scoped(identifier, &scope).await
    }

    fn set_accept_unpublished(&self, accept: bool) {
        self.connector.set_accept_unpublished(accept);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MockAssetResolver;
    use crate::connector::MockConnector;
    use crate::decorator::FnDecorator;
    use cg_node::AssetMetadata;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    const ARTICLE: &str = "11111111-1111-1111-1111-111111111111";
    const AUTHOR: &str = "22222222-2222-2222-2222-222222222222";
    const IMAGE: &str = "33333333-3333-3333-3333-333333333333";
    const DANGLING: &str = "44444444-4444-4444-4444-444444444444";

    fn shout() -> DecoratorChain {
        DecoratorChain::new().with(FnDecorator::new("shout", |t: &str| t.to_uppercase()))
    }

    #[test]
    fn node_id_predicate() {
        assert!(is_node_id(ARTICLE));
        assert!(is_node_id("ABCDEF01-2345-6789-abcd-ef0123456789"));
        assert!(!is_node_id("hello"));
        assert!(!is_node_id(" 11111111-1111-1111-1111-111111111111"));
        assert!(!is_node_id("11111111-1111-1111-1111-11111111111"));
    }

    #[test]
    fn classification() {
        let envelope = json!({"iv": "x"});
        assert!(matches!(classify(&envelope, false), FieldShape::Envelope(_)));

        let null_envelope = json!({"iv": null});
        assert!(matches!(classify(&null_envelope, false), FieldShape::Mapping(_)));

        let guid = json!(ARTICLE);
        assert!(matches!(classify(&guid, true), FieldShape::ReferenceCandidate(_)));
        assert!(matches!(classify(&guid, false), FieldShape::Text(_)));

        assert!(matches!(classify(&json!(3), true), FieldShape::Scalar(_)));
        assert!(matches!(classify(&json!([1]), false), FieldShape::Sequence(_)));
    }

    #[tokio::test]
    async fn envelope_text_is_decorated() {
        let mut connector = MockConnector::new();
        connector
            .expect_fetch_by_id()
            .with(eq(Identifier::from(ARTICLE)))
            .times(1)
            .returning(|_| Ok(RawRecord::from_json("article", json!({"title": {"iv": "hello"}}))));

        let provider = SquidexNodeProvider::new(Arc::new(connector)).with_decorators(shout());
        let node = provider
            .resolve_by_id(&Identifier::from(ARTICLE), &ResolveContext::new())
            .await
            .unwrap();

        assert_eq!(node.node_type(), Some("article"));
        assert_eq!(node.get("title"), Some(&FieldValue::text("HELLO")));
    }

    #[tokio::test]
    async fn mixed_reference_list_keeps_order() {
        let mut connector = MockConnector::new();
        connector.expect_fetch_by_id().returning(|id| match id.as_str() {
            ARTICLE => Ok(RawRecord::from_json(
                "article",
                json!({"related": {"iv": [IMAGE, AUTHOR, DANGLING]}}),
            )),
            AUTHOR => Ok(RawRecord::from_json("author", json!({"name": {"iv": "Ada"}}))),
            other => Err(ResolveError::not_found(other)),
        });

        let mut assets = MockAssetResolver::new();
        assets.expect_lookup().returning(|id| {
            (id.as_str() == IMAGE).then(|| AssetMetadata::with_version(5))
        });

        let provider = SquidexNodeProvider::new(Arc::new(connector))
            .with_asset_resolver(Arc::new(assets));
        let node = provider
            .resolve_by_id(&Identifier::from(ARTICLE), &ResolveContext::new())
            .await
            .unwrap();

        let related = node.get("related").and_then(FieldValue::as_list).unwrap();
        assert_eq!(related.len(), 3);
        assert_eq!(related[0].as_asset().and_then(Asset::version), Some(5));
        assert_eq!(related[1].as_node().and_then(Node::node_type), Some("author"));
        let dangling = related[2].as_asset().unwrap();
        assert!(dangling.is_bare());
        assert_eq!(dangling.identifier().as_str(), DANGLING);
    }

    #[tokio::test]
    async fn without_asset_catalog_references_are_assets() {
        let mut connector = MockConnector::new();
        connector
            .expect_fetch_by_id()
            .times(1)
            .returning(|_| Ok(RawRecord::from_json("article", json!({"cover": {"iv": [IMAGE]}}))));

        let provider = SquidexNodeProvider::new(Arc::new(connector));
        let node = provider
            .resolve_by_id(&Identifier::from(ARTICLE), &ResolveContext::new())
            .await
            .unwrap();

        assert_eq!(
            node.get("cover"),
            Some(&FieldValue::List(vec![FieldValue::Asset(Asset::bare(IMAGE))]))
        );
    }

    #[tokio::test]
    async fn top_level_not_found_propagates() {
        let mut connector = MockConnector::new();
        connector
            .expect_fetch_by_id()
            .returning(|id| Err(ResolveError::not_found(id.clone())));

        let provider = SquidexNodeProvider::new(Arc::new(connector));
        let err = provider
            .resolve_by_id(&Identifier::from(ARTICLE), &ResolveContext::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn nested_transport_error_aborts_record() {
        let mut connector = MockConnector::new();
        connector.expect_fetch_by_id().returning(|id| match id.as_str() {
            ARTICLE => Ok(RawRecord::from_json(
                "article",
                json!({"title": {"iv": "t"}, "author": {"iv": [AUTHOR]}}),
            )),
            _ => Err(ResolveError::transport("squidex", "timeout")),
        });
        let mut assets = MockAssetResolver::new();
        assets.expect_lookup().returning(|_| None);

        let provider = SquidexNodeProvider::new(Arc::new(connector))
            .with_asset_resolver(Arc::new(assets));
        let err = provider
            .resolve_by_id(&Identifier::from(ARTICLE), &ResolveContext::new())
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::transport("squidex", "timeout"));
    }

    #[tokio::test]
    async fn accept_unpublished_is_forwarded() {
        let mut connector = MockConnector::new();
        connector
            .expect_set_accept_unpublished()
            .with(eq(true))
            .times(1)
            .return_const(());

        let provider = SquidexNodeProvider::new(Arc::new(connector));
        provider.set_accept_unpublished(true);
    }

    #[tokio::test]
    async fn can_resolve_is_syntactic() {
        let connector = MockConnector::new();
        let provider = SquidexNodeProvider::new(Arc::new(connector));

        assert!(provider.can_resolve(ARTICLE, "page").await);
        assert!(!provider.can_resolve("home", "page").await);
    }

    proptest! {
        #[test]
        fn prop_plain_strings_only_decorated(text in "[a-z ]{0,40}") {
            let value = Value::String(text.clone());
            prop_assert_eq!(classify(&value, true), FieldShape::Text(text.as_str()));
        }

        #[test]
        fn prop_generated_guids_match(bytes in proptest::array::uniform16(any::<u8>())) {
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            let guid = format!(
                "{}-{}-{}-{}-{}",
                &hex[0..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..32]
            );
            prop_assert!(is_node_id(&guid));
        }
    }
}
