//! Reserved field names written into resolved node data

/// Synthetic field carrying the record's schema/type tag
pub const NODE_TYPE: &str = "__nodeType__";

/// Synthetic field carrying the backend's record identifier
pub const NODE_ID: &str = "__nodeId__";

/// Name of the backend that produced a node
pub const CMS_PROVIDER: &str = "__cmsProvider__";

/// Whether the node was resolved for a live-preview (hot reload) request
pub const HOT_RELOAD: &str = "__storyBlokHotReload__";
