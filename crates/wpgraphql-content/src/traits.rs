//! Content source trait for the content-host abstraction layer.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::ContentError;
use crate::types::{ContentItem, ContentKind, ContentQuery, PostTypeInfo, SettingGroup, TaxonomyInfo};

/// The contract a content host must fulfil for the schema registry.
///
/// The metadata methods decide *which* dynamic types get generated during
/// bootstrap; the async data methods back the generated connection and
/// mutation resolvers. Implementations must be thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use wpgraphql_content::{ContentKind, ContentQuery, ContentSource};
///
/// async fn published_posts(source: &dyn ContentSource) -> Vec<ContentItem> {
///     let query = ContentQuery::new().with_filter("status", "publish");
///     source
///         .find(&ContentKind::Post("post".into()), &query)
///         .await
///         .unwrap_or_default()
/// }
/// ```
#[async_trait]
pub trait ContentSource: Send + Sync {
    // ==================== Metadata ====================

    /// Post types configured for exposure in the graph.
    fn post_types(&self) -> Vec<PostTypeInfo>;

    /// Taxonomies configured for exposure in the graph.
    fn taxonomies(&self) -> Vec<TaxonomyInfo>;

    /// Setting groups configured for exposure in the graph.
    fn setting_groups(&self) -> Vec<SettingGroup>;

    // ==================== Content ====================

    /// Returns every item of `kind` matching `query`, in host order.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::UnknownKind` if `kind` is not exposed.
    async fn find(&self, kind: &ContentKind, query: &ContentQuery) -> Result<Vec<ContentItem>, ContentError>;

    /// Reads a single item. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::UnknownKind` if `kind` is not exposed.
    async fn get(&self, kind: &ContentKind, id: &str) -> Result<Option<ContentItem>, ContentError>;

    /// Creates a new item from host fields.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::InvalidInput` if the fields are rejected.
    async fn create(&self, kind: &ContentKind, fields: Map<String, Value>) -> Result<ContentItem, ContentError>;

    /// Merges `fields` into an existing item.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::NotFound` if the item does not exist.
    async fn update(
        &self,
        kind: &ContentKind,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<ContentItem, ContentError>;

    /// Deletes an item and returns its last state.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::NotFound` if the item does not exist.
    async fn delete(&self, kind: &ContentKind, id: &str) -> Result<ContentItem, ContentError>;

    // ==================== Settings ====================

    /// Reads the current values of a setting group.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::UnknownKind` if the group is not exposed.
    async fn settings(&self, group: &str) -> Result<Map<String, Value>, ContentError>;

    /// Merges `values` into a setting group and returns the new values.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::UnknownKind` if the group is not exposed.
    async fn update_settings(&self, group: &str, values: Map<String, Value>) -> Result<Map<String, Value>, ContentError>;

    /// Returns the name of this content host for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
