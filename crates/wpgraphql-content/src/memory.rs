//! In-memory content host.
//!
//! `InMemoryContentSource` keeps posts, terms, relationships and settings in
//! process memory. It backs the integration tests and is handy for embedding
//! the schema without a real content host.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::error::ContentError;
use crate::traits::ContentSource;
use crate::types::{
    ContentItem, ContentKind, ContentQuery, ContentRef, PostTypeInfo, SettingGroup, TaxonomyInfo,
};

/// In-memory content host.
///
/// Metadata is fixed at construction; items, relationships and setting
/// values live behind `tokio::sync::RwLock`s and may change at runtime.
///
/// # Example
///
/// ```ignore
/// let source = InMemoryContentSource::new()
///     .with_post_type(PostTypeInfo::new("post", "post", "posts"))
///     .with_taxonomy(TaxonomyInfo::new("category", "category", "categories"));
///
/// let post = source.seed(&ContentKind::Post("post".into()), fields).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryContentSource {
    post_types: Vec<PostTypeInfo>,
    taxonomies: Vec<TaxonomyInfo>,
    setting_groups: Vec<SettingGroup>,
    /// Items per collection, in insertion order.
    items: RwLock<HashMap<ContentKind, Vec<ContentItem>>>,
    /// Undirected relationships between items (post ↔ term).
    relations: RwLock<HashSet<(ContentRef, ContentRef)>>,
    /// Setting values per group.
    settings: RwLock<HashMap<String, Map<String, Value>>>,
    /// Atomic counter for generating item IDs.
    id_counter: AtomicU64,
}

impl InMemoryContentSource {
    /// Creates an empty content host exposing nothing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id_counter: AtomicU64::new(1),
            ..Self::default()
        }
    }

    /// Exposes a post type.
    #[must_use]
    pub fn with_post_type(mut self, post_type: PostTypeInfo) -> Self {
        self.post_types.push(post_type);
        self
    }

    /// Exposes a taxonomy.
    #[must_use]
    pub fn with_taxonomy(mut self, taxonomy: TaxonomyInfo) -> Self {
        self.taxonomies.push(taxonomy);
        self
    }

    /// Exposes a setting group with initial values.
    #[must_use]
    pub fn with_setting_group(mut self, group: SettingGroup, values: Map<String, Value>) -> Self {
        self.settings.get_mut().insert(group.name.clone(), values);
        self.setting_groups.push(group);
        self
    }

    /// Adds an item directly, returning it with its generated ID.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::UnknownKind` if `kind` is not exposed.
    pub async fn seed(&self, kind: &ContentKind, fields: Map<String, Value>) -> Result<ContentItem, ContentError> {
        self.ensure_kind(kind)?;
        let item = ContentItem::new(self.next_id(), kind.clone(), with_defaults(kind, fields));
        self.items
            .write()
            .await
            .entry(kind.clone())
            .or_default()
            .push(item.clone());
        trace!(kind = %kind, id = %item.id, "Seeded content item");
        Ok(item)
    }

    /// Relates two items (typically a post and a term).
    pub async fn relate(&self, a: ContentRef, b: ContentRef) {
        self.relations.write().await.insert((a, b));
    }

    fn next_id(&self) -> String {
        self.id_counter.fetch_add(1, Ordering::SeqCst).to_string()
    }

    fn ensure_kind(&self, kind: &ContentKind) -> Result<(), ContentError> {
        let known = match kind {
            ContentKind::Post(name) => self.post_types.iter().any(|pt| &pt.name == name),
            ContentKind::Term(name) => self.taxonomies.iter().any(|tax| &tax.name == name),
        };
        if known {
            Ok(())
        } else {
            Err(ContentError::unknown_kind(kind.to_string()))
        }
    }

    fn ensure_group(&self, group: &str) -> Result<(), ContentError> {
        if self.setting_groups.iter().any(|g| g.name == group) {
            Ok(())
        } else {
            Err(ContentError::unknown_kind(format!("settings:{group}")))
        }
    }

    async fn is_related(&self, item: &ContentRef, other: &ContentRef) -> bool {
        let relations = self.relations.read().await;
        relations.contains(&(item.clone(), other.clone())) || relations.contains(&(other.clone(), item.clone()))
    }

    /// Terms report how many items they are attached to.
    async fn decorate(&self, mut item: ContentItem) -> ContentItem {
        if matches!(item.kind, ContentKind::Term(_)) {
            let me = ContentRef::new(item.kind.clone(), item.id.clone());
            let count = self
                .relations
                .read()
                .await
                .iter()
                .filter(|(a, b)| *a == me || *b == me)
                .count();
            item.fields.insert("count".to_string(), Value::from(count as u64));
        }
        item
    }
}

/// Applies host defaults to newly created items.
fn with_defaults(kind: &ContentKind, mut fields: Map<String, Value>) -> Map<String, Value> {
    if let ContentKind::Post(_) = kind {
        fields
            .entry("status".to_string())
            .or_insert_with(|| Value::String("draft".to_string()));
    }
    fields
}

fn matches_search(item: &ContentItem, search: &str) -> bool {
    let needle = search.to_lowercase();
    ["title", "name", "content"].iter().any(|key| {
        item.field(key)
            .and_then(Value::as_str)
            .is_some_and(|text| text.to_lowercase().contains(&needle))
    })
}

#[async_trait]
impl ContentSource for InMemoryContentSource {
    fn post_types(&self) -> Vec<PostTypeInfo> {
        self.post_types.clone()
    }

    fn taxonomies(&self) -> Vec<TaxonomyInfo> {
        self.taxonomies.clone()
    }

    fn setting_groups(&self) -> Vec<SettingGroup> {
        self.setting_groups.clone()
    }

    async fn find(&self, kind: &ContentKind, query: &ContentQuery) -> Result<Vec<ContentItem>, ContentError> {
        self.ensure_kind(kind)?;

        let candidates: Vec<ContentItem> = self
            .items
            .read()
            .await
            .get(kind)
            .cloned()
            .unwrap_or_default();

        let mut results = Vec::with_capacity(candidates.len());
        for item in candidates {
            if let Some(search) = &query.search
                && !matches_search(&item, search)
            {
                continue;
            }
            if let Some(include) = &query.include
                && !include.contains(&item.id)
            {
                continue;
            }
            if !query
                .filters
                .iter()
                .all(|(key, expected)| item.field(key) == Some(expected))
            {
                continue;
            }
            if let Some(related) = &query.related_to {
                let me = ContentRef::new(item.kind.clone(), item.id.clone());
                if !self.is_related(&me, related).await {
                    continue;
                }
            }
            results.push(self.decorate(item).await);
        }

        debug!(kind = %kind, matched = results.len(), "Content query completed");
        Ok(results)
    }

    async fn get(&self, kind: &ContentKind, id: &str) -> Result<Option<ContentItem>, ContentError> {
        self.ensure_kind(kind)?;
        let found = self
            .items
            .read()
            .await
            .get(kind)
            .and_then(|items| items.iter().find(|item| item.id == id).cloned());
        match found {
            Some(item) => Ok(Some(self.decorate(item).await)),
            None => Ok(None),
        }
    }

    async fn create(&self, kind: &ContentKind, fields: Map<String, Value>) -> Result<ContentItem, ContentError> {
        if fields.contains_key("id") {
            return Err(ContentError::invalid_input("`id` is assigned by the host"));
        }
        let item = self.seed(kind, fields).await?;
        debug!(kind = %kind, id = %item.id, "Content item created");
        Ok(self.decorate(item).await)
    }

    async fn update(
        &self,
        kind: &ContentKind,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<ContentItem, ContentError> {
        self.ensure_kind(kind)?;
        let updated = {
            let mut items = self.items.write().await;
            let item = items
                .get_mut(kind)
                .and_then(|items| items.iter_mut().find(|item| item.id == id))
                .ok_or_else(|| ContentError::not_found(kind.to_string(), id))?;
            for (key, value) in fields {
                if key != "id" {
                    item.fields.insert(key, value);
                }
            }
            item.modified_at = OffsetDateTime::now_utc();
            item.clone()
        };
        debug!(kind = %kind, id = %id, "Content item updated");
        Ok(self.decorate(updated).await)
    }

    async fn delete(&self, kind: &ContentKind, id: &str) -> Result<ContentItem, ContentError> {
        self.ensure_kind(kind)?;
        let removed = {
            let mut items = self.items.write().await;
            let collection = items.get_mut(kind);
            let position = collection
                .as_ref()
                .and_then(|items| items.iter().position(|item| item.id == id));
            match (collection, position) {
                (Some(items), Some(index)) => items.remove(index),
                _ => return Err(ContentError::not_found(kind.to_string(), id)),
            }
        };
        let me = ContentRef::new(kind.clone(), id);
        self.relations
            .write()
            .await
            .retain(|(a, b)| *a != me && *b != me);
        debug!(kind = %kind, id = %id, "Content item deleted");
        Ok(removed)
    }

    async fn settings(&self, group: &str) -> Result<Map<String, Value>, ContentError> {
        self.ensure_group(group)?;
        Ok(self
            .settings
            .read()
            .await
            .get(group)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_settings(&self, group: &str, values: Map<String, Value>) -> Result<Map<String, Value>, ContentError> {
        self.ensure_group(group)?;
        let mut settings = self.settings.write().await;
        let current = settings.entry(group.to_string()).or_default();
        for (key, value) in values {
            current.insert(key, value);
        }
        debug!(group = %group, "Settings updated");
        Ok(current.clone())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn source() -> InMemoryContentSource {
        InMemoryContentSource::new()
            .with_post_type(PostTypeInfo::new("post", "post", "posts").with_taxonomies(["category"]))
            .with_taxonomy(TaxonomyInfo::new("category", "category", "categories"))
    }

    #[tokio::test]
    async fn test_seed_and_find() {
        let source = source();
        let post = ContentKind::Post("post".into());
        source.seed(&post, fields(json!({"title": "Hello"}))).await.unwrap();
        source.seed(&post, fields(json!({"title": "World", "status": "publish"}))).await.unwrap();

        let all = source.find(&post, &ContentQuery::new()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].field("status"), Some(&json!("draft")));

        let published = source
            .find(&post, &ContentQuery::new().with_filter("status", "publish"))
            .await
            .unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].field("title"), Some(&json!("World")));

        let searched = source
            .find(&post, &ContentQuery::new().with_search("hel"))
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_kind() {
        let source = source();
        let err = source
            .find(&ContentKind::Post("product".into()), &ContentQuery::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::UnknownKind { .. }));
    }

    #[tokio::test]
    async fn test_relations_and_term_count() {
        let source = source();
        let post_kind = ContentKind::Post("post".into());
        let cat_kind = ContentKind::Term("category".into());
        let post = source.seed(&post_kind, fields(json!({"title": "A"}))).await.unwrap();
        let news = source.seed(&cat_kind, fields(json!({"name": "News"}))).await.unwrap();
        source.seed(&cat_kind, fields(json!({"name": "Other"}))).await.unwrap();

        source
            .relate(
                ContentRef::new(post_kind.clone(), post.id.clone()),
                ContentRef::new(cat_kind.clone(), news.id.clone()),
            )
            .await;

        let terms = source
            .find(
                &cat_kind,
                &ContentQuery::new().related_to(ContentRef::new(post_kind, post.id)),
            )
            .await
            .unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].field("count"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let source = source();
        let post = ContentKind::Post("post".into());
        let created = source.create(&post, fields(json!({"title": "Draft"}))).await.unwrap();

        let updated = source
            .update(&post, &created.id, fields(json!({"title": "Final"})))
            .await
            .unwrap();
        assert_eq!(updated.field("title"), Some(&json!("Final")));

        let deleted = source.delete(&post, &created.id).await.unwrap();
        assert_eq!(deleted.id, created.id);
        assert!(source.get(&post, &created.id).await.unwrap().is_none());

        let err = source.delete(&post, &created.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_rejects_id() {
        let source = source();
        let err = source
            .create(&ContentKind::Post("post".into()), fields(json!({"id": "9"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_settings() {
        let source = InMemoryContentSource::new()
            .with_setting_group(SettingGroup::new("general"), fields(json!({"title": "Site"})));

        let values = source.settings("general").await.unwrap();
        assert_eq!(values["title"], "Site");

        let values = source
            .update_settings("general", fields(json!({"title": "New"})))
            .await
            .unwrap();
        assert_eq!(values["title"], "New");

        assert!(source.settings("reading").await.is_err());
    }
}
