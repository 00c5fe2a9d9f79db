//! Content types for the content-host abstraction layer.
//!
//! This module defines the metadata the host exposes (post types, taxonomies,
//! setting groups) and the items that flow through a
//! [`ContentSource`](crate::ContentSource).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A post type configured for exposure in the graph (e.g. `post`, `page`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTypeInfo {
    /// Host-side name of the post type.
    pub name: String,
    /// Singular name used for the GraphQL type (e.g. `post` → `Post`).
    pub graphql_single_name: String,
    /// Plural name used for root connections (e.g. `posts`).
    pub graphql_plural_name: String,
    /// Human readable label.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether items of this type may have parents.
    #[serde(default)]
    pub hierarchical: bool,
    /// Taxonomies connected to this post type.
    #[serde(default)]
    pub taxonomies: Vec<String>,
}

impl PostTypeInfo {
    /// Creates a new post type description.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        graphql_single_name: impl Into<String>,
        graphql_plural_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            graphql_single_name: graphql_single_name.into(),
            graphql_plural_name: graphql_plural_name.into(),
            label: None,
            hierarchical: false,
            taxonomies: Vec::new(),
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Marks the post type as hierarchical.
    #[must_use]
    pub fn hierarchical(mut self) -> Self {
        self.hierarchical = true;
        self
    }

    /// Connects taxonomies to this post type.
    #[must_use]
    pub fn with_taxonomies(mut self, taxonomies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.taxonomies = taxonomies.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the content kind for items of this post type.
    #[must_use]
    pub fn kind(&self) -> ContentKind {
        ContentKind::Post(self.name.clone())
    }
}

/// A taxonomy configured for exposure in the graph (e.g. `category`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyInfo {
    /// Host-side name of the taxonomy.
    pub name: String,
    /// Singular name used for the GraphQL type (e.g. `category`).
    pub graphql_single_name: String,
    /// Plural name used for connections (e.g. `categories`).
    pub graphql_plural_name: String,
    /// Human readable label.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether terms may have parents.
    #[serde(default)]
    pub hierarchical: bool,
}

impl TaxonomyInfo {
    /// Creates a new taxonomy description.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        graphql_single_name: impl Into<String>,
        graphql_plural_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            graphql_single_name: graphql_single_name.into(),
            graphql_plural_name: graphql_plural_name.into(),
            label: None,
            hierarchical: false,
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Marks the taxonomy as hierarchical.
    #[must_use]
    pub fn hierarchical(mut self) -> Self {
        self.hierarchical = true;
        self
    }

    /// Returns the content kind for terms of this taxonomy.
    #[must_use]
    pub fn kind(&self) -> ContentKind {
        ContentKind::Term(self.name.clone())
    }
}

/// A group of settings exposed together (e.g. `general`, `reading`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingGroup {
    /// Group name as known by the host.
    pub name: String,
    /// Settings in this group.
    #[serde(default)]
    pub settings: Vec<SettingField>,
}

impl SettingGroup {
    /// Creates an empty setting group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: Vec::new(),
        }
    }

    /// Adds a setting to the group.
    #[must_use]
    pub fn with_setting(mut self, setting: SettingField) -> Self {
        self.settings.push(setting);
        self
    }
}

/// A single setting inside a [`SettingGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingField {
    /// Setting name (e.g. `title`).
    pub name: String,
    /// Value type of the setting.
    #[serde(default)]
    pub kind: SettingKind,
    /// Description shown in the schema.
    #[serde(default)]
    pub description: Option<String>,
}

impl SettingField {
    /// Creates a new setting.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SettingKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Value type of a setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    /// Free-form text.
    #[default]
    String,
    /// Whole number.
    Integer,
    /// Floating point number.
    Number,
    /// True / false flag.
    Boolean,
}

/// Identifies a collection of content items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum ContentKind {
    /// Items of a post type, by post type name.
    Post(String),
    /// Terms of a taxonomy, by taxonomy name.
    Term(String),
}

impl ContentKind {
    /// Returns the post type or taxonomy name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Post(name) | Self::Term(name) => name,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post(name) => write!(f, "post:{name}"),
            Self::Term(name) => write!(f, "term:{name}"),
        }
    }
}

/// A content item (post or term) as held by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// The item ID.
    pub id: String,
    /// The collection the item belongs to.
    pub kind: ContentKind,
    /// Host-side fields (title, content, name, ...).
    pub fields: Map<String, Value>,
    /// When the item was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the item was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
}

impl ContentItem {
    /// Creates a new item stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ContentKind, fields: Map<String, Value>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: id.into(),
            kind,
            fields,
            created_at: now,
            modified_at: now,
        }
    }

    /// Returns a host field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Flattens the item into a JSON object suitable as a graph source value.
    ///
    /// Host fields are copied first; `id`, `databaseId`, `date`, `modified` and
    /// the `postType` / `taxonomy` discriminator are always set.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        if let Ok(database_id) = self.id.parse::<i64>() {
            object.insert("databaseId".to_string(), Value::from(database_id));
        }
        if let Ok(date) = self.created_at.format(&Rfc3339) {
            object.insert("date".to_string(), Value::String(date));
        }
        if let Ok(modified) = self.modified_at.format(&Rfc3339) {
            object.insert("modified".to_string(), Value::String(modified));
        }
        match &self.kind {
            ContentKind::Post(post_type) => {
                object.insert("postType".to_string(), Value::String(post_type.clone()));
            }
            ContentKind::Term(taxonomy) => {
                object.insert("taxonomy".to_string(), Value::String(taxonomy.clone()));
            }
        }
        Value::Object(object)
    }
}

/// A reference to a single item, used to follow relationships.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    /// Collection of the referenced item.
    pub kind: ContentKind,
    /// ID of the referenced item.
    pub id: String,
}

impl ContentRef {
    /// Creates a new reference.
    #[must_use]
    pub fn new(kind: ContentKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Parameters for [`ContentSource::find`](crate::ContentSource::find).
///
/// Results are returned in the host's natural order; pagination is applied by
/// the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentQuery {
    /// Only return items related to this item.
    pub related_to: Option<ContentRef>,
    /// Case-insensitive text search over titles and names.
    pub search: Option<String>,
    /// Only return items whose ID is in this list.
    pub include: Option<Vec<String>>,
    /// Exact-match filters on host fields.
    pub filters: Map<String, Value>,
}

impl ContentQuery {
    /// Creates an empty query matching every item.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the query to items related to `item`.
    #[must_use]
    pub fn related_to(mut self, item: ContentRef) -> Self {
        self.related_to = Some(item);
        self
    }

    /// Adds a text search.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Restricts the query to the given IDs.
    #[must_use]
    pub fn with_include(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Adds an exact-match filter.
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_item_to_json() {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!("Hello"));
        let item = ContentItem::new("7", ContentKind::Post("post".into()), fields);

        let value = item.to_json();
        assert_eq!(value["id"], "7");
        assert_eq!(value["databaseId"], 7);
        assert_eq!(value["title"], "Hello");
        assert_eq!(value["postType"], "post");
        assert!(value["date"].is_string());
    }

    #[test]
    fn test_content_kind_display() {
        assert_eq!(ContentKind::Post("page".into()).to_string(), "post:page");
        assert_eq!(ContentKind::Term("category".into()).to_string(), "term:category");
    }

    #[test]
    fn test_post_type_deserialize() {
        let info: PostTypeInfo = serde_json::from_value(json!({
            "name": "post",
            "graphql_single_name": "post",
            "graphql_plural_name": "posts",
            "taxonomies": ["category"]
        }))
        .unwrap();

        assert_eq!(info.kind(), ContentKind::Post("post".into()));
        assert_eq!(info.taxonomies, vec!["category".to_string()]);
        assert!(!info.hierarchical);
    }

    #[test]
    fn test_query_builder() {
        let query = ContentQuery::new()
            .with_search("hello")
            .with_include(["1", "2"])
            .with_filter("status", "publish");

        assert_eq!(query.search.as_deref(), Some("hello"));
        assert_eq!(query.include.as_ref().map(Vec::len), Some(2));
        assert_eq!(query.filters["status"], "publish");
    }
}
