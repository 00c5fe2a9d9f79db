//! End-to-end tests: bootstrap a schema from an in-memory content host and
//! run queries and mutations against it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_graphql::dynamic::Schema;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use wpgraphql_content::{
    ContentError, ContentItem, ContentKind, ContentQuery, ContentRef, ContentSource,
    DynContentSource, InMemoryContentSource, PostTypeInfo, SettingField, SettingGroup, SettingKind,
    TaxonomyInfo,
};
use wpgraphql_schema::{
    FieldConfig, LazySchema, RegistryError, SchemaBootstrap, SchemaConfig, SchemaExtension,
    SchemaState, TypeRegistry,
};

// =============================================================================
// Fixtures
// =============================================================================

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn post_kind() -> ContentKind {
    ContentKind::Post("post".into())
}

fn page_kind() -> ContentKind {
    ContentKind::Post("page".into())
}

fn category_kind() -> ContentKind {
    ContentKind::Term("category".into())
}

/// Host with posts 1-3, categories 4-5 and page 6. Post 1 is filed under
/// category 4.
async fn seeded_source() -> Arc<InMemoryContentSource> {
    let general = SettingGroup::new("general")
        .with_setting(SettingField::new("title", SettingKind::String).with_description("Site title"))
        .with_setting(SettingField::new("posts_per_page", SettingKind::Integer));

    let source = Arc::new(
        InMemoryContentSource::new()
            .with_post_type(PostTypeInfo::new("post", "post", "posts").with_taxonomies(["category"]))
            .with_post_type(PostTypeInfo::new("page", "page", "pages"))
            .with_taxonomy(TaxonomyInfo::new("category", "category", "categories"))
            .with_setting_group(general, fields(json!({"title": "My Site", "posts_per_page": 10}))),
    );

    let first = source
        .seed(&post_kind(), fields(json!({"title": "Hello World", "status": "publish"})))
        .await
        .unwrap();
    source
        .seed(&post_kind(), fields(json!({"title": "Second Post"})))
        .await
        .unwrap();
    source
        .seed(&post_kind(), fields(json!({"title": "Third Post", "status": "publish"})))
        .await
        .unwrap();
    let news = source
        .seed(&category_kind(), fields(json!({"name": "News", "slug": "news"})))
        .await
        .unwrap();
    source
        .seed(&category_kind(), fields(json!({"name": "Empty", "slug": "empty"})))
        .await
        .unwrap();
    source
        .seed(&page_kind(), fields(json!({"title": "About", "status": "publish"})))
        .await
        .unwrap();

    source
        .relate(
            ContentRef::new(post_kind(), first.id),
            ContentRef::new(category_kind(), news.id),
        )
        .await;
    source
}

fn schema_for(source: Arc<InMemoryContentSource>) -> Schema {
    let source: DynContentSource = source;
    SchemaBootstrap::new(source).build_schema().unwrap()
}

async fn query(schema: &Schema, request: &str) -> Value {
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "{request}: {:?}", response.errors);
    response.data.into_json().unwrap()
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn test_posts_pagination() {
    let schema = schema_for(seeded_source().await);

    let data = query(
        &schema,
        "{ posts(first: 2) { nodes { title } pageInfo { hasNextPage hasPreviousPage endCursor } } }",
    )
    .await;
    let posts = &data["posts"];
    assert_eq!(posts["nodes"], json!([{"title": "Hello World"}, {"title": "Second Post"}]));
    assert_eq!(posts["pageInfo"]["hasNextPage"], json!(true));
    assert_eq!(posts["pageInfo"]["hasPreviousPage"], json!(false));

    let end_cursor = posts["pageInfo"]["endCursor"].as_str().unwrap();
    let data = query(
        &schema,
        &format!(r#"{{ posts(first: 2, after: "{end_cursor}") {{ edges {{ node {{ title }} }} pageInfo {{ hasNextPage }} }} }}"#),
    )
    .await;
    assert_eq!(
        data["posts"]["edges"],
        json!([{"node": {"title": "Third Post"}}])
    );
    assert_eq!(data["posts"]["pageInfo"]["hasNextPage"], json!(false));
}

#[tokio::test]
async fn test_invalid_cursor_is_an_error() {
    let schema = schema_for(seeded_source().await);
    let response = schema
        .execute(r#"{ posts(after: "not-a-cursor") { nodes { title } } }"#)
        .await;
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].message.contains("cursor"));
}

#[tokio::test]
async fn test_status_filter_maps_enum_values() {
    let schema = schema_for(seeded_source().await);

    let data = query(&schema, "{ posts(where: { status: PUBLISH }) { nodes { title status } } }").await;
    assert_eq!(
        data["posts"]["nodes"],
        json!([
            {"title": "Hello World", "status": "PUBLISH"},
            {"title": "Third Post", "status": "PUBLISH"}
        ])
    );

    let data = query(&schema, r#"{ posts(where: { search: "second" }) { nodes { status } } }"#).await;
    assert_eq!(data["posts"]["nodes"], json!([{"status": "DRAFT"}]));
}

#[tokio::test]
async fn test_post_to_category_connection() {
    let schema = schema_for(seeded_source().await);

    let data = query(
        &schema,
        "{ posts(first: 2) { nodes { databaseId categories { nodes { name } } } } }",
    )
    .await;
    assert_eq!(
        data["posts"]["nodes"],
        json!([
            {"databaseId": 1, "categories": {"nodes": [{"name": "News"}]}},
            {"databaseId": 2, "categories": {"nodes": []}}
        ])
    );

    let data = query(&schema, "{ categories { nodes { name posts { nodes { title } } } } }").await;
    assert_eq!(
        data["categories"]["nodes"][0],
        json!({"name": "News", "posts": {"nodes": [{"title": "Hello World"}]}})
    );
}

#[tokio::test]
async fn test_categories_hide_empty() {
    let schema = schema_for(seeded_source().await);

    let data = query(&schema, "{ categories { nodes { name count } } }").await;
    assert_eq!(
        data["categories"]["nodes"],
        json!([{"name": "News", "count": 1}, {"name": "Empty", "count": 0}])
    );

    let data = query(&schema, "{ categories(where: { hideEmpty: true }) { nodes { name } } }").await;
    assert_eq!(data["categories"]["nodes"], json!([{"name": "News"}]));
}

#[tokio::test]
async fn test_content_node_union() {
    let schema = schema_for(seeded_source().await);

    let data = query(
        &schema,
        r#"{
            page: contentNode(id: "6") { __typename ... on Page { title } ... on Post { slug } }
            post: contentNode(id: "1") { __typename ... on Post { title } }
            missing: contentNode(id: "99") { __typename }
        }"#,
    )
    .await;
    assert_eq!(
        data,
        json!({
            "page": {"__typename": "Page", "title": "About"},
            "post": {"__typename": "Post", "title": "Hello World"},
            "missing": null
        })
    );
}

#[tokio::test]
async fn test_term_node_union() {
    let schema = schema_for(seeded_source().await);
    let data = query(
        &schema,
        r#"{ termNode(id: "4") { __typename ... on Category { name slug taxonomy } } }"#,
    )
    .await;
    assert_eq!(
        data["termNode"],
        json!({"__typename": "Category", "name": "News", "slug": "news", "taxonomy": "category"})
    );
}

#[tokio::test]
async fn test_post_types_and_taxonomies() {
    let schema = schema_for(seeded_source().await);
    let data = query(
        &schema,
        "{ postTypes { name graphqlPluralName connectedTaxonomyNames } taxonomies { name connectedPostTypeNames } }",
    )
    .await;
    assert_eq!(
        data,
        json!({
            "postTypes": [
                {"name": "post", "graphqlPluralName": "posts", "connectedTaxonomyNames": ["category"]},
                {"name": "page", "graphqlPluralName": "pages", "connectedTaxonomyNames": []}
            ],
            "taxonomies": [
                {"name": "category", "connectedPostTypeNames": ["post"]}
            ]
        })
    );
}

#[tokio::test]
async fn test_post_author_with_avatar() {
    let source = Arc::new(
        InMemoryContentSource::new().with_post_type(PostTypeInfo::new("post", "post", "posts")),
    );
    source
        .seed(
            &post_kind(),
            fields(json!({
                "title": "Signed",
                "author": {
                    "id": "dXNlcjox",
                    "name": "Ada",
                    "slug": "ada",
                    "avatar": {"url": "https://example.test/ada.png", "size": 96}
                }
            })),
        )
        .await
        .unwrap();
    source
        .seed(&post_kind(), fields(json!({"title": "Anonymous"})))
        .await
        .unwrap();

    let schema = schema_for(source);
    let data = query(
        &schema,
        "{ posts { nodes { title author { name slug avatar(size: 48) { size url } } } } }",
    )
    .await;
    assert_eq!(
        data["posts"]["nodes"],
        json!([
            {
                "title": "Signed",
                "author": {
                    "name": "Ada",
                    "slug": "ada",
                    "avatar": {"size": 48, "url": "https://example.test/ada.png"}
                }
            },
            {"title": "Anonymous", "author": null}
        ])
    );
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_post_mutations() {
    let source = seeded_source().await;
    let schema = schema_for(source.clone());

    let data = query(
        &schema,
        r#"mutation {
            createPost(input: { title: "Fresh", status: PENDING, clientMutationId: "c1" }) {
                clientMutationId
                post { databaseId title status }
            }
        }"#,
    )
    .await;
    assert_eq!(
        data["createPost"],
        json!({"clientMutationId": "c1", "post": {"databaseId": 7, "title": "Fresh", "status": "PENDING"}})
    );
    let stored = source.get(&post_kind(), "7").await.unwrap().unwrap();
    assert_eq!(stored.field("status"), Some(&json!("pending")));

    let data = query(
        &schema,
        r#"mutation { updatePost(input: { id: "7", title: "Edited", clientMutationId: "u1" }) { post { title status } } }"#,
    )
    .await;
    assert_eq!(data["updatePost"]["post"], json!({"title": "Edited", "status": "PENDING"}));

    let data = query(
        &schema,
        r#"mutation { deletePost(input: { id: "7", clientMutationId: "d1" }) { deletedId post { title } clientMutationId } }"#,
    )
    .await;
    assert_eq!(
        data["deletePost"],
        json!({"deletedId": "7", "post": {"title": "Edited"}, "clientMutationId": "d1"})
    );
    assert!(source.get(&post_kind(), "7").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_missing_post_reports_not_found() {
    let schema = schema_for(seeded_source().await);
    let response = schema
        .execute(r#"mutation { deletePost(input: { id: "404", clientMutationId: "x" }) { deletedId } }"#)
        .await;

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["data"]["deletePost"], Value::Null);
    assert_eq!(body["errors"][0]["extensions"]["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_term_mutations() {
    let source = seeded_source().await;
    let schema = schema_for(source.clone());

    let data = query(
        &schema,
        r#"mutation { createCategory(input: { name: "Events", slug: "events", clientMutationId: "t1" }) { category { name slug count } } }"#,
    )
    .await;
    assert_eq!(
        data["createCategory"]["category"],
        json!({"name": "Events", "slug": "events", "count": 0})
    );

    let response = schema
        .execute(r#"mutation { createCategory(input: { slug: "nameless", clientMutationId: "t2" }) { category { name } } }"#)
        .await;
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn test_pages_have_mutations_attachments_do_not() {
    let source: DynContentSource = Arc::new(
        InMemoryContentSource::new()
            .with_post_type(PostTypeInfo::new("page", "page", "pages"))
            .with_post_type(PostTypeInfo::new("attachment", "mediaItem", "mediaItems")),
    );
    let sdl = SchemaBootstrap::new(source).build_schema().unwrap().sdl();

    assert!(sdl.contains("createPage("));
    assert!(sdl.contains("mediaItems("));
    assert!(!sdl.contains("createMediaItem("));
}

// =============================================================================
// Settings
// =============================================================================

#[tokio::test]
async fn test_settings_query_and_update() {
    let source = seeded_source().await;
    let schema = schema_for(source.clone());

    let data = query(&schema, "{ generalSettings { title postsPerPage } }").await;
    assert_eq!(data["generalSettings"], json!({"title": "My Site", "postsPerPage": 10}));

    let data = query(
        &schema,
        r#"mutation {
            updateSettings(input: { generalSettingsTitle: "Renamed", clientMutationId: "s1" }) {
                clientMutationId
                generalSettings { title postsPerPage }
            }
        }"#,
    )
    .await;
    assert_eq!(
        data["updateSettings"],
        json!({
            "clientMutationId": "s1",
            "generalSettings": {"title": "Renamed", "postsPerPage": 10}
        })
    );
    assert_eq!(source.settings("general").await.unwrap()["title"], json!("Renamed"));
}

// =============================================================================
// Extensions
// =============================================================================

struct Seo {
    runs: Arc<AtomicUsize>,
}

impl SchemaExtension for Seo {
    fn name(&self) -> &str {
        "seo"
    }

    fn register(&self, registry: &mut TypeRegistry, _source: &DynContentSource) -> Result<(), RegistryError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        registry.register_field("Post", "metaDescription", FieldConfig::new("String"))?;
        registry.deregister_field("Post", "modified");
        Ok(())
    }
}

struct Broken;

impl SchemaExtension for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn register(&self, registry: &mut TypeRegistry, _source: &DynContentSource) -> Result<(), RegistryError> {
        registry.register_field("Post", "untyped", FieldConfig::default())
    }
}

#[tokio::test]
async fn test_extension_patches_content_types() {
    let source = seeded_source().await;
    source
        .seed(&post_kind(), fields(json!({"title": "Tagged", "metaDescription": "A summary"})))
        .await
        .unwrap();

    let runs = Arc::new(AtomicUsize::new(0));
    let dyn_source: DynContentSource = source;
    let schema = SchemaBootstrap::new(dyn_source)
        .with_extension(Seo { runs: runs.clone() })
        .build_schema()
        .unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let data = query(&schema, r#"{ posts(where: { search: "tagged" }) { nodes { metaDescription } } }"#).await;
    assert_eq!(data["posts"]["nodes"], json!([{"metaDescription": "A summary"}]));

    let response = schema.execute("{ posts { nodes { modified } } }").await;
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn test_failing_extension_aborts_bootstrap() {
    let source: DynContentSource = seeded_source().await;
    let err = SchemaBootstrap::new(source)
        .with_extension(Broken)
        .run()
        .unwrap_err();

    assert!(matches!(err, RegistryError::Extension { ref name, .. } if name == "broken"));
    assert_eq!(err.error_code(), "EXTENSION_FAILED");
}

// =============================================================================
// Host failures
// =============================================================================

struct OfflineSource;

#[async_trait]
impl ContentSource for OfflineSource {
    fn post_types(&self) -> Vec<PostTypeInfo> {
        vec![PostTypeInfo::new("post", "post", "posts")]
    }

    fn taxonomies(&self) -> Vec<TaxonomyInfo> {
        Vec::new()
    }

    fn setting_groups(&self) -> Vec<SettingGroup> {
        Vec::new()
    }

    async fn find(&self, _kind: &ContentKind, _query: &ContentQuery) -> Result<Vec<ContentItem>, ContentError> {
        Err(ContentError::internal("database offline"))
    }

    async fn get(&self, _kind: &ContentKind, _id: &str) -> Result<Option<ContentItem>, ContentError> {
        Err(ContentError::internal("database offline"))
    }

    async fn create(&self, _kind: &ContentKind, _fields: Map<String, Value>) -> Result<ContentItem, ContentError> {
        Err(ContentError::internal("database offline"))
    }

    async fn update(
        &self,
        _kind: &ContentKind,
        _id: &str,
        _fields: Map<String, Value>,
    ) -> Result<ContentItem, ContentError> {
        Err(ContentError::internal("database offline"))
    }

    async fn delete(&self, _kind: &ContentKind, _id: &str) -> Result<ContentItem, ContentError> {
        Err(ContentError::internal("database offline"))
    }

    async fn settings(&self, group: &str) -> Result<Map<String, Value>, ContentError> {
        Err(ContentError::unknown_kind(format!("settings:{group}")))
    }

    async fn update_settings(&self, group: &str, _values: Map<String, Value>) -> Result<Map<String, Value>, ContentError> {
        Err(ContentError::unknown_kind(format!("settings:{group}")))
    }

    fn backend_name(&self) -> &'static str {
        "offline"
    }
}

#[tokio::test]
async fn test_host_errors_carry_a_code() {
    let source: DynContentSource = Arc::new(OfflineSource);
    let schema = SchemaBootstrap::new(source).build_schema().unwrap();

    let response = schema.execute("{ posts { nodes { title } } }").await;
    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["errors"][0]["extensions"]["code"], json!("INTERNAL_SERVER_ERROR"));
    assert!(body["errors"][0]["message"].as_str().unwrap().contains("database offline"));
}

#[tokio::test]
async fn test_schema_without_settings_has_no_update_settings() {
    let source: DynContentSource = Arc::new(OfflineSource);
    let sdl = SchemaBootstrap::new(source).build_schema().unwrap().sdl();
    assert!(!sdl.contains("updateSettings"));
    assert!(!sdl.contains("TermObjectUnion"));
    assert!(sdl.contains("PostObjectUnion"));
}

// =============================================================================
// Lazy schema
// =============================================================================

#[tokio::test]
async fn test_lazy_schema_builds_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let source: DynContentSource = seeded_source().await;
    let lazy = LazySchema::new(SchemaBootstrap::new(source).with_extension(Seo { runs: runs.clone() }));

    assert_eq!(lazy.state().await, SchemaState::Uninitialized);
    let first = lazy.get_or_build_wait().await.unwrap();
    let second = lazy.get_or_build().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let data = query(&first, "{ pages { nodes { title } } }").await;
    assert_eq!(data["pages"]["nodes"], json!([{"title": "About"}]));

    lazy.invalidate().await;
    assert!(!lazy.is_ready().await);
    lazy.get_or_build_wait().await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_lazy_schema_remembers_failures() {
    let source: DynContentSource = seeded_source().await;
    let lazy = LazySchema::new(SchemaBootstrap::new(source).with_extension(Broken));

    assert!(lazy.get_or_build_wait().await.is_err());
    assert!(lazy.last_error().await.unwrap().contains("broken"));
    assert!(matches!(lazy.get_or_build_wait().await, Err(RegistryError::SchemaBuild(_))));
}

#[tokio::test]
async fn test_query_limits_apply() {
    let source: DynContentSource = seeded_source().await;
    let config = SchemaConfig {
        max_depth: 2,
        ..SchemaConfig::default()
    };
    let schema = SchemaBootstrap::new(source).with_config(config).build_schema().unwrap();

    let response = schema
        .execute("{ posts { nodes { categories { nodes { name } } } } }")
        .await;
    assert!(!response.errors.is_empty());
}
