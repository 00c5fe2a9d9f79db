//! Connection resolver for content lists.
//!
//! Implements resolvers for fields like `RootQuery.posts(where: {...})` and
//! `Post.categories(first: 5)`: the content host is queried with the `where`
//! filters, then the result is paged with [`paginate`](super::pagination::paginate).

use async_graphql::Value;
use tracing::{debug, warn};
use wpgraphql_content::{ContentKind, ContentQuery, ContentRef, DynContentSource};

use super::pagination::{PageArgs, paginate};
use super::{content_error_to_graphql, json_to_graphql_value, value_as_id};
use crate::config::SchemaConfig;
use crate::registry::{Arguments, ResolveFuture, ResolveParams};

/// Resolver for content connections.
pub struct ConnectionResolver;

impl ConnectionResolver {
    /// Creates a resolver listing items of `kind`.
    ///
    /// With a `parent` kind, only items related to the parent item (read from
    /// the source's `id`) are listed.
    pub fn resolve(
        source: DynContentSource,
        kind: ContentKind,
        parent: Option<ContentKind>,
        config: SchemaConfig,
    ) -> impl Fn(ResolveParams<'_>) -> ResolveFuture<'_> + Send + Sync + Clone {
        move |params| {
            let source = source.clone();
            let kind = kind.clone();
            let parent = parent.clone();
            let config = config.clone();
            ResolveFuture::new(async move {
                let page = PageArgs::from_args(&params.args)?;
                let (mut query, hide_empty) = query_from_where(&params.args);

                if let Some(parent_kind) = parent {
                    let Some(parent_id) = params.source_field("id").and_then(value_as_id) else {
                        return Ok(Some(paginate(Vec::new(), &page, &config)));
                    };
                    query = query.related_to(ContentRef::new(parent_kind, parent_id));
                }

                debug!(kind = %kind, ?query, "Resolving content connection");

                let items = source.find(&kind, &query).await.map_err(|e| {
                    warn!(error = %e, kind = %kind, "Content error during connection query");
                    content_error_to_graphql(e)
                })?;

                let nodes = items
                    .into_iter()
                    .filter(|item| {
                        !hide_empty
                            || item
                                .field("count")
                                .and_then(serde_json::Value::as_u64)
                                .is_some_and(|count| count > 0)
                    })
                    .map(|item| json_to_graphql_value(item.to_json()))
                    .collect();

                Ok(Some(paginate(nodes, &page, &config)))
            })
        }
    }
}

/// Translates the `where` argument into a content query.
///
/// Returns the query and whether empty terms should be hidden.
fn query_from_where(args: &Arguments) -> (ContentQuery, bool) {
    let mut query = ContentQuery::new();
    let mut hide_empty = false;

    let Some(Value::Object(filters)) = args.get("where") else {
        return (query, hide_empty);
    };

    for (key, value) in filters {
        match (key.as_str(), value) {
            (_, Value::Null) => {}
            ("search", Value::String(search)) => query = query.with_search(search.clone()),
            ("include", Value::List(ids)) => {
                query = query.with_include(ids.iter().filter_map(value_as_id));
            }
            ("hideEmpty", Value::Boolean(hide)) => hide_empty = *hide,
            (field, value) => {
                query = query.with_filter(field, super::graphql_value_to_json(value));
            }
        }
    }

    (query, hide_empty)
}
