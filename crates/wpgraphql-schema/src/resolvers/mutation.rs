//! Create / update / delete resolvers for content mutations.
//!
//! Each constructor returns a `mutate_and_get_payload` function for
//! [`MutationConfig`](crate::mutation::MutationConfig). The payload carries
//! the affected item under `payload_field` (e.g. `post`); delete payloads
//! also carry `deletedId`.

use async_graphql::{Context, Name, Value};
use indexmap::IndexMap;
use tracing::{debug, warn};
use wpgraphql_content::{ContentKind, DynContentSource};

use super::{arguments_to_fields, content_error_to_graphql, json_to_graphql_value, value_as_id};
use crate::mutation::CLIENT_MUTATION_ID;
use crate::registry::{Arguments, ResolveFuture};

/// Resolvers for content mutations.
pub struct MutationResolver;

fn required_id(input: &Arguments) -> async_graphql::Result<String> {
    input
        .get("id")
        .and_then(value_as_id)
        .ok_or_else(|| async_graphql::Error::new("Missing required input field 'id'"))
}

fn payload(payload_field: &str, item: Value) -> IndexMap<Name, Value> {
    let mut map = IndexMap::new();
    map.insert(Name::new(payload_field), item);
    map
}

impl MutationResolver {
    /// Creates an item of `kind` from the input fields.
    pub fn create(
        source: DynContentSource,
        kind: ContentKind,
        payload_field: String,
    ) -> impl for<'a> Fn(Arguments, &'a Context<'a>) -> ResolveFuture<'a> + Send + Sync + Clone {
        move |input, _ctx| {
            let source = source.clone();
            let kind = kind.clone();
            let payload_field = payload_field.clone();
            ResolveFuture::new(async move {
                let fields = arguments_to_fields(&input, &[CLIENT_MUTATION_ID, "id"]);
                let item = source.create(&kind, fields).await.map_err(|e| {
                    warn!(error = %e, kind = %kind, "Content error during create");
                    content_error_to_graphql(e)
                })?;

                debug!(kind = %kind, id = %item.id, "Created content item");
                Ok(Some(Value::Object(payload(&payload_field, json_to_graphql_value(item.to_json())))))
            })
        }
    }

    /// Updates the item named by the input `id`.
    pub fn update(
        source: DynContentSource,
        kind: ContentKind,
        payload_field: String,
    ) -> impl for<'a> Fn(Arguments, &'a Context<'a>) -> ResolveFuture<'a> + Send + Sync + Clone {
        move |input, _ctx| {
            let source = source.clone();
            let kind = kind.clone();
            let payload_field = payload_field.clone();
            ResolveFuture::new(async move {
                let id = required_id(&input)?;
                let fields = arguments_to_fields(&input, &[CLIENT_MUTATION_ID, "id"]);
                let item = source.update(&kind, &id, fields).await.map_err(|e| {
                    warn!(error = %e, kind = %kind, id = %id, "Content error during update");
                    content_error_to_graphql(e)
                })?;

                debug!(kind = %kind, id = %id, "Updated content item");
                Ok(Some(Value::Object(payload(&payload_field, json_to_graphql_value(item.to_json())))))
            })
        }
    }

    /// Deletes the item named by the input `id`.
    pub fn delete(
        source: DynContentSource,
        kind: ContentKind,
        payload_field: String,
    ) -> impl for<'a> Fn(Arguments, &'a Context<'a>) -> ResolveFuture<'a> + Send + Sync + Clone {
        move |input, _ctx| {
            let source = source.clone();
            let kind = kind.clone();
            let payload_field = payload_field.clone();
            ResolveFuture::new(async move {
                let id = required_id(&input)?;
                let item = source.delete(&kind, &id).await.map_err(|e| {
                    warn!(error = %e, kind = %kind, id = %id, "Content error during delete");
                    content_error_to_graphql(e)
                })?;

                debug!(kind = %kind, id = %id, "Deleted content item");
                let mut map = payload(&payload_field, json_to_graphql_value(item.to_json()));
                map.insert(Name::new("deletedId"), Value::String(id));
                Ok(Some(Value::Object(map)))
            })
        }
    }
}
