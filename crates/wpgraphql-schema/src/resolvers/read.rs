//! Single node resolver.
//!
//! Implements resolvers for queries like `contentNode(id: "12")` that look an
//! item up by ID across several content kinds.

use tracing::{debug, warn};
use wpgraphql_content::{ContentKind, DynContentSource};

use super::{content_error_to_graphql, json_to_graphql_value, value_as_id};
use crate::registry::{ResolveFuture, ResolveParams};

/// Resolver for single node reads.
pub struct NodeResolver;

impl NodeResolver {
    /// Creates a resolver returning the first item of `kinds` with the `id`
    /// argument, or `null`.
    pub fn resolve(
        source: DynContentSource,
        kinds: Vec<ContentKind>,
    ) -> impl Fn(ResolveParams<'_>) -> ResolveFuture<'_> + Send + Sync + Clone {
        move |params| {
            let source = source.clone();
            let kinds = kinds.clone();
            ResolveFuture::new(async move {
                let id = params
                    .arg("id")
                    .and_then(value_as_id)
                    .ok_or_else(|| async_graphql::Error::new("Missing required argument 'id'"))?;

                for kind in &kinds {
                    let found = source.get(kind, &id).await.map_err(|e| {
                        warn!(error = %e, kind = %kind, "Content error reading node");
                        content_error_to_graphql(e)
                    })?;
                    if let Some(item) = found {
                        debug!(kind = %kind, id = %id, "Resolved node");
                        return Ok(Some(json_to_graphql_value(item.to_json())));
                    }
                }

                debug!(id = %id, "Node not found");
                Ok(None)
            })
        }
    }
}
