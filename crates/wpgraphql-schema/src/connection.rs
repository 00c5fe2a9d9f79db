//! Connection synthesis.
//!
//! A connection links `from_type` to a paginated list of `to_type`. For
//! `Post → Category` it registers:
//!
//! - `PostToCategoryConnectionWhereArgs` (only when connection args are given)
//! - `PostToCategoryConnectionEdge { cursor, node, ..edge_fields }`
//! - `PostToCategoryConnection { pageInfo, edges, nodes, ..connection_fields }`
//! - `Post.categories(first, last, after, before, where)`
//!
//! Caller-supplied edge and connection fields are merged after the fixed ones
//! and replace them on a name collision.

use async_graphql::Value;
use indexmap::IndexMap;
use tracing::debug;

use crate::error::RegistryError;
use crate::registry::{
    FieldConfig, InputConfig, ObjectConfig, ResolveFuture, ResolveParams, Resolver, TypeRefSpec,
    TypeRegistry, display_name, resolver,
};

/// Name of the page info type every connection exposes.
pub const PAGE_INFO_TYPE: &str = "WPPageInfo";

/// Describes a connection between two types.
#[derive(Clone, Default)]
pub struct ConnectionConfig {
    /// Type the connection field is added to.
    pub from_type: String,
    /// Type of the connected nodes.
    pub to_type: String,
    /// Name of the connection field on `from_type`.
    pub from_field_name: String,
    /// Fields of the generated `WhereArgs` input.
    pub connection_args: IndexMap<String, FieldConfig>,
    /// Extra fields on the connection type.
    pub connection_fields: IndexMap<String, FieldConfig>,
    /// Extra fields on the edge type.
    pub edge_fields: IndexMap<String, FieldConfig>,
    /// Resolver of `Edge.node`.
    pub resolve_node: Option<Resolver>,
    /// Resolver of `Edge.cursor`.
    pub resolve_cursor: Option<Resolver>,
    /// Resolver of the connection field itself.
    pub resolve: Option<Resolver>,
    /// Description of the connection field.
    pub description: Option<String>,
}

impl ConnectionConfig {
    /// Creates a connection descriptor.
    #[must_use]
    pub fn new(
        from_type: impl Into<String>,
        to_type: impl Into<String>,
        from_field_name: impl Into<String>,
    ) -> Self {
        Self {
            from_type: from_type.into(),
            to_type: to_type.into(),
            from_field_name: from_field_name.into(),
            ..Self::default()
        }
    }

    /// Adds a field to the `WhereArgs` input.
    #[must_use]
    pub fn connection_arg(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.connection_args.insert(name.into(), config);
        self
    }

    /// Adds a field to the connection type.
    #[must_use]
    pub fn connection_field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.connection_fields.insert(name.into(), config);
        self
    }

    /// Adds a field to the edge type.
    #[must_use]
    pub fn edge_field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.edge_fields.insert(name.into(), config);
        self
    }

    /// Sets the connection resolver.
    #[must_use]
    pub fn resolve<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(ResolveParams<'a>) -> ResolveFuture<'a> + Send + Sync + 'static,
    {
        self.resolve = Some(resolver(f));
        self
    }

    /// Sets the edge node resolver.
    #[must_use]
    pub fn resolve_node<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(ResolveParams<'a>) -> ResolveFuture<'a> + Send + Sync + 'static,
    {
        self.resolve_node = Some(resolver(f));
        self
    }

    /// Sets the edge cursor resolver.
    #[must_use]
    pub fn resolve_cursor<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(ResolveParams<'a>) -> ResolveFuture<'a> + Send + Sync + 'static,
    {
        self.resolve_cursor = Some(resolver(f));
        self
    }

    /// Sets the description of the connection field.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// `Cap(from) + "To" + Cap(to) + "Connection"`.
#[must_use]
pub fn connection_name(from_type: &str, to_type: &str) -> String {
    format!("{}To{}Connection", display_name(from_type), display_name(to_type))
}

fn merge(
    fixed: impl IntoIterator<Item = (String, FieldConfig)>,
    extra: IndexMap<String, FieldConfig>,
) -> IndexMap<String, FieldConfig> {
    let mut fields: IndexMap<String, FieldConfig> = fixed.into_iter().collect();
    fields.extend(extra);
    fields
}

impl TypeRegistry {
    /// Registers a connection.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::IncompleteConnection` if `from_type`,
    /// `to_type` or `from_field_name` is empty, and
    /// `RegistryError::MissingFieldType` if an extra field has no type.
    pub fn register_connection(&mut self, config: ConnectionConfig) -> Result<(), RegistryError> {
        if config.from_type.is_empty() {
            return Err(RegistryError::IncompleteConnection("fromType"));
        }
        if config.to_type.is_empty() {
            return Err(RegistryError::IncompleteConnection("toType"));
        }
        if config.from_field_name.is_empty() {
            return Err(RegistryError::IncompleteConnection("fromFieldName"));
        }

        let connection = connection_name(&config.from_type, &config.to_type);
        let edge = format!("{connection}Edge");

        let where_args = if config.connection_args.is_empty() {
            None
        } else {
            let name = format!("{connection}WhereArgs");
            self.register_input_type(
                &name,
                InputConfig::new()
                    .description(format!("Arguments for filtering the {connection} connection"))
                    .fields(config.connection_args),
            )?;
            Some(name)
        };

        self.register_object_type(
            &edge,
            ObjectConfig::new()
                .description(format!("An edge in the {connection} connection"))
                .fields(merge(
                    [
                        (
                            "cursor".to_string(),
                            FieldConfig::new("String")
                                .description("A cursor for use in pagination")
                                .resolver(config.resolve_cursor),
                        ),
                        (
                            "node".to_string(),
                            FieldConfig::new(config.to_type.as_str())
                                .description("The item at the end of the edge")
                                .resolver(config.resolve_node),
                        ),
                    ],
                    config.edge_fields,
                )),
        )?;

        self.register_object_type(
            &connection,
            ObjectConfig::new()
                .description(format!(
                    "Connection between the {} type and the {} type",
                    display_name(&config.from_type),
                    display_name(&config.to_type)
                ))
                .fields(merge(
                    [
                        (
                            "pageInfo".to_string(),
                            FieldConfig::new(PAGE_INFO_TYPE)
                                .description("Information about pagination in a connection."),
                        ),
                        (
                            "edges".to_string(),
                            FieldConfig::new(TypeRefSpec::named(&edge).list_of())
                                .description(format!("Edges for the {connection} connection")),
                        ),
                        (
                            "nodes".to_string(),
                            FieldConfig::new(TypeRefSpec::named(config.to_type.as_str()).list_of())
                                .description("The nodes of the connection, without the edges")
                                .resolve(|params| {
                                    let nodes = params
                                        .source_field("nodes")
                                        .filter(|nodes| !matches!(nodes, Value::Null))
                                        .cloned()
                                        .unwrap_or(Value::List(Vec::new()));
                                    ResolveFuture::ready(Ok(Some(nodes)))
                                }),
                        ),
                    ],
                    config.connection_fields,
                )),
        )?;

        let mut field = FieldConfig::new(connection.as_str())
            .arg(
                "first",
                FieldConfig::new("Int").description("The number of items to return after the referenced \"after\" cursor"),
            )
            .arg(
                "last",
                FieldConfig::new("Int").description("The number of items to return before the referenced \"before\" cursor"),
            )
            .arg(
                "after",
                FieldConfig::new("String").description("Cursor used along with the \"first\" argument"),
            )
            .arg(
                "before",
                FieldConfig::new("String").description("Cursor used along with the \"last\" argument"),
            )
            .resolver(config.resolve);
        if let Some(where_args) = where_args {
            field = field.arg(
                "where",
                FieldConfig::new(where_args.as_str()).description("Arguments for filtering the connection"),
            );
        }
        if let Some(description) = config.description {
            field = field.description(description);
        }

        debug!(
            from = %config.from_type,
            to = %config.to_type,
            field = %config.from_field_name,
            connection = %connection,
            "Registered connection"
        );
        self.register_field(&config.from_type, &config.from_field_name, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{BuiltinScalar, ScalarConfig};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for (name, builtin) in [
            ("String", BuiltinScalar::String),
            ("Int", BuiltinScalar::Int),
            ("Boolean", BuiltinScalar::Boolean),
        ] {
            registry.register_scalar(name, ScalarConfig::alias(builtin)).unwrap();
        }
        registry
            .register_object_type(
                PAGE_INFO_TYPE,
                ObjectConfig::new().field("hasNextPage", FieldConfig::new("Boolean")),
            )
            .unwrap();
        registry
            .register_object_type("Post", ObjectConfig::new().field("title", FieldConfig::new("String")))
            .unwrap();
        registry
            .register_object_type("Category", ObjectConfig::new().field("name", FieldConfig::new("String")))
            .unwrap();
        registry
    }

    #[test]
    fn test_incomplete_connection() {
        let mut registry = registry();
        let err = registry
            .register_connection(ConnectionConfig::new("", "Category", "categories"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::IncompleteConnection("fromType")));

        let err = registry
            .register_connection(ConnectionConfig::new("Post", "Category", ""))
            .unwrap_err();
        assert!(matches!(err, RegistryError::IncompleteConnection("fromFieldName")));
    }

    #[test]
    fn test_connection_types_and_field() {
        let mut registry = registry();
        registry
            .register_connection(
                ConnectionConfig::new("post", "category", "categories")
                    .connection_arg("search", FieldConfig::new("String")),
            )
            .unwrap();

        assert!(registry.get_type("PostToCategoryConnection").is_some());
        assert!(registry.get_type("PostToCategoryConnectionEdge").is_some());
        assert!(registry.get_type("PostToCategoryConnectionWhereArgs").is_some());

        let field = &registry.fields("Post").unwrap()["categories"];
        assert_eq!(field.ty.to_string(), "PostToCategoryConnection");
        assert_eq!(
            field.args.keys().collect::<Vec<_>>(),
            vec!["first", "last", "after", "before", "where"]
        );
        assert_eq!(field.args["where"].ty.to_string(), "PostToCategoryConnectionWhereArgs");

        let connection = registry.fields("PostToCategoryConnection").unwrap();
        assert_eq!(
            connection.keys().collect::<Vec<_>>(),
            vec!["pageInfo", "edges", "nodes"]
        );
        assert_eq!(connection["nodes"].ty.to_string(), "[Category]");
        assert_eq!(connection["edges"].ty.to_string(), "[PostToCategoryConnectionEdge]");
    }

    #[test]
    fn test_no_where_without_args() {
        let mut registry = registry();
        registry
            .register_connection(ConnectionConfig::new("Post", "Category", "categories"))
            .unwrap();

        assert!(registry.get_type("PostToCategoryConnectionWhereArgs").is_none());
        let field = &registry.fields("Post").unwrap()["categories"];
        assert!(!field.args.contains_key("where"));
    }

    #[test]
    fn test_extra_fields_win() {
        let mut registry = registry();
        registry
            .register_connection(
                ConnectionConfig::new("Post", "Category", "categories")
                    .edge_field("cursor", FieldConfig::new("Int"))
                    .edge_field("isPrimary", FieldConfig::new("Boolean"))
                    .connection_field("totalCount", FieldConfig::new("Int")),
            )
            .unwrap();

        let edge = registry.fields("PostToCategoryConnectionEdge").unwrap();
        assert_eq!(edge["cursor"].ty.to_string(), "Int");
        assert_eq!(edge.keys().collect::<Vec<_>>(), vec!["cursor", "node", "isPrimary"]);

        let connection = registry.fields("PostToCategoryConnection").unwrap();
        assert!(connection.contains_key("totalCount"));
    }
}
