//! Connections between the root query, post types and taxonomies.

use tracing::debug;
use wpgraphql_content::{DynContentSource, PostTypeInfo, TaxonomyInfo};

use crate::config::{ROOT_QUERY, SchemaConfig};
use crate::connection::ConnectionConfig;
use crate::error::RegistryError;
use crate::registry::{FieldConfig, TypeRefSpec, TypeRegistry, display_name, field_key};
use crate::resolvers::ConnectionResolver;

fn with_common_args(config: ConnectionConfig) -> ConnectionConfig {
    config
        .connection_arg("search", FieldConfig::new("String").description("Show results based on a keyword search"))
        .connection_arg(
            "include",
            FieldConfig::new(TypeRefSpec::named("ID").list_of()).description("Limit result set to specific IDs"),
        )
        .connection_arg("slug", FieldConfig::new("String").description("Limit result set to the item with this slug"))
}

fn post_object_connection(
    from_type: &str,
    post_type: &PostTypeInfo,
    source: &DynContentSource,
    parent: Option<&TaxonomyInfo>,
    config: &SchemaConfig,
) -> ConnectionConfig {
    with_common_args(ConnectionConfig::new(
        from_type,
        display_name(&post_type.graphql_single_name),
        field_key(&post_type.graphql_plural_name),
    ))
    .connection_arg("status", FieldConfig::new("PostStatusEnum").description("Show posts with a specific status"))
    .description(format!("Connection to {} objects", display_name(&post_type.graphql_single_name)))
    .resolve(ConnectionResolver::resolve(
        source.clone(),
        post_type.kind(),
        parent.map(TaxonomyInfo::kind),
        config.clone(),
    ))
}

fn term_object_connection(
    from_type: &str,
    taxonomy: &TaxonomyInfo,
    source: &DynContentSource,
    parent: Option<&PostTypeInfo>,
    config: &SchemaConfig,
) -> ConnectionConfig {
    with_common_args(ConnectionConfig::new(
        from_type,
        display_name(&taxonomy.graphql_single_name),
        field_key(&taxonomy.graphql_plural_name),
    ))
    .connection_arg(
        "hideEmpty",
        FieldConfig::new("Boolean").description("Whether to hide terms not assigned to any posts"),
    )
    .description(format!("Connection to {} terms", display_name(&taxonomy.graphql_single_name)))
    .resolve(ConnectionResolver::resolve(
        source.clone(),
        taxonomy.kind(),
        parent.map(PostTypeInfo::kind),
        config.clone(),
    ))
}

pub(super) fn register(
    registry: &mut TypeRegistry,
    source: &DynContentSource,
    post_types: &[PostTypeInfo],
    taxonomies: &[TaxonomyInfo],
    config: &SchemaConfig,
) -> Result<(), RegistryError> {
    for post_type in post_types {
        registry.register_connection(post_object_connection(ROOT_QUERY, post_type, source, None, config))?;
    }

    for taxonomy in taxonomies {
        registry.register_connection(term_object_connection(ROOT_QUERY, taxonomy, source, None, config))?;

        for post_type in post_types.iter().filter(|pt| pt.taxonomies.contains(&taxonomy.name)) {
            let post_type_name = display_name(&post_type.graphql_single_name);
            let taxonomy_name = display_name(&taxonomy.graphql_single_name);

            registry.register_connection(term_object_connection(
                &post_type_name,
                taxonomy,
                source,
                Some(post_type),
                config,
            ))?;
            registry.register_connection(post_object_connection(
                &taxonomy_name,
                post_type,
                source,
                Some(taxonomy),
                config,
            ))?;
            debug!(post_type = %post_type.name, taxonomy = %taxonomy.name, "Connected post type and taxonomy");
        }
    }
    Ok(())
}
