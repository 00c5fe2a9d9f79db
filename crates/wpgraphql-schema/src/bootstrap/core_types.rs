//! Scalars and the static core types.

use async_graphql::{Name, Value};
use serde_json::json;
use wpgraphql_content::DynContentSource;

use crate::config::{ROOT_MUTATION, ROOT_QUERY};
use crate::connection::PAGE_INFO_TYPE;
use crate::error::RegistryError;
use crate::registry::{
    BuiltinScalar, EnumConfig, EnumValueConfig, FieldConfig, ObjectConfig, ResolveFuture,
    ScalarConfig, TypeRefSpec, TypeRegistry,
};
use crate::resolvers::json_to_graphql_value;

/// Every scalar name the registry understands, with the builtin it aliases.
const SCALARS: [(&str, BuiltinScalar); 8] = [
    ("Bool", BuiltinScalar::Boolean),
    ("Boolean", BuiltinScalar::Boolean),
    ("Float", BuiltinScalar::Float),
    ("Number", BuiltinScalar::Float),
    ("Id", BuiltinScalar::Id),
    ("Int", BuiltinScalar::Int),
    ("Integer", BuiltinScalar::Int),
    ("String", BuiltinScalar::String),
];

pub(super) fn register_scalars(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    for (name, builtin) in SCALARS {
        registry.register_scalar(name, ScalarConfig::alias(builtin))?;
    }
    Ok(())
}

fn enum_of(description: &str, values: &[(&str, &str)]) -> EnumConfig {
    values
        .iter()
        .fold(EnumConfig::new().description(description), |config, (name, value)| {
            config.value(*name, EnumValueConfig::new(*value))
        })
}

pub(super) fn register(registry: &mut TypeRegistry, source: &DynContentSource) -> Result<(), RegistryError> {
    registry.register_object_type(
        PAGE_INFO_TYPE,
        ObjectConfig::new()
            .description("Information about pagination in a connection.")
            .field(
                "hasNextPage",
                FieldConfig::new(TypeRefSpec::named("Boolean").non_null())
                    .description("When paginating forwards, are there more items?"),
            )
            .field(
                "hasPreviousPage",
                FieldConfig::new(TypeRefSpec::named("Boolean").non_null())
                    .description("When paginating backwards, are there more items?"),
            )
            .field(
                "startCursor",
                FieldConfig::new("String").description("When paginating backwards, the cursor to continue."),
            )
            .field(
                "endCursor",
                FieldConfig::new("String").description("When paginating forwards, the cursor to continue."),
            ),
    )?;

    registry.register_enum_type(
        "AvatarRating",
        enum_of(
            "What rating to display avatars up to. Accepts 'G', 'PG', 'R', 'X', and are judged in that order.",
            &[("G", "G"), ("PG", "PG"), ("R", "R"), ("X", "X")],
        ),
    )?;

    registry.register_object_type(
        "Avatar",
        ObjectConfig::new()
            .description("Avatars are profile images for users.")
            .field("size", FieldConfig::new("Int").description("The size of the avatar in pixels."))
            .field("height", FieldConfig::new("Int").description("Height of the avatar image."))
            .field("width", FieldConfig::new("Int").description("Width of the avatar image."))
            .field("default", FieldConfig::new("String").description("URL for the default image or a default type."))
            .field("forceDefault", FieldConfig::new("Boolean").description("Whether to always show the default image."))
            .field("rating", FieldConfig::new("AvatarRating").description("What rating to display avatars up to."))
            .field("foundAvatar", FieldConfig::new("Boolean").description("Whether the avatar was successfully found."))
            .field("url", FieldConfig::new("String").description("URL for the gravatar image source.")),
    )?;

    registry.register_enum_type(
        "PostStatusEnum",
        enum_of(
            "The status of the object.",
            &[
                ("PUBLISH", "publish"),
                ("FUTURE", "future"),
                ("DRAFT", "draft"),
                ("PENDING", "pending"),
                ("PRIVATE", "private"),
                ("TRASH", "trash"),
                ("AUTO_DRAFT", "auto-draft"),
                ("INHERIT", "inherit"),
            ],
        ),
    )?;
    registry.register_enum_type(
        "OrderEnum",
        enum_of("The cardinality of the connection order", &[("ASC", "ASC"), ("DESC", "DESC")]),
    )?;
    registry.register_enum_type(
        "RelationEnum",
        enum_of("The logical relation between each item in the array", &[("AND", "AND"), ("OR", "OR")]),
    )?;

    registry.register_object_type(
        "PostType",
        ObjectConfig::new()
            .description("An Post Type object")
            .field("name", FieldConfig::new("String").description("The internal name of the post type."))
            .field("label", FieldConfig::new("String").description("Display name of the content type."))
            .field("graphqlSingleName", FieldConfig::new("String").description("The singular name of the post type within the GraphQL Schema."))
            .field("graphqlPluralName", FieldConfig::new("String").description("The plural name of the post type within the GraphQL Schema."))
            .field("hierarchical", FieldConfig::new("Boolean").description("Whether the post type is hierarchical."))
            .field(
                "connectedTaxonomyNames",
                FieldConfig::new(TypeRefSpec::named("String").list_of())
                    .description("A list of Taxonomies associated with the post type"),
            ),
    )?;

    registry.register_object_type(
        "Taxonomy",
        ObjectConfig::new()
            .description("A taxonomy object")
            .field("name", FieldConfig::new("String").description("The internal name of the taxonomy."))
            .field("label", FieldConfig::new("String").description("Name of the taxonomy shown in the menu."))
            .field("graphqlSingleName", FieldConfig::new("String").description("The singular name of the taxonomy within the GraphQL Schema."))
            .field("graphqlPluralName", FieldConfig::new("String").description("The plural name of the taxonomy within the GraphQL Schema."))
            .field("hierarchical", FieldConfig::new("Boolean").description("Whether the taxonomy is hierarchical."))
            .field(
                "connectedPostTypeNames",
                FieldConfig::new(TypeRefSpec::named("String").list_of())
                    .description("A list of Post Types associated with the taxonomy"),
            ),
    )?;

    registry.register_object_type(
        "User",
        ObjectConfig::new()
            .description("A User object")
            .field("id", FieldConfig::new(TypeRefSpec::named("ID").non_null()))
            .field("name", FieldConfig::new("String").description("Display name of the user."))
            .field("slug", FieldConfig::new("String").description("The slug for the user."))
            .field(
                "avatar",
                FieldConfig::new("Avatar")
                    .description("Avatar object for user.")
                    .arg("size", FieldConfig::new("Int").default_value(96))
                    .arg("forceDefault", FieldConfig::new("Boolean"))
                    .arg("rating", FieldConfig::new("AvatarRating"))
                    .resolve(|params| {
                        let avatar = match params.source_field("avatar") {
                            Some(Value::Object(avatar)) => {
                                let mut avatar = avatar.clone();
                                for arg in ["size", "forceDefault", "rating"] {
                                    if let Some(value) = params.arg(arg) {
                                        avatar.insert(Name::new(arg), value.clone());
                                    }
                                }
                                Some(Value::Object(avatar))
                            }
                            _ => None,
                        };
                        ResolveFuture::ready(Ok(avatar))
                    }),
            ),
    )?;

    let post_types_source = source.clone();
    let taxonomies_source = source.clone();
    registry.register_object_type(
        ROOT_QUERY,
        ObjectConfig::new()
            .description("The root entry point into the Graph")
            .field(
                "postTypes",
                FieldConfig::new(TypeRefSpec::named("PostType").list_of())
                    .description("Post types exposed in the graph")
                    .resolve(move |_params| {
                        let post_types = post_types_source
                            .post_types()
                            .into_iter()
                            .map(|post_type| {
                                json_to_graphql_value(json!({
                                    "name": post_type.name,
                                    "label": post_type.label,
                                    "graphqlSingleName": post_type.graphql_single_name,
                                    "graphqlPluralName": post_type.graphql_plural_name,
                                    "hierarchical": post_type.hierarchical,
                                    "connectedTaxonomyNames": post_type.taxonomies,
                                }))
                            })
                            .collect();
                        ResolveFuture::ready(Ok(Some(Value::List(post_types))))
                    }),
            )
            .field(
                "taxonomies",
                FieldConfig::new(TypeRefSpec::named("Taxonomy").list_of())
                    .description("Taxonomies exposed in the graph")
                    .resolve(move |_params| {
                        let post_types = taxonomies_source.post_types();
                        let taxonomies = taxonomies_source
                            .taxonomies()
                            .into_iter()
                            .map(|taxonomy| {
                                let connected: Vec<&str> = post_types
                                    .iter()
                                    .filter(|post_type| post_type.taxonomies.contains(&taxonomy.name))
                                    .map(|post_type| post_type.name.as_str())
                                    .collect();
                                json_to_graphql_value(json!({
                                    "name": taxonomy.name,
                                    "label": taxonomy.label,
                                    "graphqlSingleName": taxonomy.graphql_single_name,
                                    "graphqlPluralName": taxonomy.graphql_plural_name,
                                    "hierarchical": taxonomy.hierarchical,
                                    "connectedPostTypeNames": connected,
                                }))
                            })
                            .collect();
                        ResolveFuture::ready(Ok(Some(Value::List(taxonomies))))
                    }),
            ),
    )?;

    registry.register_object_type(
        ROOT_MUTATION,
        ObjectConfig::new().description("The root mutation"),
    )
}
