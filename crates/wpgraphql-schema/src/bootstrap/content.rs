//! Types derived from the content host: setting groups, post types, taxonomies
//! and the unions over them.

use async_graphql::Value;
use indexmap::IndexMap;
use tracing::debug;
use wpgraphql_content::{DynContentSource, PostTypeInfo, SettingGroup, SettingKind, TaxonomyInfo};

use super::mutations;
use crate::config::ROOT_QUERY;
use crate::error::RegistryError;
use crate::registry::{FieldConfig, ObjectConfig, TypeRefSpec, TypeRegistry, UnionConfig, display_name};
use crate::resolvers::{NodeResolver, SettingsResolver, camel_case, group_field_name};

/// Post types that never get create / update / delete mutations.
const NO_MUTATIONS: [&str; 1] = ["attachment"];

pub(super) fn setting_type(kind: SettingKind) -> &'static str {
    match kind {
        SettingKind::String => "String",
        SettingKind::Integer => "Int",
        SettingKind::Number => "Float",
        SettingKind::Boolean => "Boolean",
    }
}

pub(super) fn register_setting_groups(
    registry: &mut TypeRegistry,
    source: &DynContentSource,
    groups: &[SettingGroup],
) -> Result<(), RegistryError> {
    for group in groups {
        let field_name = group_field_name(&group.name);
        let type_name = display_name(&field_name);

        let fields = group.settings.iter().map(|setting| {
            let mut field = FieldConfig::new(setting_type(setting.kind));
            if let Some(description) = &setting.description {
                field = field.description(description.clone());
            }
            (camel_case(&setting.name), field)
        });
        registry.register_object_type(
            &type_name,
            ObjectConfig::new()
                .description(format!("The {} setting type", group.name))
                .fields(fields),
        )?;

        registry.register_field(
            ROOT_QUERY,
            &field_name,
            FieldConfig::new(type_name.as_str())
                .description(format!("Fields of the '{type_name}' settings group"))
                .resolve(SettingsResolver::query(source.clone(), group.clone())),
        )?;
        debug!(group = %group.name, settings = group.settings.len(), "Registered setting group");
    }
    Ok(())
}

pub(super) fn register_post_types(
    registry: &mut TypeRegistry,
    source: &DynContentSource,
    post_types: &[PostTypeInfo],
) -> Result<(), RegistryError> {
    for post_type in post_types {
        let type_name = display_name(&post_type.graphql_single_name);
        let label = post_type.label.as_deref().unwrap_or(&post_type.name);

        registry.register_object_type(
            &type_name,
            ObjectConfig::new()
                .description(format!("The {label} object type"))
                .field("id", FieldConfig::new(TypeRefSpec::named("ID").non_null()).description("The globally unique identifier of the object."))
                .field("databaseId", FieldConfig::new("Int").description("The id field matches the host's database ID."))
                .field("title", FieldConfig::new("String").description("The title of the object."))
                .field("content", FieldConfig::new("String").description("The content of the object."))
                .field("slug", FieldConfig::new("String").description("The uri slug for the object."))
                .field("status", FieldConfig::new("PostStatusEnum").description("The current status of the object."))
                .field("date", FieldConfig::new("String").description("Post publishing date."))
                .field("modified", FieldConfig::new("String").description("The local modified time for a post."))
                .field("postType", FieldConfig::new("String").description("The name of the post type the object belongs to."))
                .field("author", FieldConfig::new("User").description("The author of the object, as stored on the item.")),
        )?;

        if NO_MUTATIONS.contains(&post_type.name.as_str()) {
            debug!(post_type = %post_type.name, "Registered post type without mutations");
            continue;
        }
        mutations::register_post_object_mutations(registry, source, post_type)?;
        debug!(post_type = %post_type.name, type_name = %type_name, "Registered post type");
    }
    Ok(())
}

pub(super) fn register_taxonomies(
    registry: &mut TypeRegistry,
    source: &DynContentSource,
    taxonomies: &[TaxonomyInfo],
) -> Result<(), RegistryError> {
    for taxonomy in taxonomies {
        let type_name = display_name(&taxonomy.graphql_single_name);
        let label = taxonomy.label.as_deref().unwrap_or(&taxonomy.name);

        registry.register_object_type(
            &type_name,
            ObjectConfig::new()
                .description(format!("The {label} term object type"))
                .field("id", FieldConfig::new(TypeRefSpec::named("ID").non_null()).description("The globally unique identifier of the term."))
                .field("databaseId", FieldConfig::new("Int").description("The id field matches the host's database ID."))
                .field("name", FieldConfig::new("String").description("The human friendly name of the object."))
                .field("slug", FieldConfig::new("String").description("An alphanumeric identifier for the object unique to its type."))
                .field("description", FieldConfig::new("String").description("The description of the object"))
                .field("count", FieldConfig::new("Int").description("The number of objects connected to the object"))
                .field("taxonomy", FieldConfig::new("String").description("The name of the taxonomy the object belongs to")),
        )?;

        mutations::register_term_object_mutations(registry, source, taxonomy)?;
        debug!(taxonomy = %taxonomy.name, type_name = %type_name, "Registered taxonomy");
    }
    Ok(())
}

/// Resolves union members from a discriminator key (`postType`, `taxonomy`)
/// holding the host-side name.
fn discriminated_by(
    key: &'static str,
    members: IndexMap<String, String>,
) -> impl Fn(&Value) -> Option<String> + Send + Sync + 'static {
    move |value| match value {
        Value::Object(map) => match map.get(key) {
            Some(Value::String(name)) => members.get(name).cloned(),
            _ => None,
        },
        _ => None,
    }
}

pub(super) fn register_unions(
    registry: &mut TypeRegistry,
    source: &DynContentSource,
    post_types: &[PostTypeInfo],
    taxonomies: &[TaxonomyInfo],
) -> Result<(), RegistryError> {
    if !post_types.is_empty() {
        let members: IndexMap<String, String> = post_types
            .iter()
            .map(|post_type| (post_type.name.clone(), display_name(&post_type.graphql_single_name)))
            .collect();
        registry.register_union_type(
            "PostObjectUnion",
            UnionConfig::new(members.values().cloned().collect::<Vec<_>>())
                .description("Union between the post types exposed in the graph")
                .resolve_type(discriminated_by("postType", members)),
        )?;
        registry.register_field(
            ROOT_QUERY,
            "contentNode",
            FieldConfig::new("PostObjectUnion")
                .description("A node of any exposed post type, by ID")
                .arg("id", FieldConfig::new(TypeRefSpec::named("ID").non_null()))
                .resolve(NodeResolver::resolve(
                    source.clone(),
                    post_types.iter().map(PostTypeInfo::kind).collect(),
                )),
        )?;
    }

    if !taxonomies.is_empty() {
        let members: IndexMap<String, String> = taxonomies
            .iter()
            .map(|taxonomy| (taxonomy.name.clone(), display_name(&taxonomy.graphql_single_name)))
            .collect();
        registry.register_union_type(
            "TermObjectUnion",
            UnionConfig::new(members.values().cloned().collect::<Vec<_>>())
                .description("Union between the taxonomies exposed in the graph")
                .resolve_type(discriminated_by("taxonomy", members)),
        )?;
        registry.register_field(
            ROOT_QUERY,
            "termNode",
            FieldConfig::new("TermObjectUnion")
                .description("A term of any exposed taxonomy, by ID")
                .arg("id", FieldConfig::new(TypeRefSpec::named("ID").non_null()))
                .resolve(NodeResolver::resolve(
                    source.clone(),
                    taxonomies.iter().map(TaxonomyInfo::kind).collect(),
                )),
        )?;
    }
    Ok(())
}
