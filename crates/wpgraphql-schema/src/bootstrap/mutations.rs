//! Content mutations: create / update / delete per post type and taxonomy,
//! and `updateSettings`.

use tracing::debug;
use wpgraphql_content::{DynContentSource, PostTypeInfo, SettingGroup, TaxonomyInfo};

use super::content::setting_type;
use crate::error::RegistryError;
use crate::mutation::MutationConfig;
use crate::registry::{FieldConfig, TypeRefSpec, TypeRegistry, display_name, field_key};
use crate::resolvers::{MutationResolver, SettingsResolver, group_field_name, setting_input_name};

fn id_input() -> FieldConfig {
    FieldConfig::new(TypeRefSpec::named("ID").non_null()).description("The ID of the object")
}

fn deleted_id_output() -> FieldConfig {
    FieldConfig::new("ID").description("The ID of the deleted object")
}

fn post_object_inputs() -> [(String, FieldConfig); 4] {
    [
        ("title".into(), FieldConfig::new("String").description("The title of the object")),
        ("content".into(), FieldConfig::new("String").description("The content of the object")),
        ("slug".into(), FieldConfig::new("String").description("The slug of the object")),
        ("status".into(), FieldConfig::new("PostStatusEnum").description("The status of the object")),
    ]
}

pub(super) fn register_post_object_mutations(
    registry: &mut TypeRegistry,
    source: &DynContentSource,
    post_type: &PostTypeInfo,
) -> Result<(), RegistryError> {
    let type_name = display_name(&post_type.graphql_single_name);
    let payload_field = field_key(&post_type.graphql_single_name);
    let kind = post_type.kind();

    registry.register_mutation(
        &format!("create{type_name}"),
        MutationConfig::new(MutationResolver::create(source.clone(), kind.clone(), payload_field.clone()))
            .description(format!("Create a {type_name} object"))
            .input_fields(post_object_inputs())
            .output_field(&payload_field, FieldConfig::new(type_name.as_str())),
    )?;

    registry.register_mutation(
        &format!("update{type_name}"),
        MutationConfig::new(MutationResolver::update(source.clone(), kind.clone(), payload_field.clone()))
            .description(format!("Update a {type_name} object"))
            .input_field("id", id_input())
            .input_fields(post_object_inputs())
            .output_field(&payload_field, FieldConfig::new(type_name.as_str())),
    )?;

    registry.register_mutation(
        &format!("delete{type_name}"),
        MutationConfig::new(MutationResolver::delete(source.clone(), kind, payload_field.clone()))
            .description(format!("Delete a {type_name} object"))
            .input_field("id", id_input())
            .output_field(&payload_field, FieldConfig::new(type_name.as_str()))
            .output_field("deletedId", deleted_id_output()),
    )
}

pub(super) fn register_term_object_mutations(
    registry: &mut TypeRegistry,
    source: &DynContentSource,
    taxonomy: &TaxonomyInfo,
) -> Result<(), RegistryError> {
    let type_name = display_name(&taxonomy.graphql_single_name);
    let payload_field = field_key(&taxonomy.graphql_single_name);
    let kind = taxonomy.kind();

    let optional_inputs = || {
        [
            ("slug".to_string(), FieldConfig::new("String").description("If this argument exists then the slug will be checked to see if it is not an existing valid term")),
            ("description".to_string(), FieldConfig::new("String").description("The description of the object")),
        ]
    };

    registry.register_mutation(
        &format!("create{type_name}"),
        MutationConfig::new(MutationResolver::create(source.clone(), kind.clone(), payload_field.clone()))
            .description(format!("Create a {type_name} term"))
            .input_field(
                "name",
                FieldConfig::new(TypeRefSpec::named("String").non_null()).description("The name of the term"),
            )
            .input_fields(optional_inputs())
            .output_field(&payload_field, FieldConfig::new(type_name.as_str())),
    )?;

    registry.register_mutation(
        &format!("update{type_name}"),
        MutationConfig::new(MutationResolver::update(source.clone(), kind.clone(), payload_field.clone()))
            .description(format!("Update a {type_name} term"))
            .input_field("id", id_input())
            .input_field("name", FieldConfig::new("String").description("The name of the term"))
            .input_fields(optional_inputs())
            .output_field(&payload_field, FieldConfig::new(type_name.as_str())),
    )?;

    registry.register_mutation(
        &format!("delete{type_name}"),
        MutationConfig::new(MutationResolver::delete(source.clone(), kind, payload_field.clone()))
            .description(format!("Delete a {type_name} term"))
            .input_field("id", id_input())
            .output_field(&payload_field, FieldConfig::new(type_name.as_str()))
            .output_field("deletedId", deleted_id_output()),
    )
}

/// Registers `updateSettings` over every setting group, if there are any.
pub(super) fn register_update_settings(
    registry: &mut TypeRegistry,
    source: &DynContentSource,
    groups: &[SettingGroup],
) -> Result<(), RegistryError> {
    if groups.is_empty() {
        return Ok(());
    }

    let mut config = MutationConfig::new(SettingsResolver::update(source.clone(), groups.to_vec()))
        .description("Updates the values of one or more settings");
    for group in groups {
        for setting in &group.settings {
            let mut field = FieldConfig::new(setting_type(setting.kind));
            if let Some(description) = &setting.description {
                field = field.description(description.clone());
            }
            config = config.input_field(setting_input_name(&group.name, &setting.name), field);
        }
        let group_field = group_field_name(&group.name);
        let group_type = display_name(&group_field);
        config = config.output_field(
            group_field,
            FieldConfig::new(group_type.as_str()).description(format!("Updated {group_type} values")),
        );
    }

    debug!(groups = groups.len(), "Registering updateSettings mutation");
    registry.register_mutation("updateSettings", config)
}
