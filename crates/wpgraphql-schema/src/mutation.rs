//! Mutation synthesis.
//!
//! `register_mutation("createWidget", ..)` registers `CreateWidgetInput`,
//! `CreateWidgetPayload` and `RootMutation.createWidget(input:
//! CreateWidgetInput!)`. Both generated types always carry a non-null
//! `clientMutationId`, merged after the caller's fields so it cannot be
//! shadowed, and the value sent in the input is echoed in the payload.

use std::fmt;
use std::sync::Arc;

use async_graphql::{Context, Name, Value};
use indexmap::IndexMap;
use tracing::debug;

use crate::config::ROOT_MUTATION;
use crate::error::RegistryError;
use crate::registry::{
    Arguments, FieldConfig, InputConfig, ObjectConfig, ResolveFuture, TypeRefSpec, TypeRegistry,
};

/// Field name of the correlation token.
pub const CLIENT_MUTATION_ID: &str = "clientMutationId";

/// Performs a mutation: receives the input object and returns the payload.
///
/// A `None` or `null` payload is treated as an empty object.
pub type MutateAndGetPayload =
    Arc<dyn for<'a> Fn(Arguments, &'a Context<'a>) -> ResolveFuture<'a> + Send + Sync>;

/// Describes a mutation.
#[derive(Clone)]
pub struct MutationConfig {
    /// Fields of the generated input type.
    pub input_fields: IndexMap<String, FieldConfig>,
    /// Fields of the generated payload type.
    pub output_fields: IndexMap<String, FieldConfig>,
    /// The mutation itself.
    pub mutate_and_get_payload: MutateAndGetPayload,
    /// Description of the mutation field.
    pub description: Option<String>,
}

impl MutationConfig {
    /// Creates a mutation descriptor around its resolver.
    #[must_use]
    pub fn new<F>(mutate_and_get_payload: F) -> Self
    where
        F: for<'a> Fn(Arguments, &'a Context<'a>) -> ResolveFuture<'a> + Send + Sync + 'static,
    {
        Self {
            input_fields: IndexMap::new(),
            output_fields: IndexMap::new(),
            mutate_and_get_payload: Arc::new(mutate_and_get_payload),
            description: None,
        }
    }

    /// Adds an input field.
    #[must_use]
    pub fn input_field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.input_fields.insert(name.into(), config);
        self
    }

    /// Adds several input fields.
    #[must_use]
    pub fn input_fields(mut self, fields: impl IntoIterator<Item = (String, FieldConfig)>) -> Self {
        self.input_fields.extend(fields);
        self
    }

    /// Adds a payload field.
    #[must_use]
    pub fn output_field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.output_fields.insert(name.into(), config);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for MutationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationConfig")
            .field("input_fields", &self.input_fields)
            .field("output_fields", &self.output_fields)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

fn client_mutation_id_field() -> FieldConfig {
    FieldConfig::new(TypeRefSpec::named("String").non_null())
        .description("A unique identifier for the client performing the mutation.")
}

impl TypeRegistry {
    /// Registers a mutation on the root mutation type.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::MissingFieldType` if an input or output field
    /// has no type.
    pub fn register_mutation(&mut self, name: &str, config: MutationConfig) -> Result<(), RegistryError> {
        let payload_type = format!("{name}Payload");
        let input_type = format!("{name}Input");

        let mut output_fields = config.output_fields;
        output_fields.insert(CLIENT_MUTATION_ID.to_string(), client_mutation_id_field());
        self.register_object_type(
            &payload_type,
            ObjectConfig {
                description: Some(format!("The payload for the {name} mutation")),
                fields: output_fields,
            },
        )?;

        let mut input_fields = config.input_fields;
        input_fields.insert(CLIENT_MUTATION_ID.to_string(), client_mutation_id_field());
        self.register_input_type(
            &input_type,
            InputConfig {
                description: Some(format!("Input for the {name} mutation")),
                fields: input_fields,
            },
        )?;

        let mutate = config.mutate_and_get_payload;
        let mutation_name = name.to_string();
        let mut field = FieldConfig::new(payload_type.as_str())
            .arg(
                "input",
                FieldConfig::new(TypeRefSpec::named(input_type.as_str()).non_null())
                    .description("Input for the mutation"),
            )
            .resolve(move |params| {
                let mutate = Arc::clone(&mutate);
                let mutation_name = mutation_name.clone();
                ResolveFuture::new(async move {
                    let input = match params.args.get("input") {
                        Some(Value::Object(input)) => input.clone(),
                        _ => IndexMap::new(),
                    };
                    let client_mutation_id = input.get(CLIENT_MUTATION_ID).cloned().unwrap_or(Value::Null);

                    let mut payload = match mutate(input, params.ctx).await? {
                        None | Some(Value::Null) => IndexMap::new(),
                        Some(Value::Object(payload)) => payload,
                        Some(_) => {
                            return Err(async_graphql::Error::new(format!(
                                "Mutation `{mutation_name}` returned a non-object payload"
                            )));
                        }
                    };
                    payload.insert(Name::new(CLIENT_MUTATION_ID), client_mutation_id);
                    Ok(Some(Value::Object(payload)))
                })
            });
        if let Some(description) = config.description {
            field = field.description(description);
        }

        debug!(mutation = %name, "Registered mutation");
        self.register_field(ROOT_MUTATION, name, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{BuiltinScalar, ScalarConfig};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register_scalar("String", ScalarConfig::alias(BuiltinScalar::String))
            .unwrap();
        registry
            .register_scalar("Int", ScalarConfig::alias(BuiltinScalar::Int))
            .unwrap();
        registry
            .register_object_type(ROOT_MUTATION, ObjectConfig::new())
            .unwrap();
        registry
    }

    #[test]
    fn test_generated_types() {
        let mut registry = registry();
        registry
            .register_mutation(
                "createWidget",
                MutationConfig::new(|_, _| ResolveFuture::ready(Ok(None)))
                    .input_field("title", FieldConfig::new("String"))
                    .output_field("id", FieldConfig::new("Int")),
            )
            .unwrap();

        let input = registry.fields("CreateWidgetInput").unwrap();
        assert_eq!(input.keys().collect::<Vec<_>>(), vec!["title", "clientMutationId"]);
        assert_eq!(input["clientMutationId"].ty.to_string(), "String!");

        let payload = registry.fields("createWidgetPayload").unwrap();
        assert_eq!(payload.keys().collect::<Vec<_>>(), vec!["id", "clientMutationId"]);

        let field = &registry.fields(ROOT_MUTATION).unwrap()["createWidget"];
        assert_eq!(field.ty.to_string(), "CreateWidgetPayload");
        assert_eq!(field.args["input"].ty.to_string(), "CreateWidgetInput!");
    }

    #[test]
    fn test_client_mutation_id_cannot_be_shadowed() {
        let mut registry = registry();
        registry
            .register_mutation(
                "createWidget",
                MutationConfig::new(|_, _| ResolveFuture::ready(Ok(None)))
                    .input_field("clientMutationId", FieldConfig::new("Int"))
                    .output_field("clientMutationId", FieldConfig::new("Int")),
            )
            .unwrap();

        assert_eq!(
            registry.fields("CreateWidgetInput").unwrap()["clientMutationId"].ty.to_string(),
            "String!"
        );
        assert_eq!(
            registry.fields("CreateWidgetPayload").unwrap()["clientMutationId"].ty.to_string(),
            "String!"
        );
    }
}
