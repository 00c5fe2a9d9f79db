//! Executable schema assembly.
//!
//! [`FrozenRegistry::build_schema`] turns every surviving registered type into
//! its `async_graphql::dynamic` counterpart. A type survives when it can be
//! expressed: objects and inputs need at least one field, unions at least one
//! object member, enums at least one value. Skipping a type can empty another
//! one, so survival is computed to a fixed point before anything is built.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Object, Scalar,
    Schema, Union,
};
use async_graphql::{Name, Value};
use indexmap::IndexMap;
use tracing::{debug, info, trace};

use crate::config::{ROOT_MUTATION, ROOT_QUERY, SchemaConfig};
use crate::error::RegistryError;
use crate::registry::{
    Arguments, FrozenRegistry, PreparedField, RegisteredType, ResolveParams, Resolver, TypeKind,
    TypeRefSpec, TypeResolver, type_key,
};

/// Builtin scalar names; these are never registered with the schema.
const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// Value mapping of an enum type.
struct EnumIndex {
    /// `(exposed name, internal value)` pairs in declaration order.
    values: Vec<(String, Value)>,
}

impl EnumIndex {
    fn internal_value(&self, name: &str) -> Option<Value> {
        self.values
            .iter()
            .find(|(value_name, _)| value_name == name)
            .map(|(_, value)| value.clone())
    }

    /// The exposed name of an internal value. A value that already is an
    /// exposed name is accepted as well.
    fn exposed_name(&self, value: &Value) -> Option<&str> {
        if let Some((name, _)) = self.values.iter().find(|(_, internal)| internal == value) {
            return Some(name);
        }
        let candidate = match value {
            Value::Enum(name) => name.as_str(),
            Value::String(name) => name.as_str(),
            _ => return None,
        };
        self.values
            .iter()
            .find(|(name, _)| name == candidate)
            .map(|(name, _)| name.as_str())
    }
}

/// Member lookup of a union type.
struct UnionIndex {
    /// Surviving members, keyed by normalized name.
    members: HashMap<String, String>,
    resolve_type: Option<TypeResolver>,
}

impl UnionIndex {
    fn member_for(&self, value: &Value) -> Option<&str> {
        let picked = self
            .resolve_type
            .as_ref()
            .and_then(|resolve| resolve(value))
            .or_else(|| match value {
                Value::Object(map) => match map.get("__typename") {
                    Some(Value::String(name)) => Some(name.clone()),
                    _ => None,
                },
                _ => None,
            })?;
        self.members.get(&type_key(&picked)).map(String::as_str)
    }
}

/// Lookup tables shared by every field resolver of a schema.
#[derive(Default)]
struct SchemaIndex {
    enums: HashMap<String, EnumIndex>,
    unions: HashMap<String, UnionIndex>,
    /// Field types of input objects, for mapping nested enum values.
    inputs: HashMap<String, IndexMap<String, TypeRefSpec>>,
}

impl SchemaIndex {
    /// Maps enum names in an argument value to internal values.
    fn map_input(&self, ty: &TypeRefSpec, value: Value) -> Value {
        match (ty, value) {
            (_, Value::Null) => Value::Null,
            (TypeRefSpec::NonNull(inner), value) => self.map_input(inner, value),
            (TypeRefSpec::ListOf(inner), Value::List(items)) => {
                Value::List(items.into_iter().map(|item| self.map_input(inner, item)).collect())
            }
            (TypeRefSpec::ListOf(inner), value) => self.map_input(inner, value),
            (TypeRefSpec::Named(name), value) => {
                if let Some(index) = self.enums.get(name) {
                    let internal = match &value {
                        Value::Enum(item) => index.internal_value(item.as_str()),
                        Value::String(item) => index.internal_value(item),
                        _ => None,
                    };
                    return internal.unwrap_or(value);
                }
                match (self.inputs.get(name), value) {
                    (Some(fields), Value::Object(map)) => Value::Object(
                        map.into_iter()
                            .map(|(key, value)| {
                                let mapped = match fields.get(key.as_str()) {
                                    Some(field_ty) => self.map_input(field_ty, value),
                                    None => value,
                                };
                                (key, mapped)
                            })
                            .collect(),
                    ),
                    (_, value) => value,
                }
            }
        }
    }

    /// Wraps a resolved value for the engine, mapping enum values to names and
    /// tagging union members.
    fn to_field_value(&self, ty: &TypeRefSpec, value: Value) -> async_graphql::Result<FieldValue<'static>> {
        match ty {
            TypeRefSpec::NonNull(inner) => self.to_field_value(inner, value),
            TypeRefSpec::ListOf(inner) => match value {
                Value::List(items) => {
                    let items = items
                        .into_iter()
                        .map(|item| match item {
                            Value::Null => Ok(FieldValue::value(Value::Null)),
                            item => self.to_field_value(inner, item),
                        })
                        .collect::<async_graphql::Result<Vec<_>>>()?;
                    Ok(FieldValue::list(items))
                }
                other => Err(async_graphql::Error::new(format!(
                    "Expected a list for `{ty}`, got `{other}`"
                ))),
            },
            TypeRefSpec::Named(name) => {
                if let Some(index) = self.enums.get(name) {
                    let exposed = index.exposed_name(&value).ok_or_else(|| {
                        async_graphql::Error::new(format!("`{value}` is not a value of enum `{name}`"))
                    })?;
                    return Ok(FieldValue::value(Value::Enum(Name::new(exposed))));
                }
                if let Some(index) = self.unions.get(name) {
                    let member = index.member_for(&value).ok_or_else(|| {
                        async_graphql::Error::new(format!("Cannot resolve member type of union `{name}`"))
                    })?;
                    let member = member.to_string();
                    return Ok(FieldValue::value(value).with_type(member));
                }
                Ok(FieldValue::value(value))
            }
        }
    }
}

/// What a field resolver needs at execution time.
struct FieldPlan {
    name: String,
    ty: TypeRefSpec,
    arg_types: IndexMap<String, TypeRefSpec>,
    resolve: Option<Resolver>,
}

fn build_field(field: &PreparedField, arg_types: IndexMap<String, TypeRefSpec>, index: &Arc<SchemaIndex>) -> Field {
    let plan = Arc::new(FieldPlan {
        name: field.name.clone(),
        ty: field.ty.clone(),
        arg_types,
        resolve: field.resolve.clone(),
    });
    let index = Arc::clone(index);

    let mut built = Field::new(field.name.clone(), field.ty.to_type_ref(), move |ctx| {
        let plan = Arc::clone(&plan);
        let index = Arc::clone(&index);
        FieldFuture::new(async move {
            let mut args = Arguments::new();
            for (name, value) in ctx.args.iter() {
                let value = value.as_value().clone();
                let value = match plan.arg_types.get(name.as_str()) {
                    Some(ty) => index.map_input(ty, value),
                    None => value,
                };
                args.insert(name.clone(), value);
            }

            let source = ctx.parent_value.as_value();
            let resolved = match &plan.resolve {
                Some(resolve) => resolve(ResolveParams::new(source, args, ctx.ctx)).await?,
                None => match source {
                    Some(Value::Object(map)) => map.get(plan.name.as_str()).cloned(),
                    _ => None,
                },
            };

            let value: Option<FieldValue<'static>> = match resolved {
                None | Some(Value::Null) => None,
                Some(value) => Some(index.to_field_value(&plan.ty, value)?),
            };
            Ok(value)
        })
    });

    if let Some(description) = &field.description {
        built = built.description(description.clone());
    }
    if let Some(reason) = &field.deprecation_reason {
        built = built.deprecation(Some(reason.as_str()));
    }
    built
}

fn build_input_value(field: &PreparedField) -> InputValue {
    let mut value = InputValue::new(field.name.clone(), field.ty.to_type_ref());
    if let Some(description) = &field.description {
        value = value.description(description.clone());
    }
    if let Some(default) = &field.default_value {
        value = value.default_value(default.clone());
    }
    value
}

/// Decides which types make it into the schema.
struct Survivors<'r> {
    /// Distinct types by schema name, first registration wins.
    types: IndexMap<&'r str, &'r RegisteredType>,
    alive: HashSet<&'r str>,
}

impl<'r> Survivors<'r> {
    fn compute(registry: &'r FrozenRegistry) -> Self {
        let mut types: IndexMap<&str, &RegisteredType> = IndexMap::new();
        for ty in registry.get_types().values() {
            types.entry(ty.name()).or_insert(ty);
        }
        let mut survivors = Self {
            alive: types.keys().copied().collect(),
            types,
        };

        loop {
            let dead: Vec<&str> = survivors
                .types
                .iter()
                .filter(|(name, ty)| survivors.alive.contains(*name) && !survivors.expressible(ty))
                .map(|(name, _)| *name)
                .collect();
            if dead.is_empty() {
                break;
            }
            for name in dead {
                debug!(type_name = %name, "Skipping type with nothing left to expose");
                survivors.alive.remove(name);
            }
        }
        survivors
    }

    fn kind_of(&self, name: &str) -> Option<TypeKind> {
        if !self.alive.contains(name) {
            return None;
        }
        self.types.get(name).map(|ty| ty.kind())
    }

    fn output_ok(&self, ty: &TypeRefSpec) -> bool {
        matches!(
            self.kind_of(ty.base_name()),
            Some(TypeKind::Object | TypeKind::Union | TypeKind::Enum | TypeKind::Scalar)
        )
    }

    fn input_ok(&self, ty: &TypeRefSpec) -> bool {
        matches!(
            self.kind_of(ty.base_name()),
            Some(TypeKind::Input | TypeKind::Enum | TypeKind::Scalar)
        )
    }

    fn union_members(&self, registry: &'r FrozenRegistry, ty: &RegisteredType) -> Vec<&'r str> {
        ty.union_members()
            .iter()
            .filter_map(|member| registry.get_type(member))
            .map(RegisteredType::name)
            .filter(|name| self.kind_of(name) == Some(TypeKind::Object))
            .collect()
    }

    fn expressible(&self, ty: &RegisteredType) -> bool {
        match ty.kind() {
            TypeKind::Object => ty
                .fields()
                .is_some_and(|fields| fields.values().any(|f| self.output_ok(&f.ty))),
            TypeKind::Input => ty
                .fields()
                .is_some_and(|fields| fields.values().any(|f| self.input_ok(&f.ty))),
            TypeKind::Union => ty.union_members().iter().any(|member| {
                self.types
                    .values()
                    .find(|candidate| type_key(candidate.name()) == type_key(member))
                    .is_some_and(|candidate| self.kind_of(candidate.name()) == Some(TypeKind::Object))
            }),
            TypeKind::Enum => ty.enum_values().is_some_and(|values| !values.is_empty()),
            TypeKind::Scalar => true,
        }
    }

    fn is_alive(&self, name: &str) -> bool {
        self.alive.contains(name)
    }
}

impl FrozenRegistry {
    /// Assembles the executable schema.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::SchemaBuild` if the root query type has no
    /// fields or the engine rejects the assembled schema.
    pub fn build_schema(&self, config: &SchemaConfig) -> Result<Schema, RegistryError> {
        debug!("Starting GraphQL schema build");

        let survivors = Survivors::compute(self);
        if !survivors.is_alive(ROOT_QUERY) {
            return Err(RegistryError::SchemaBuild(format!(
                "root type `{ROOT_QUERY}` is missing or has no fields"
            )));
        }
        let mutation = survivors.is_alive(ROOT_MUTATION).then_some(ROOT_MUTATION);

        let index = Arc::new(self.schema_index(&survivors));
        let mut builder = Schema::build(ROOT_QUERY, mutation, None);
        let mut registered = 0usize;

        for (name, ty) in &survivors.types {
            if !survivors.is_alive(name) {
                continue;
            }
            builder = match ty.kind() {
                TypeKind::Scalar => {
                    if ty.builtin().is_some() || BUILTIN_SCALARS.contains(name) {
                        continue;
                    }
                    let mut scalar = Scalar::new(*name);
                    if let Some(description) = ty.description() {
                        scalar = scalar.description(description);
                    }
                    builder.register(scalar)
                }
                TypeKind::Enum => {
                    let mut built = Enum::new(*name);
                    for (value_name, value) in ty.enum_values().into_iter().flatten() {
                        let mut item = EnumItem::new(value_name.clone());
                        if let Some(description) = &value.description {
                            item = item.description(description.clone());
                        }
                        if let Some(reason) = &value.deprecation_reason {
                            item = item.deprecation(Some(reason.as_str()));
                        }
                        built = built.item(item);
                    }
                    if let Some(description) = ty.description() {
                        built = built.description(description);
                    }
                    builder.register(built)
                }
                TypeKind::Union => {
                    let mut built = Union::new(*name);
                    for member in survivors.union_members(self, ty) {
                        built = built.possible_type(member);
                    }
                    if let Some(description) = ty.description() {
                        built = built.description(description);
                    }
                    builder.register(built)
                }
                TypeKind::Object => {
                    let mut object = Object::new(*name);
                    for field in ty.fields().into_iter().flat_map(IndexMap::values) {
                        if !survivors.output_ok(&field.ty) {
                            trace!(type_name = %name, field = %field.name, "Dropping field of skipped type");
                            continue;
                        }
                        let args: Vec<&PreparedField> =
                            field.args.values().filter(|arg| survivors.input_ok(&arg.ty)).collect();
                        let arg_types = args
                            .iter()
                            .map(|arg| (arg.name.clone(), arg.ty.clone()))
                            .collect();
                        let mut built = build_field(field, arg_types, &index);
                        for arg in args {
                            built = built.argument(build_input_value(arg));
                        }
                        object = object.field(built);
                    }
                    if let Some(description) = ty.description() {
                        object = object.description(description);
                    }
                    builder.register(object)
                }
                TypeKind::Input => {
                    let mut input = InputObject::new(*name);
                    for field in ty.fields().into_iter().flat_map(IndexMap::values) {
                        if survivors.input_ok(&field.ty) {
                            input = input.field(build_input_value(field));
                        }
                    }
                    if let Some(description) = ty.description() {
                        input = input.description(description);
                    }
                    builder.register(input)
                }
            };
            registered += 1;
        }

        let mut builder = builder
            .limit_depth(config.max_depth)
            .limit_complexity(config.max_complexity);
        if !config.introspection {
            builder = builder.disable_introspection();
        }

        let schema = builder
            .finish()
            .map_err(|e| RegistryError::SchemaBuild(e.to_string()))?;

        info!(
            types = registered,
            mutations = mutation.is_some(),
            "GraphQL schema build complete"
        );
        Ok(schema)
    }

    fn schema_index(&self, survivors: &Survivors<'_>) -> SchemaIndex {
        let mut index = SchemaIndex::default();
        for (name, ty) in &survivors.types {
            if !survivors.is_alive(name) {
                continue;
            }
            match ty.kind() {
                TypeKind::Enum => {
                    let values = ty
                        .enum_values()
                        .into_iter()
                        .flatten()
                        .map(|(value_name, value)| {
                            let internal = value
                                .value
                                .clone()
                                .unwrap_or_else(|| Value::String(value_name.clone()));
                            (value_name.clone(), internal)
                        })
                        .collect();
                    index.enums.insert((*name).to_string(), EnumIndex { values });
                }
                TypeKind::Union => {
                    let members = survivors
                        .union_members(self, ty)
                        .into_iter()
                        .map(|member| (type_key(member), member.to_string()))
                        .collect();
                    index.unions.insert(
                        (*name).to_string(),
                        UnionIndex {
                            members,
                            resolve_type: ty.type_resolver().cloned(),
                        },
                    );
                }
                TypeKind::Input => {
                    let fields = ty
                        .fields()
                        .into_iter()
                        .flat_map(IndexMap::values)
                        .filter(|field| survivors.input_ok(&field.ty))
                        .map(|field| (field.name.clone(), field.ty.clone()))
                        .collect();
                    index.inputs.insert((*name).to_string(), fields);
                }
                TypeKind::Object | TypeKind::Scalar => {}
            }
        }
        index
    }
}
