//! Type configurations and the type preparer.

use std::fmt;
use std::sync::{Arc, OnceLock};

use async_graphql::Value;
use indexmap::IndexMap;
use serde::Deserialize;

use super::field::{FieldConfig, PreparedField};
use super::{UnresolvedReference, display_name};

/// Picks the concrete member type of a union for a resolved value.
///
/// Returns a registered type name (any casing), or `None` to fall back to the
/// value's `__typename` key.
pub type TypeResolver = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// The category of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Output object.
    Object,
    /// Input object.
    Input,
    /// Enumeration.
    Enum,
    /// Union of object types.
    Union,
    /// Scalar.
    Scalar,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => write!(f, "object"),
            Self::Input => write!(f, "input"),
            Self::Enum => write!(f, "enum"),
            Self::Union => write!(f, "union"),
            Self::Scalar => write!(f, "scalar"),
        }
    }
}

/// Scalars provided by the execution library itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum BuiltinScalar {
    /// `String`
    String,
    /// `Int`
    Int,
    /// `Float`
    Float,
    /// `Boolean`
    Boolean,
    /// `ID`
    #[serde(rename = "ID", alias = "Id")]
    Id,
}

impl BuiltinScalar {
    /// The schema name of the scalar.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Id => "ID",
        }
    }
}

/// Fields of an object or input type.
#[derive(Debug, Clone, Default)]
pub struct ContainerConfig {
    /// Description shown in the schema.
    pub description: Option<String>,
    /// Declared fields, keyed by field name.
    pub fields: IndexMap<String, FieldConfig>,
}

/// Configuration of an object type.
pub type ObjectConfig = ContainerConfig;

/// Configuration of an input type.
pub type InputConfig = ContainerConfig;

impl ContainerConfig {
    /// Creates a config without fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.fields.insert(name.into(), config);
        self
    }

    /// Declares several fields.
    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = (String, FieldConfig)>) -> Self {
        self.fields.extend(fields);
        self
    }
}

/// A single enum value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnumValueConfig {
    /// Internal value resolvers see. Defaults to the value name.
    pub value: Option<Value>,
    /// Description.
    pub description: Option<String>,
    /// Marks the value deprecated.
    pub deprecation_reason: Option<String>,
}

impl EnumValueConfig {
    /// A value with the given internal representation.
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Configuration of an enum type.
#[derive(Debug, Clone, Default)]
pub struct EnumConfig {
    /// Description.
    pub description: Option<String>,
    /// Values, keyed by the exposed name.
    pub values: IndexMap<String, EnumValueConfig>,
}

impl EnumConfig {
    /// Creates an enum without values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a value.
    #[must_use]
    pub fn value(mut self, name: impl Into<String>, config: EnumValueConfig) -> Self {
        self.values.insert(name.into(), config);
        self
    }
}

/// Configuration of a union type.
#[derive(Clone, Default)]
pub struct UnionConfig {
    /// Description.
    pub description: Option<String>,
    /// Member type references.
    pub types: Vec<String>,
    /// Picks the member type for a value.
    pub resolve_type: Option<TypeResolver>,
}

impl UnionConfig {
    /// Creates a union of the given members.
    #[must_use]
    pub fn new(types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            types: types.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the type resolver.
    #[must_use]
    pub fn resolve_type<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.resolve_type = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for UnionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionConfig")
            .field("description", &self.description)
            .field("types", &self.types)
            .field("has_resolve_type", &self.resolve_type.is_some())
            .finish()
    }
}

/// Configuration of a scalar type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScalarConfig {
    /// Description.
    pub description: Option<String>,
    /// Makes this name an alias of a builtin scalar.
    pub builtin: Option<BuiltinScalar>,
}

impl ScalarConfig {
    /// A custom scalar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An alias of a builtin scalar.
    #[must_use]
    pub fn alias(builtin: BuiltinScalar) -> Self {
        Self {
            description: None,
            builtin: Some(builtin),
        }
    }
}

/// Configuration of a type, consumed once by [`RegisteredType::prepare`].
#[derive(Debug, Clone)]
pub enum TypeConfig {
    /// Output object.
    Object(ObjectConfig),
    /// Input object.
    Input(InputConfig),
    /// Enumeration.
    Enum(EnumConfig),
    /// Union.
    Union(UnionConfig),
    /// Scalar.
    Scalar(ScalarConfig),
}

impl TypeConfig {
    /// The kind this config produces.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Object(_) => TypeKind::Object,
            Self::Input(_) => TypeKind::Input,
            Self::Enum(_) => TypeKind::Enum,
            Self::Union(_) => TypeKind::Union,
            Self::Scalar(_) => TypeKind::Scalar,
        }
    }
}

/// Kind-specific data of a registered type.
#[derive(Clone)]
pub(crate) enum TypeDef {
    Container { pending: IndexMap<String, FieldConfig> },
    Enum { values: IndexMap<String, EnumValueConfig> },
    Union { types: Vec<String>, resolve_type: Option<TypeResolver> },
    Scalar { builtin: Option<BuiltinScalar> },
}

/// A materialized field set together with what was dropped while building it.
#[derive(Debug, Default)]
pub(crate) struct Materialized {
    pub(crate) fields: IndexMap<String, PreparedField>,
    pub(crate) unresolved: Vec<UnresolvedReference>,
}

/// A type held by the registry.
///
/// Object and input types keep their declared fields pending until first
/// read; the resolved field set is computed once and memoized.
pub struct RegisteredType {
    name: String,
    kind: TypeKind,
    description: Option<String>,
    pub(crate) def: TypeDef,
    pub(crate) materialized: OnceLock<Materialized>,
}

impl RegisteredType {
    /// Prepares a config registered under `type_name`.
    #[must_use]
    pub fn prepare(type_name: &str, config: TypeConfig) -> Self {
        let kind = config.kind();
        let (name, description, def) = match config {
            TypeConfig::Object(container) | TypeConfig::Input(container) => (
                display_name(type_name),
                container.description,
                TypeDef::Container {
                    pending: container.fields,
                },
            ),
            TypeConfig::Enum(config) => (
                display_name(type_name),
                config.description,
                TypeDef::Enum {
                    values: config.values,
                },
            ),
            TypeConfig::Union(config) => (
                display_name(type_name),
                config.description,
                TypeDef::Union {
                    types: config.types,
                    resolve_type: config.resolve_type,
                },
            ),
            TypeConfig::Scalar(config) => (
                config
                    .builtin
                    .map_or_else(|| display_name(type_name), |builtin| builtin.name().to_string()),
                config.description,
                TypeDef::Scalar {
                    builtin: config.builtin,
                },
            ),
        };

        Self {
            name,
            kind,
            description,
            def,
            materialized: OnceLock::new(),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether this type carries fields (object or input).
    #[must_use]
    pub fn has_fields(&self) -> bool {
        matches!(self.def, TypeDef::Container { .. })
    }

    /// Whether the field set has been materialized.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.materialized.get().is_some()
    }

    /// Materialized fields; `None` before materialization or for non-container kinds.
    #[must_use]
    pub fn fields(&self) -> Option<&IndexMap<String, PreparedField>> {
        if !self.has_fields() {
            return None;
        }
        self.materialized.get().map(|m| &m.fields)
    }

    /// Enum values, for enum types.
    #[must_use]
    pub fn enum_values(&self) -> Option<&IndexMap<String, EnumValueConfig>> {
        match &self.def {
            TypeDef::Enum { values } => Some(values),
            _ => None,
        }
    }

    /// Union member references, for union types.
    #[must_use]
    pub fn union_members(&self) -> &[String] {
        match &self.def {
            TypeDef::Union { types, .. } => types,
            _ => &[],
        }
    }

    /// Union type resolver, for union types.
    #[must_use]
    pub fn type_resolver(&self) -> Option<&TypeResolver> {
        match &self.def {
            TypeDef::Union { resolve_type, .. } => resolve_type.as_ref(),
            _ => None,
        }
    }

    /// The builtin scalar this type aliases, if any.
    #[must_use]
    pub fn builtin(&self) -> Option<BuiltinScalar> {
        match &self.def {
            TypeDef::Scalar { builtin } => *builtin,
            _ => None,
        }
    }
}

impl fmt::Debug for RegisteredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredType")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("materialized", &self.is_materialized())
            .finish_non_exhaustive()
    }
}
