//! The type registry.
//!
//! Registration happens on a mutable [`TypeRegistry`]. Types are stored under
//! a lowercase key and displayed with their first letter upper-cased, so
//! `post`, `Post` and `POST` all name the same type. Object and input types
//! keep their fields pending; the field set of a type is materialized on first
//! read and never recomputed. [`TypeRegistry::freeze`] materializes the rest
//! and hands out a read-only [`FrozenRegistry`].
//!
//! # Example
//!
//! ```ignore
//! let mut registry = TypeRegistry::new();
//! registry.register_scalar("String", ScalarConfig::alias(BuiltinScalar::String))?;
//! registry.register_object_type(
//!     "Post",
//!     ObjectConfig::new().field("title", FieldConfig::new("String")),
//! )?;
//! registry.register_field("post", "slug", FieldConfig::new("String"))?;
//!
//! let frozen = registry.freeze();
//! assert!(frozen.fields("Post").unwrap().contains_key("slug"));
//! ```

mod definitions;
pub mod field;
mod patch;
pub mod types;

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::error::RegistryError;

pub use definitions::TypeDefinitions;
pub use field::{
    Arguments, FieldConfig, PreparedField, ResolveFuture, ResolveParams, Resolver, TypeRefSpec,
    prepare_field, resolver,
};
pub use patch::FieldPatch;
pub use types::{
    BuiltinScalar, ContainerConfig, EnumConfig, EnumValueConfig, InputConfig, ObjectConfig,
    RegisteredType, ScalarConfig, TypeConfig, TypeKind, TypeResolver, UnionConfig,
};

use types::Materialized;

/// Storage key of a type name.
#[must_use]
pub fn type_key(name: &str) -> String {
    name.to_lowercase()
}

/// Display form of a type name: first letter upper-cased.
#[must_use]
pub fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Exposed form of a field name: first letter lower-cased.
#[must_use]
pub fn field_key(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A field or argument dropped because its type was never registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Type owning the field.
    pub type_name: String,
    /// Field name.
    pub field_name: String,
    /// Argument name, when only an argument was dropped.
    pub argument: Option<String>,
    /// The reference that failed to resolve, e.g. `[Widget!]`.
    pub reference: String,
}

impl UnresolvedReference {
    pub(crate) fn field(type_name: &str, field_name: &str, reference: &TypeRefSpec) -> Self {
        Self {
            type_name: type_name.to_string(),
            field_name: field_name.to_string(),
            argument: None,
            reference: reference.to_string(),
        }
    }

    pub(crate) fn argument(
        type_name: &str,
        field_name: &str,
        argument: &str,
        reference: &TypeRefSpec,
    ) -> Self {
        Self {
            argument: Some(argument.to_string()),
            ..Self::field(type_name, field_name, reference)
        }
    }
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument {
            Some(arg) => write!(
                f,
                "{}.{}({arg}) references unknown type {}",
                self.type_name, self.field_name, self.reference
            ),
            None => write!(
                f,
                "{}.{} references unknown type {}",
                self.type_name, self.field_name, self.reference
            ),
        }
    }
}

/// The mutable registry used during the registration phase.
#[derive(Default)]
pub struct TypeRegistry {
    types: IndexMap<String, RegisteredType>,
    patches: HashMap<String, Vec<FieldPatch>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type. The first registration of a name wins; later ones
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::MissingFieldType` if a declared field or
    /// argument has no type.
    pub fn register_type(&mut self, name: &str, config: TypeConfig) -> Result<(), RegistryError> {
        let key = type_key(name);
        if self.types.contains_key(&key) {
            debug!(type_name = %name, "Type already registered, skipping");
            return Ok(());
        }

        if let TypeConfig::Object(container) | TypeConfig::Input(container) = &config {
            for (field_name, field) in &container.fields {
                field.validate(&display_name(name), field_name)?;
            }
        }

        let registered = RegisteredType::prepare(name, config);
        trace!(type_name = %registered.name(), kind = %registered.kind(), "Registered type");
        self.types.insert(key, registered);
        Ok(())
    }

    /// Registers an object type.
    ///
    /// # Errors
    ///
    /// See [`register_type`](Self::register_type).
    pub fn register_object_type(&mut self, name: &str, config: ObjectConfig) -> Result<(), RegistryError> {
        self.register_type(name, TypeConfig::Object(config))
    }

    /// Registers an input type.
    ///
    /// # Errors
    ///
    /// See [`register_type`](Self::register_type).
    pub fn register_input_type(&mut self, name: &str, config: InputConfig) -> Result<(), RegistryError> {
        self.register_type(name, TypeConfig::Input(config))
    }

    /// Registers an enum type.
    ///
    /// # Errors
    ///
    /// See [`register_type`](Self::register_type).
    pub fn register_enum_type(&mut self, name: &str, config: EnumConfig) -> Result<(), RegistryError> {
        self.register_type(name, TypeConfig::Enum(config))
    }

    /// Registers a union type.
    ///
    /// # Errors
    ///
    /// See [`register_type`](Self::register_type).
    pub fn register_union_type(&mut self, name: &str, config: UnionConfig) -> Result<(), RegistryError> {
        self.register_type(name, TypeConfig::Union(config))
    }

    /// Registers a scalar.
    ///
    /// # Errors
    ///
    /// See [`register_type`](Self::register_type).
    pub fn register_scalar(&mut self, name: &str, config: ScalarConfig) -> Result<(), RegistryError> {
        self.register_type(name, TypeConfig::Scalar(config))
    }

    /// Looks up a type by name, in any casing.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&RegisteredType> {
        self.types.get(&type_key(name))
    }

    /// All types in registration order, keyed by normalized name.
    #[must_use]
    pub fn get_types(&self) -> &IndexMap<String, RegisteredType> {
        &self.types
    }

    /// Attaches a field to a type. It is added when the type's fields are
    /// materialized, unless a field of the same name is already there.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::MissingFieldType` if the field or one of its
    /// arguments has no type.
    pub fn register_field(
        &mut self,
        type_name: &str,
        field_name: &str,
        config: FieldConfig,
    ) -> Result<(), RegistryError> {
        config.validate(&display_name(type_name), field_name)?;
        self.push_patch(
            type_name,
            FieldPatch::Add {
                field_name: field_name.to_string(),
                config,
            },
        );
        Ok(())
    }

    /// Attaches several fields to a type, in order.
    ///
    /// # Errors
    ///
    /// See [`register_field`](Self::register_field).
    pub fn register_fields<I, S>(&mut self, type_name: &str, fields: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = (S, FieldConfig)>,
        S: AsRef<str>,
    {
        for (field_name, config) in fields {
            self.register_field(type_name, field_name.as_ref(), config)?;
        }
        Ok(())
    }

    /// Removes a field from a type when its fields are materialized.
    pub fn deregister_field(&mut self, type_name: &str, field_name: &str) {
        self.push_patch(
            type_name,
            FieldPatch::Remove {
                field_name: field_name.to_string(),
            },
        );
    }

    fn push_patch(&mut self, type_name: &str, patch: FieldPatch) {
        let key = type_key(type_name);
        if self.types.get(&key).is_some_and(RegisteredType::is_materialized) {
            warn!(
                type_name = %type_name,
                ?patch,
                "Fields of this type were already materialized; patch has no effect"
            );
        }
        self.patches.entry(key).or_default().push(patch);
    }

    /// Materializes and returns the fields of an object or input type.
    ///
    /// Returns `None` for unknown types and for kinds without fields.
    #[must_use]
    pub fn fields(&self, type_name: &str) -> Option<&IndexMap<String, PreparedField>> {
        let key = type_key(type_name);
        let ty = self.types.get(&key)?;
        if !ty.has_fields() {
            return None;
        }
        Some(&self.materialize(&key, ty).fields)
    }

    fn materialize<'s>(&'s self, key: &str, ty: &'s RegisteredType) -> &'s Materialized {
        ty.materialized.get_or_init(|| {
            let lookup = |name: &str| self.get_type(name).map(|t| t.name().to_string());
            let mut out = Materialized::default();

            if let types::TypeDef::Container { pending } = &ty.def {
                for (field_name, config) in pending {
                    match prepare_field(field_name, config, ty.name(), &lookup, &mut out.unresolved) {
                        Ok(Some(field)) => {
                            out.fields.insert(field.name.clone(), field);
                        }
                        Ok(None) => {}
                        Err(e) => warn!(error = %e, "Skipping invalid declared field"),
                    }
                }
            }

            for patch in self.patches.get(key).into_iter().flatten() {
                patch.apply(ty.name(), &mut out.fields, &lookup, &mut out.unresolved);
            }

            debug!(
                type_name = %ty.name(),
                fields = out.fields.len(),
                dropped = out.unresolved.len(),
                "Materialized field set"
            );
            out
        })
    }

    /// Ends the registration phase.
    ///
    /// Every remaining object and input type is materialized; the returned
    /// registry is read-only.
    #[must_use]
    pub fn freeze(self) -> FrozenRegistry {
        for (key, ty) in &self.types {
            if ty.has_fields() {
                self.materialize(key, ty);
            }
        }
        let frozen = FrozenRegistry { types: self.types };
        debug!(
            types = frozen.types.len(),
            unresolved = frozen.unresolved_references().len(),
            "Type registry frozen"
        );
        frozen
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.len())
            .field("patched_types", &self.patches.len())
            .finish()
    }
}

/// The read-only registry produced by [`TypeRegistry::freeze`].
#[derive(Debug)]
pub struct FrozenRegistry {
    types: IndexMap<String, RegisteredType>,
}

impl FrozenRegistry {
    /// Looks up a type by name, in any casing.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&RegisteredType> {
        self.types.get(&type_key(name))
    }

    /// All types in registration order, keyed by normalized name.
    #[must_use]
    pub fn get_types(&self) -> &IndexMap<String, RegisteredType> {
        &self.types
    }

    /// The final fields of an object or input type.
    #[must_use]
    pub fn fields(&self, type_name: &str) -> Option<&IndexMap<String, PreparedField>> {
        self.get_type(type_name)?.fields()
    }

    /// Every reference dropped while materializing, in type order.
    #[must_use]
    pub fn unresolved_references(&self) -> Vec<&UnresolvedReference> {
        self.types
            .values()
            .filter_map(|ty| ty.materialized.get())
            .flat_map(|m| m.unresolved.iter())
            .collect()
    }
}
