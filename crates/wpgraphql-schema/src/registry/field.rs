//! Field configuration and the field preparer.
//!
//! A [`FieldConfig`] is what callers hand to the registry. It names its type
//! by string (optionally wrapped in `non_null` / `list_of`), so it can point
//! at types that are registered later. [`prepare_field`] turns a config into
//! a [`PreparedField`] once every reference can be looked up.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use async_graphql::dynamic::TypeRef;
use async_graphql::{Context, Name, Value};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use serde::Deserialize;

use super::{UnresolvedReference, field_key};
use crate::error::RegistryError;

/// Argument values handed to a resolver, keyed by argument name.
pub type Arguments = IndexMap<Name, Value>;

/// An async field resolver.
pub type Resolver = Arc<dyn for<'a> Fn(ResolveParams<'a>) -> ResolveFuture<'a> + Send + Sync>;

/// Wraps a closure into a [`Resolver`].
pub fn resolver<F>(f: F) -> Resolver
where
    F: for<'a> Fn(ResolveParams<'a>) -> ResolveFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

static NULL_SOURCE: Value = Value::Null;

/// Everything a resolver receives.
pub struct ResolveParams<'a> {
    /// The parent value (`null` on root types).
    pub source: &'a Value,
    /// Argument values, with enum names already mapped to internal values.
    pub args: Arguments,
    /// The request context.
    pub ctx: &'a Context<'a>,
}

impl<'a> ResolveParams<'a> {
    pub(crate) fn new(source: Option<&'a Value>, args: Arguments, ctx: &'a Context<'a>) -> Self {
        Self {
            source: source.unwrap_or(&NULL_SOURCE),
            args,
            ctx,
        }
    }

    /// Returns an argument value, treating explicit `null` as absent.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name).filter(|value| !matches!(value, Value::Null))
    }

    /// Returns a key of the parent value, if the parent is an object.
    #[must_use]
    pub fn source_field(&self, name: &str) -> Option<&'a Value> {
        match self.source {
            Value::Object(map) => map.get(name),
            _ => None,
        }
    }
}

/// The future returned by a [`Resolver`].
///
/// `Ok(None)` resolves the field to `null`.
pub struct ResolveFuture<'a>(BoxFuture<'a, async_graphql::Result<Option<Value>>>);

impl<'a> ResolveFuture<'a> {
    /// Wraps an async block.
    pub fn new<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = async_graphql::Result<Option<Value>>> + Send + 'a,
    {
        Self(future.boxed())
    }

    /// Resolves immediately.
    #[must_use]
    pub fn ready(result: async_graphql::Result<Option<Value>>) -> Self {
        Self(futures_util::future::ready(result).boxed())
    }
}

impl Future for ResolveFuture<'_> {
    type Output = async_graphql::Result<Option<Value>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        self.0.as_mut().poll(cx)
    }
}

/// A type reference: a type name, optionally wrapped.
///
/// Deserializes from a plain string (`"String"`) or a wrapper map
/// (`{ non_null = "String" }`, `{ list_of = { non_null = "Post" } }`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawTypeRef")]
pub enum TypeRefSpec {
    /// A named type.
    Named(String),
    /// A non-null wrapper.
    NonNull(Box<TypeRefSpec>),
    /// A list wrapper.
    ListOf(Box<TypeRefSpec>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTypeRef {
    Named(String),
    Wrapped(WrappedTypeRef),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum WrappedTypeRef {
    NonNull(Box<TypeRefSpec>),
    ListOf(Box<TypeRefSpec>),
}

impl From<RawTypeRef> for TypeRefSpec {
    fn from(raw: RawTypeRef) -> Self {
        match raw {
            RawTypeRef::Named(name) => Self::Named(name),
            RawTypeRef::Wrapped(WrappedTypeRef::NonNull(inner)) => Self::NonNull(inner),
            RawTypeRef::Wrapped(WrappedTypeRef::ListOf(inner)) => Self::ListOf(inner),
        }
    }
}

impl TypeRefSpec {
    /// A named type reference.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps this reference in non-null.
    #[must_use]
    pub fn non_null(self) -> Self {
        Self::NonNull(Box::new(self))
    }

    /// Wraps this reference in a list.
    #[must_use]
    pub fn list_of(self) -> Self {
        Self::ListOf(Box::new(self))
    }

    /// The innermost type name.
    #[must_use]
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NonNull(inner) | Self::ListOf(inner) => inner.base_name(),
        }
    }

    /// Rewrites the innermost name, keeping the wrappers.
    ///
    /// Returns `None` if `resolve` cannot resolve the name.
    pub fn resolve_with(&self, resolve: &dyn Fn(&str) -> Option<String>) -> Option<Self> {
        Some(match self {
            Self::Named(name) => Self::Named(resolve(name)?),
            Self::NonNull(inner) => Self::NonNull(Box::new(inner.resolve_with(resolve)?)),
            Self::ListOf(inner) => Self::ListOf(Box::new(inner.resolve_with(resolve)?)),
        })
    }

    /// Converts to an async-graphql type reference.
    #[must_use]
    pub fn to_type_ref(&self) -> TypeRef {
        match self {
            Self::Named(name) => TypeRef::named(name.clone()),
            Self::NonNull(inner) => TypeRef::NonNull(Box::new(inner.to_type_ref())),
            Self::ListOf(inner) => TypeRef::List(Box::new(inner.to_type_ref())),
        }
    }
}

impl From<&str> for TypeRefSpec {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for TypeRefSpec {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl fmt::Display for TypeRefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
            Self::ListOf(inner) => write!(f, "[{inner}]"),
        }
    }
}

/// Configuration of a field, argument or input field.
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldConfig {
    /// The field type. Required.
    #[serde(rename = "type")]
    pub ty: Option<TypeRefSpec>,
    /// Exposed name. Defaults to the key with its first letter lowered.
    pub name: Option<String>,
    /// Arguments, prepared the same way as fields.
    pub args: IndexMap<String, FieldConfig>,
    /// Resolver. Fields without one read `source[name]`.
    #[serde(skip)]
    pub resolve: Option<Resolver>,
    /// Description shown in the schema.
    pub description: Option<String>,
    /// Marks the field deprecated.
    pub deprecation_reason: Option<String>,
    /// Default value for arguments and input fields.
    pub default_value: Option<Value>,
}

impl FieldConfig {
    /// Creates a field of the given type.
    #[must_use]
    pub fn new(ty: impl Into<TypeRefSpec>) -> Self {
        Self {
            ty: Some(ty.into()),
            ..Self::default()
        }
    }

    /// Overrides the exposed name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds an argument.
    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.args.insert(name.into(), config);
        self
    }

    /// Sets the resolver from a closure.
    #[must_use]
    pub fn resolve<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(ResolveParams<'a>) -> ResolveFuture<'a> + Send + Sync + 'static,
    {
        self.resolve = Some(Arc::new(f));
        self
    }

    /// Sets an already shared resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: Option<Resolver>) -> Self {
        self.resolve = resolver;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the field deprecated.
    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Checks that this field and all of its arguments, at any depth, have a type.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::MissingFieldType` naming the first typeless
    /// position (`field` or `field.arg`).
    pub fn validate(&self, type_name: &str, path: &str) -> Result<(), RegistryError> {
        if self.ty.is_none() {
            return Err(RegistryError::missing_field_type(type_name, path));
        }
        for (arg_name, arg) in &self.args {
            arg.validate(type_name, &format!("{path}.{arg_name}"))?;
        }
        Ok(())
    }
}

impl fmt::Debug for FieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfig")
            .field("ty", &self.ty)
            .field("name", &self.name)
            .field("args", &self.args)
            .field("has_resolver", &self.resolve.is_some())
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// A field whose type references have been resolved to registered types.
#[derive(Clone)]
pub struct PreparedField {
    /// Exposed name.
    pub name: String,
    /// Key the field was registered under; differs from `name` when the
    /// config overrides the name.
    pub key: String,
    /// Type, using display names of registered types.
    pub ty: TypeRefSpec,
    /// Prepared arguments, keyed by exposed name.
    pub args: IndexMap<String, PreparedField>,
    /// Resolver, if any.
    pub resolve: Option<Resolver>,
    /// Description.
    pub description: Option<String>,
    /// Deprecation reason.
    pub deprecation_reason: Option<String>,
    /// Default value.
    pub default_value: Option<Value>,
}

impl fmt::Debug for PreparedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedField")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("ty", &self.ty.to_string())
            .field("args", &self.args.keys().collect::<Vec<_>>())
            .field("has_resolver", &self.resolve.is_some())
            .finish_non_exhaustive()
    }
}

/// Prepares a field config against the registered types.
///
/// `lookup` maps a type reference to the display name of a registered type.
/// Returns `Ok(None)` if the field's own type cannot be resolved; arguments
/// whose type cannot be resolved are dropped individually. Every dropped
/// reference is pushed onto `unresolved`.
///
/// # Errors
///
/// Returns `RegistryError::MissingFieldType` if the field, or any argument at
/// any depth, has no type.
pub fn prepare_field(
    field_name: &str,
    config: &FieldConfig,
    owning_type: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    unresolved: &mut Vec<UnresolvedReference>,
) -> Result<Option<PreparedField>, RegistryError> {
    config.validate(owning_type, field_name)?;
    Ok(prepare_validated(field_name, config, owning_type, None, lookup, unresolved))
}

fn prepare_validated(
    field_name: &str,
    config: &FieldConfig,
    owning_type: &str,
    parent_field: Option<&str>,
    lookup: &dyn Fn(&str) -> Option<String>,
    unresolved: &mut Vec<UnresolvedReference>,
) -> Option<PreparedField> {
    let declared = config.ty.as_ref()?;
    let name = config.name.clone().unwrap_or_else(|| field_key(field_name));

    let Some(ty) = declared.resolve_with(lookup) else {
        let reference = match parent_field {
            Some(field) => UnresolvedReference::argument(owning_type, field, &name, declared),
            None => UnresolvedReference::field(owning_type, &name, declared),
        };
        tracing::debug!(%reference, "Dropping unresolved type reference");
        unresolved.push(reference);
        return None;
    };

    let mut args = IndexMap::with_capacity(config.args.len());
    for (arg_name, arg_config) in &config.args {
        if let Some(arg) = prepare_validated(arg_name, arg_config, owning_type, Some(&name), lookup, unresolved) {
            args.insert(arg.name.clone(), arg);
        }
    }

    Some(PreparedField {
        name,
        key: field_key(field_name),
        ty,
        args,
        resolve: config.resolve.clone(),
        description: config.description.clone(),
        deprecation_reason: config.deprecation_reason.clone(),
        default_value: config.default_value.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name.to_lowercase().as_str() {
            "string" => Some("String".into()),
            "int" => Some("Int".into()),
            "post" => Some("Post".into()),
            _ => None,
        }
    }

    #[test]
    fn test_prepare_resolves_wrapped_reference() {
        let config = FieldConfig::new(TypeRefSpec::named("post").non_null().list_of());
        let mut unresolved = Vec::new();
        let field = prepare_field("Posts", &config, "RootQuery", &lookup, &mut unresolved)
            .unwrap()
            .unwrap();

        assert_eq!(field.name, "posts");
        assert_eq!(field.ty.to_string(), "[Post!]");
        assert!(field.args.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_unresolved_field_is_dropped() {
        let config = FieldConfig::new(TypeRefSpec::named("Missing").non_null());
        let mut unresolved = Vec::new();
        let field = prepare_field("thing", &config, "Post", &lookup, &mut unresolved).unwrap();

        assert!(field.is_none());
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].reference, "Missing!");
    }

    #[test]
    fn test_unresolved_argument_is_dropped_alone() {
        let config = FieldConfig::new("String")
            .arg("format", FieldConfig::new("Missing"))
            .arg("limit", FieldConfig::new("Int"));
        let mut unresolved = Vec::new();
        let field = prepare_field("title", &config, "Post", &lookup, &mut unresolved)
            .unwrap()
            .unwrap();

        assert_eq!(field.args.keys().collect::<Vec<_>>(), vec!["limit"]);
        assert_eq!(unresolved[0].argument.as_deref(), Some("format"));
    }

    #[test]
    fn test_missing_type_is_an_error_at_every_position() {
        let mut unresolved = Vec::new();

        let err = prepare_field("title", &FieldConfig::default(), "Post", &lookup, &mut unresolved)
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingFieldType { ref field, .. } if field == "title"));

        let nested = FieldConfig::new("String")
            .arg("format", FieldConfig::new("String").arg("locale", FieldConfig::default()));
        let err = prepare_field("title", &nested, "Post", &lookup, &mut unresolved).unwrap_err();
        assert!(
            matches!(err, RegistryError::MissingFieldType { ref field, .. } if field == "title.format.locale")
        );
    }

    #[test]
    fn test_name_override() {
        let config = FieldConfig::new("String").name("headline");
        let mut unresolved = Vec::new();
        let field = prepare_field("title", &config, "Post", &lookup, &mut unresolved)
            .unwrap()
            .unwrap();
        assert_eq!(field.name, "headline");
        assert_eq!(field.key, "title");
    }

    #[test]
    fn test_type_ref_deserialize() {
        let spec: TypeRefSpec =
            serde_json::from_value(serde_json::json!({"list_of": {"non_null": "Post"}})).unwrap();
        assert_eq!(spec, TypeRefSpec::named("Post").non_null().list_of());
        assert_eq!(spec.base_name(), "Post");

        let spec: TypeRefSpec = serde_json::from_value(serde_json::json!("String")).unwrap();
        assert_eq!(spec, TypeRefSpec::named("String"));
    }
}
