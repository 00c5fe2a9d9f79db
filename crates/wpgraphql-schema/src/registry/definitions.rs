//! Declarative type definitions.
//!
//! Features that do not need custom resolvers can ship their types as a JSON
//! or TOML document:
//!
//! ```toml
//! [types.Book]
//! description = "A book"
//! fields.title = { type = "String" }
//! fields.isbn = { type = { non_null = "String" } }
//!
//! [types.Genre]
//! kind = "enum"
//! values.FICTION = { value = "fiction" }
//!
//! [fields.RootQuery.featuredBook]
//! type = "Book"
//! ```
//!
//! `kind` defaults to `object`.

use indexmap::IndexMap;
use serde::Deserialize;

use super::field::FieldConfig;
use super::types::{
    ContainerConfig, EnumConfig, EnumValueConfig, ScalarConfig, TypeConfig, TypeKind, UnionConfig,
};
use super::TypeRegistry;
use crate::error::RegistryError;

/// A document of type definitions and extra fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeDefinitions {
    /// Types to register, in order.
    pub types: IndexMap<String, TypeConfig>,
    /// Fields to attach to existing types, keyed by type name then field name.
    pub fields: IndexMap<String, IndexMap<String, FieldConfig>>,
}

impl TypeDefinitions {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidDefinition` if the document is malformed.
    pub fn from_json(source: &str) -> Result<Self, RegistryError> {
        serde_json::from_str(source).map_err(|e| invalid_document(&e))
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidDefinition` if the document is malformed.
    pub fn from_toml(source: &str) -> Result<Self, RegistryError> {
        toml::from_str(source).map_err(|e| invalid_document(&e))
    }
}

fn invalid_document(error: &dyn std::fmt::Display) -> RegistryError {
    RegistryError::InvalidDefinition {
        name: "type definitions".into(),
        message: error.to_string(),
    }
}

impl TypeRegistry {
    /// Registers every type of a document, then attaches its extra fields.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::MissingFieldType` if a field has no type.
    pub fn register_definitions(&mut self, definitions: TypeDefinitions) -> Result<(), RegistryError> {
        for (name, config) in definitions.types {
            self.register_type(&name, config)?;
        }
        for (type_name, fields) in definitions.fields {
            self.register_fields(&type_name, fields)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTypeConfig {
    #[serde(default)]
    kind: Option<TypeKind>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    fields: Option<IndexMap<String, FieldConfig>>,
    #[serde(default)]
    values: Option<IndexMap<String, EnumValueConfig>>,
    #[serde(default)]
    types: Option<Vec<String>>,
    #[serde(default)]
    builtin: Option<super::types::BuiltinScalar>,
}

impl TryFrom<RawTypeConfig> for TypeConfig {
    type Error = String;

    fn try_from(raw: RawTypeConfig) -> Result<Self, Self::Error> {
        let kind = raw.kind.unwrap_or(TypeKind::Object);
        let reject = |key: &str, present: bool| {
            if present {
                Err(format!("`{key}` is not allowed on {kind} types"))
            } else {
                Ok(())
            }
        };

        match kind {
            TypeKind::Object | TypeKind::Input => {
                reject("values", raw.values.is_some())?;
                reject("types", raw.types.is_some())?;
                reject("builtin", raw.builtin.is_some())?;
                let container = ContainerConfig {
                    description: raw.description,
                    fields: raw.fields.unwrap_or_default(),
                };
                Ok(if kind == TypeKind::Object {
                    Self::Object(container)
                } else {
                    Self::Input(container)
                })
            }
            TypeKind::Enum => {
                reject("fields", raw.fields.is_some())?;
                reject("types", raw.types.is_some())?;
                reject("builtin", raw.builtin.is_some())?;
                Ok(Self::Enum(EnumConfig {
                    description: raw.description,
                    values: raw.values.unwrap_or_default(),
                }))
            }
            TypeKind::Union => {
                reject("fields", raw.fields.is_some())?;
                reject("values", raw.values.is_some())?;
                reject("builtin", raw.builtin.is_some())?;
                Ok(Self::Union(UnionConfig {
                    description: raw.description,
                    types: raw.types.unwrap_or_default(),
                    resolve_type: None,
                }))
            }
            TypeKind::Scalar => {
                reject("fields", raw.fields.is_some())?;
                reject("values", raw.values.is_some())?;
                reject("types", raw.types.is_some())?;
                Ok(Self::Scalar(ScalarConfig {
                    description: raw.description,
                    builtin: raw.builtin,
                }))
            }
        }
    }
}

impl<'de> Deserialize<'de> for TypeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawTypeConfig::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::BuiltinScalar;

    #[test]
    fn test_kind_defaults_to_object() {
        let config: TypeConfig = serde_json::from_value(serde_json::json!({
            "fields": { "title": { "type": "String" } }
        }))
        .unwrap();
        assert_eq!(config.kind(), TypeKind::Object);
    }

    #[test]
    fn test_rejects_foreign_keys() {
        let err = serde_json::from_value::<TypeConfig>(serde_json::json!({
            "kind": "enum",
            "fields": {}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("`fields` is not allowed on enum types"));
    }

    #[test]
    fn test_toml_document() {
        let doc = TypeDefinitions::from_toml(
            r#"
            [types.String]
            kind = "scalar"
            builtin = "String"

            [types.Book]
            fields.title = { type = "String" }
            fields.tags = { type = { list_of = { non_null = "String" } } }

            [types.Genre]
            kind = "enum"
            values.FICTION = { value = "fiction" }

            [fields.Book.subtitle]
            type = "String"
            description = "Optional subtitle"
            "#,
        )
        .unwrap();

        assert_eq!(doc.types.len(), 3);
        assert!(matches!(
            doc.types["String"],
            TypeConfig::Scalar(ScalarConfig { builtin: Some(BuiltinScalar::String), .. })
        ));

        let mut registry = TypeRegistry::new();
        registry.register_definitions(doc).unwrap();
        let fields = registry.fields("book").unwrap();
        assert_eq!(
            fields.keys().collect::<Vec<_>>(),
            vec!["title", "tags", "subtitle"]
        );
        assert_eq!(fields["tags"].ty.to_string(), "[String!]");
    }

    #[test]
    fn test_invalid_document() {
        let err = TypeDefinitions::from_json("{ \"types\": 3 }").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDefinition { .. }));
    }
}
