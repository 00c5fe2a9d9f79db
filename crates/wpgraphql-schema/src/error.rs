//! Error types for the type registry.
//!
//! Configuration mistakes (a typeless field, an incomplete connection) are
//! hard errors raised at the call site. Unresolved type references and
//! duplicate registrations are not errors; they are logged and recorded as
//! diagnostics on the registry instead.

/// Errors that can occur while registering types or assembling the schema.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A field or argument was declared without a `type`.
    #[error("Field `{field}` on `{type_name}` has no type")]
    MissingFieldType {
        /// Type owning the field.
        type_name: String,
        /// Field name (or `field.arg` path for arguments).
        field: String,
    },

    /// A connection descriptor is missing one of its required keys.
    #[error("Connection is missing `{0}`")]
    IncompleteConnection(&'static str),

    /// A declarative type definition could not be read.
    #[error("Invalid definition `{name}`: {message}")]
    InvalidDefinition {
        /// Name of the offending definition (or document).
        name: String,
        /// What went wrong.
        message: String,
    },

    /// A schema extension failed while registering its types.
    #[error("Schema extension `{name}` failed: {message}")]
    Extension {
        /// Extension name.
        name: String,
        /// What went wrong.
        message: String,
    },

    /// The executable schema could not be built.
    #[error("Failed to build GraphQL schema: {0}")]
    SchemaBuild(String),

    /// Schema is still being built - client should retry.
    #[error("GraphQL schema is initializing, please retry")]
    SchemaInitializing,
}

impl RegistryError {
    /// Creates a new `MissingFieldType` error.
    #[must_use]
    pub fn missing_field_type(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingFieldType {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Creates a new `Extension` error.
    #[must_use]
    pub fn extension(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extension {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for mistakes in registration code rather than runtime failures.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingFieldType { .. } | Self::IncompleteConnection(_) | Self::InvalidDefinition { .. }
        )
    }

    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingFieldType { .. } => "MISSING_FIELD_TYPE",
            Self::IncompleteConnection(_) => "INCOMPLETE_CONNECTION",
            Self::InvalidDefinition { .. } => "INVALID_DEFINITION",
            Self::Extension { .. } => "EXTENSION_FAILED",
            Self::SchemaBuild(_) => "SCHEMA_BUILD_FAILED",
            Self::SchemaInitializing => "SCHEMA_INITIALIZING",
        }
    }
}
