//! Schema configuration.
//!
//! Configuration can be loaded from a TOML document (for example the
//! `[graphql]` section of a host config file) or built in code.
//!
//! # Example Configuration
//!
//! ```toml
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! default_page_size = 10
//! max_page_size = 100
//! ```

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Name of the root query type.
pub const ROOT_QUERY: &str = "RootQuery";

/// Name of the root mutation type.
pub const ROOT_MUTATION: &str = "RootMutation";

/// Schema assembly and pagination configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Page size used by connections when neither `first` nor `last` is given.
    /// Default: 10
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Upper bound applied to `first` / `last`.
    /// Default: 100
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_page_size() -> usize {
    10
}

fn default_max_page_size() -> usize {
    100
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl SchemaConfig {
    /// Parses a configuration from a TOML document and validates it.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidDefinition` if the document cannot be
    /// parsed or holds invalid values.
    pub fn from_toml(source: &str) -> Result<Self, RegistryError> {
        let config: Self = toml::from_str(source).map_err(|e| RegistryError::InvalidDefinition {
            name: "schema config".into(),
            message: e.to_string(),
        })?;
        config
            .validate()
            .map_err(|message| RegistryError::InvalidDefinition {
                name: "schema config".into(),
                message,
            })?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        if self.default_page_size == 0 {
            return Err("graphql.default_page_size must be > 0".into());
        }
        if self.max_page_size < self.default_page_size {
            return Err("graphql.max_page_size must be >= default_page_size".into());
        }
        Ok(())
    }

    /// Resolves the page size of a connection request.
    ///
    /// `None` yields `default_page_size`; an explicit count is capped at
    /// `max_page_size`. An explicit zero stays zero.
    #[must_use]
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested.map_or(self.default_page_size, |n| n.min(self.max_page_size))
    }
}
