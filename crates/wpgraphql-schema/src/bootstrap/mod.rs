//! Registry bootstrap.
//!
//! [`SchemaBootstrap`] fills a fresh [`TypeRegistry`] from the content host in
//! a fixed order:
//!
//! 1. scalars
//! 2. static core types and the root types
//! 3. setting groups
//! 4. post types, with their mutations
//! 5. taxonomies, with their mutations
//! 6. unions
//! 7. schema extensions
//! 8. connections
//! 9. `updateSettings`
//!
//! and freezes it. Extensions run after every content type exists, so they
//! can reference and patch them, and before connections, so connections may
//! point at extension types.

mod connections;
mod content;
mod core_types;
mod mutations;

use async_graphql::dynamic::Schema;
use tracing::{debug, info};
use wpgraphql_content::DynContentSource;

use crate::config::SchemaConfig;
use crate::error::RegistryError;
use crate::registry::{FrozenRegistry, TypeRegistry};

/// Adds types and fields to the registry during bootstrap.
///
/// Each extension runs exactly once per registry, after the content types
/// and before connections.
///
/// # Example
///
/// ```ignore
/// struct Seo;
///
/// impl SchemaExtension for Seo {
///     fn name(&self) -> &str {
///         "seo"
///     }
///
///     fn register(&self, registry: &mut TypeRegistry, _source: &DynContentSource) -> Result<(), RegistryError> {
///         registry.register_field("Post", "metaDescription", FieldConfig::new("String"))
///     }
/// }
/// ```
pub trait SchemaExtension: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Registers the extension's types and fields.
    ///
    /// # Errors
    ///
    /// Any error aborts the bootstrap; it is reported as
    /// `RegistryError::Extension`.
    fn register(&self, registry: &mut TypeRegistry, source: &DynContentSource) -> Result<(), RegistryError>;
}

/// Builds registries (and schemas) for a content host.
pub struct SchemaBootstrap {
    source: DynContentSource,
    config: SchemaConfig,
    extensions: Vec<Box<dyn SchemaExtension>>,
}

impl SchemaBootstrap {
    /// Creates a bootstrap with the default configuration.
    #[must_use]
    pub fn new(source: DynContentSource) -> Self {
        Self {
            source,
            config: SchemaConfig::default(),
            extensions: Vec::new(),
        }
    }

    /// Sets the schema configuration.
    #[must_use]
    pub fn with_config(mut self, config: SchemaConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds an extension. Extensions run in the order they were added.
    #[must_use]
    pub fn with_extension(mut self, extension: impl SchemaExtension + 'static) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    /// The schema configuration.
    #[must_use]
    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Runs the full registration sequence on a fresh registry and freezes it.
    ///
    /// # Errors
    ///
    /// Returns configuration errors raised while registering, and
    /// `RegistryError::Extension` if an extension fails.
    pub fn run(&self) -> Result<FrozenRegistry, RegistryError> {
        let post_types = self.source.post_types();
        let taxonomies = self.source.taxonomies();
        let setting_groups = self.source.setting_groups();

        info!(
            backend = self.source.backend_name(),
            post_types = post_types.len(),
            taxonomies = taxonomies.len(),
            setting_groups = setting_groups.len(),
            extensions = self.extensions.len(),
            "Bootstrapping type registry"
        );

        let mut registry = TypeRegistry::new();

        core_types::register_scalars(&mut registry)?;
        core_types::register(&mut registry, &self.source)?;
        content::register_setting_groups(&mut registry, &self.source, &setting_groups)?;
        content::register_post_types(&mut registry, &self.source, &post_types)?;
        content::register_taxonomies(&mut registry, &self.source, &taxonomies)?;
        content::register_unions(&mut registry, &self.source, &post_types, &taxonomies)?;

        for extension in &self.extensions {
            debug!(extension = %extension.name(), "Running schema extension");
            extension
                .register(&mut registry, &self.source)
                .map_err(|e| RegistryError::extension(extension.name(), e.to_string()))?;
        }

        connections::register(&mut registry, &self.source, &post_types, &taxonomies, &self.config)?;
        mutations::register_update_settings(&mut registry, &self.source, &setting_groups)?;

        Ok(registry.freeze())
    }

    /// Runs the bootstrap and assembles the executable schema.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run) and [`FrozenRegistry::build_schema`].
    pub fn build_schema(&self) -> Result<Schema, RegistryError> {
        self.run()?.build_schema(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use wpgraphql_content::{InMemoryContentSource, PostTypeInfo};

    use super::*;
    use crate::registry::{FieldConfig, ObjectConfig};

    struct CountingExtension(Arc<AtomicUsize>);

    impl SchemaExtension for CountingExtension {
        fn name(&self) -> &str {
            "counting"
        }

        fn register(&self, registry: &mut TypeRegistry, _source: &DynContentSource) -> Result<(), RegistryError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            registry.register_object_type("Seo", ObjectConfig::new().field("title", FieldConfig::new("String")))?;
            registry.register_field("Post", "seo", FieldConfig::new("Seo"))
        }
    }

    fn source() -> DynContentSource {
        Arc::new(InMemoryContentSource::new().with_post_type(PostTypeInfo::new("post", "post", "posts")))
    }

    #[test]
    fn test_extension_runs_once_per_registry() {
        let runs = Arc::new(AtomicUsize::new(0));
        let bootstrap = SchemaBootstrap::new(source()).with_extension(CountingExtension(Arc::clone(&runs)));

        let registry = bootstrap.run().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(registry.fields("Post").unwrap().contains_key("seo"));

        bootstrap.run().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_no_unresolved_references_in_core_registry() {
        let registry = SchemaBootstrap::new(source()).run().unwrap();
        assert!(
            registry.unresolved_references().is_empty(),
            "{:?}",
            registry.unresolved_references()
        );
    }
}
