//! Lazy schema loading implementation.
//!
//! This module provides `LazySchema`, a thread-safe wrapper that defers the
//! registry bootstrap and schema assembly until first access. A host can
//! start serving immediately and rebuild the schema when its content
//! metadata (post types, taxonomies, setting groups) changes.

use std::sync::Arc;

use async_graphql::dynamic::Schema;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::bootstrap::SchemaBootstrap;
use crate::error::RegistryError;

/// State of the lazy schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// Schema has not been built yet.
    Uninitialized,
    /// Schema is currently being built.
    Building,
    /// Schema is ready for use.
    Ready,
    /// Schema build failed.
    Failed,
}

/// What the holder currently has to offer.
enum Slot {
    Empty,
    Building,
    Ready(Arc<Schema>),
    Failed(String),
}

impl Slot {
    fn state(&self) -> SchemaState {
        match self {
            Self::Empty => SchemaState::Uninitialized,
            Self::Building => SchemaState::Building,
            Self::Ready(_) => SchemaState::Ready,
            Self::Failed(_) => SchemaState::Failed,
        }
    }

    /// The outcome of a finished build, if there is one.
    fn settled(&self) -> Option<Result<Arc<Schema>, RegistryError>> {
        match self {
            Self::Ready(schema) => Some(Ok(Arc::clone(schema))),
            Self::Failed(message) => Some(Err(RegistryError::SchemaBuild(message.clone()))),
            Self::Empty | Self::Building => None,
        }
    }
}

/// Thread-safe lazy schema holder.
///
/// A failed build is remembered: later calls return
/// `RegistryError::SchemaBuild` with the recorded message until
/// [`invalidate`](Self::invalidate) is called.
///
/// # Example
///
/// ```ignore
/// let lazy_schema = LazySchema::new(SchemaBootstrap::new(source));
///
/// // First access runs the bootstrap and builds the schema
/// let schema = lazy_schema.get_or_build().await?;
///
/// // Content metadata changed: rebuild on next access
/// lazy_schema.invalidate().await;
/// ```
pub struct LazySchema {
    slot: RwLock<Slot>,
    /// Held for the whole bootstrap so only one build runs at a time.
    build_lock: Mutex<()>,
    bootstrap: SchemaBootstrap,
}

impl LazySchema {
    /// Creates a new lazy schema for the given bootstrap.
    #[must_use]
    pub fn new(bootstrap: SchemaBootstrap) -> Self {
        Self {
            slot: RwLock::new(Slot::Empty),
            build_lock: Mutex::new(()),
            bootstrap,
        }
    }

    /// Returns the current state of the schema.
    pub async fn state(&self) -> SchemaState {
        self.slot.read().await.state()
    }

    /// Gets the schema, building it if necessary.
    ///
    /// Callers arriving while a build is in progress get an error instead of
    /// waiting; use `get_or_build_wait()` where waiting is acceptable.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::SchemaInitializing` if another build is in
    /// progress, the bootstrap error if this call's build fails, or
    /// `RegistryError::SchemaBuild` for a remembered failure.
    pub async fn get_or_build(&self) -> Result<Arc<Schema>, RegistryError> {
        if let Some(outcome) = self.slot.read().await.settled() {
            return outcome;
        }
        let Ok(_guard) = self.build_lock.try_lock() else {
            return Err(RegistryError::SchemaInitializing);
        };
        self.build_locked().await
    }

    /// Gets the schema, building it if necessary, and waits for an
    /// in-progress build to complete.
    ///
    /// # Errors
    ///
    /// Returns the bootstrap error if this call's build fails, or
    /// `RegistryError::SchemaBuild` for a remembered failure.
    pub async fn get_or_build_wait(&self) -> Result<Arc<Schema>, RegistryError> {
        if let Some(outcome) = self.slot.read().await.settled() {
            return outcome;
        }
        let _guard = self.build_lock.lock().await;
        self.build_locked().await
    }

    /// Builds unless another caller settled the slot first. Callers hold the
    /// build lock.
    async fn build_locked(&self) -> Result<Arc<Schema>, RegistryError> {
        if let Some(outcome) = self.slot.read().await.settled() {
            return outcome;
        }
        *self.slot.write().await = Slot::Building;
        info!("Building GraphQL schema...");

        let result = self.bootstrap.build_schema().map(Arc::new);
        let mut slot = self.slot.write().await;
        match &result {
            Ok(schema) => {
                *slot = Slot::Ready(Arc::clone(schema));
                info!("GraphQL schema built successfully");
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Failed to build GraphQL schema");
                *slot = Slot::Failed(e.to_string());
            }
        }
        result
    }

    /// Gets the schema if it's already built, without triggering a build.
    pub async fn get(&self) -> Option<Arc<Schema>> {
        match &*self.slot.read().await {
            Slot::Ready(schema) => Some(Arc::clone(schema)),
            _ => None,
        }
    }

    /// Drops the cached schema or remembered failure; the next call rebuilds.
    pub async fn invalidate(&self) {
        let _guard = self.build_lock.lock().await;
        *self.slot.write().await = Slot::Empty;
        info!("GraphQL schema invalidated - will rebuild on next request");
    }

    /// Returns the last build error, if any.
    pub async fn last_error(&self) -> Option<String> {
        match &*self.slot.read().await {
            Slot::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Returns whether the schema is ready for use.
    pub async fn is_ready(&self) -> bool {
        matches!(*self.slot.read().await, Slot::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wpgraphql_content::{InMemoryContentSource, PostTypeInfo};

    use super::*;
    use crate::bootstrap::SchemaExtension;
    use crate::registry::TypeRegistry;

    struct FailingExtension;

    impl SchemaExtension for FailingExtension {
        fn name(&self) -> &str {
            "failing"
        }

        fn register(
            &self,
            _registry: &mut TypeRegistry,
            _source: &wpgraphql_content::DynContentSource,
        ) -> Result<(), RegistryError> {
            Err(RegistryError::InvalidDefinition {
                name: "Broken".into(),
                message: "always fails".into(),
            })
        }
    }

    fn source() -> wpgraphql_content::DynContentSource {
        Arc::new(InMemoryContentSource::new().with_post_type(PostTypeInfo::new("post", "post", "posts")))
    }

    #[tokio::test]
    async fn test_builds_once_and_caches() {
        let lazy = LazySchema::new(SchemaBootstrap::new(source()));
        assert_eq!(lazy.state().await, SchemaState::Uninitialized);
        assert!(lazy.get().await.is_none());

        let first = lazy.get_or_build().await.unwrap();
        let second = lazy.get_or_build().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(lazy.is_ready().await);
    }

    #[tokio::test]
    async fn test_invalidate_forces_rebuild() {
        let lazy = LazySchema::new(SchemaBootstrap::new(source()));
        let first = lazy.get_or_build_wait().await.unwrap();

        lazy.invalidate().await;
        assert_eq!(lazy.state().await, SchemaState::Uninitialized);

        let second = lazy.get_or_build_wait().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_failure_is_remembered() {
        let lazy = LazySchema::new(SchemaBootstrap::new(source()).with_extension(FailingExtension));

        let err = lazy.get_or_build().await.err().unwrap();
        assert!(matches!(err, RegistryError::Extension { .. }));
        assert_eq!(lazy.state().await, SchemaState::Failed);
        assert!(lazy.last_error().await.unwrap().contains("failing"));

        let err = lazy.get_or_build().await.err().unwrap();
        assert!(matches!(err, RegistryError::SchemaBuild(_)));
        let err = lazy.get_or_build_wait().await.err().unwrap();
        assert!(matches!(err, RegistryError::SchemaBuild(_)));

        lazy.invalidate().await;
        assert_eq!(lazy.state().await, SchemaState::Uninitialized);
        assert!(lazy.last_error().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_caller_sees_initializing() {
        let lazy = LazySchema::new(SchemaBootstrap::new(source()));
        let guard = lazy.build_lock.lock().await;

        let err = lazy.get_or_build().await.err().unwrap();
        assert!(matches!(err, RegistryError::SchemaInitializing));
        assert_eq!(err.error_code(), "SCHEMA_INITIALIZING");

        drop(guard);
        assert!(lazy.get_or_build().await.is_ok());
    }
}
