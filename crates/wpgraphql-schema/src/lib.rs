//! # wpgraphql-schema
//!
//! Dynamic type registry and schema assembly for a content-management
//! GraphQL API.
//!
//! Types are registered by name against a mutable [`TypeRegistry`], may
//! reference types that are registered later, and are resolved lazily: the
//! field set of a type is materialized on first read. Higher-level helpers
//! synthesize Relay connections ([`ConnectionConfig`]) and Relay-style
//! mutations ([`MutationConfig`]). Once registration is done,
//! [`TypeRegistry::freeze`] hands out a read-only [`FrozenRegistry`] that
//! assembles an `async_graphql::dynamic::Schema`.
//!
//! [`SchemaBootstrap`] fills a registry from a
//! [`ContentSource`](wpgraphql_content::ContentSource): post types,
//! taxonomies and setting groups become object types, connections, unions
//! and mutations.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wpgraphql_content::{InMemoryContentSource, PostTypeInfo};
//! use wpgraphql_schema::{LazySchema, SchemaBootstrap};
//!
//! let source = Arc::new(
//!     InMemoryContentSource::new().with_post_type(PostTypeInfo::new("post", "post", "posts")),
//! );
//! let schema = LazySchema::new(SchemaBootstrap::new(source));
//!
//! let response = schema
//!     .get_or_build()
//!     .await?
//!     .execute("{ posts(first: 5) { nodes { title } } }")
//!     .await;
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! default_page_size = 10
//! max_page_size = 100
//! ```
//!
//! ## Modules
//!
//! - [`registry`] - Type registry, field and type configuration
//! - [`connection`] - Connection synthesis
//! - [`mutation`] - Mutation synthesis
//! - [`bootstrap`] - Registry bootstrap from a content host
//! - [`schema`] - Schema assembly and lazy loading
//! - [`resolvers`] - Resolvers backed by the content host
//! - [`config`] - Configuration options
//! - [`error`] - Error types

pub mod bootstrap;
pub mod config;
pub mod connection;
pub mod error;
pub mod mutation;
pub mod registry;
pub mod resolvers;
pub mod schema;

pub use bootstrap::{SchemaBootstrap, SchemaExtension};
pub use config::{ROOT_MUTATION, ROOT_QUERY, SchemaConfig};
pub use connection::{ConnectionConfig, PAGE_INFO_TYPE, connection_name};
pub use error::RegistryError;
pub use mutation::{CLIENT_MUTATION_ID, MutateAndGetPayload, MutationConfig};
pub use registry::{
    FieldConfig, FrozenRegistry, ObjectConfig, ResolveFuture, ResolveParams, TypeConfig,
    TypeDefinitions, TypeRefSpec, TypeRegistry, UnresolvedReference,
};
pub use schema::{LazySchema, SchemaState};

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
