//! Executable schema assembly and lazy loading.
//!
//! ## Components
//!
//! - `FrozenRegistry::build_schema` - Assembles an async-graphql dynamic
//!   schema from a frozen registry
//! - [`LazySchema`] - Thread-safe lazy schema holder with rebuild support
//!
//! ## Architecture
//!
//! 1. The host starts without waiting for the schema
//! 2. The first request runs the bootstrap and builds the schema
//! 3. Concurrent requests either wait or receive `SchemaInitializing`
//! 4. The schema is cached after a successful build
//! 5. `invalidate()` triggers a rebuild when content metadata changes

mod builder;
mod lazy;

pub use lazy::{LazySchema, SchemaState};
