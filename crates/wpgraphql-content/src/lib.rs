//! # wpgraphql-content
//!
//! Content-host abstraction for the WPGraphQL schema registry.
//!
//! The schema crate never talks to a database directly. It asks a
//! [`ContentSource`] which post types, taxonomies and setting groups exist
//! (to decide which dynamic types to register) and routes generated
//! resolvers through the same trait.
//!
//! ## Example
//!
//! ```ignore
//! use wpgraphql_content::{ContentKind, ContentQuery, ContentSource, InMemoryContentSource, PostTypeInfo};
//!
//! let source = InMemoryContentSource::new()
//!     .with_post_type(PostTypeInfo::new("post", "post", "posts"));
//!
//! let drafts = source
//!     .find(&ContentKind::Post("post".into()), &ContentQuery::new().with_filter("status", "draft"))
//!     .await?;
//! ```
//!
//! ## Content Hosts
//!
//! To plug in a real host, implement the [`ContentSource`] trait:
//!
//! ```ignore
//! use async_trait::async_trait;
//! use wpgraphql_content::{ContentError, ContentSource};
//!
//! struct RestHost {
//!     // ...
//! }
//!
//! #[async_trait]
//! impl ContentSource for RestHost {
//!     // ...
//! }
//! ```

mod error;
pub mod memory;
mod traits;
mod types;

pub use error::{ContentError, ErrorCategory};
pub use memory::InMemoryContentSource;
pub use traits::ContentSource;
pub use types::{
    ContentItem, ContentKind, ContentQuery, ContentRef, PostTypeInfo, SettingField, SettingGroup,
    SettingKind, TaxonomyInfo,
};

/// Type alias for a content result.
pub type ContentResult<T> = Result<T, ContentError>;

/// Type alias for a shared content host trait object.
pub type DynContentSource = std::sync::Arc<dyn ContentSource>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use wpgraphql_content::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ContentError, ErrorCategory};
    pub use crate::memory::InMemoryContentSource;
    pub use crate::traits::ContentSource;
    pub use crate::types::{
        ContentItem, ContentKind, ContentQuery, ContentRef, PostTypeInfo, SettingField,
        SettingGroup, SettingKind, TaxonomyInfo,
    };
    pub use crate::{ContentResult, DynContentSource};
}
