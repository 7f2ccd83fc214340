//! Estaminet Storage - content-addressed resolution
//!
//! Turns the opaque storage pointer found in a ledger metadata record into
//! descriptive JSON, and turns media URIs into fetchable display URLs.
//!
//! # Architecture
//!
//! ```text
//! pointer ──► ResolverRegistry ──► [ipfs, fallback, ...] ──► RawContent
//!                 (ordered, first non-absent answer wins)
//!
//! media uri ──► SourceResolver ──► display url
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use es_storage::{ResolverRegistry, resolve_content};
//!
//! # async fn example() {
//! let registry = ResolverRegistry::with_defaults();
//! let content = resolve_content("ipfs://Qm123", &registry.resolvers()).await;
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod ipfs;
pub mod registry;
pub mod resolver;
pub mod source;

// Re-exports for convenience
pub use error::StorageError;
pub use ipfs::{extract_content_id, IpfsGateway, DEFAULT_GATEWAY};
pub use registry::ResolverRegistry;
pub use resolver::{
    resolve_content, resolve_content_within, IpfsGatewayStorageResolver, RawContent,
    StorageResolver,
};
pub use source::{IpfsGatewaySourceResolver, SourceResolver};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with storage resolvers
    pub use crate::{
        resolve_content, IpfsGateway, IpfsGatewaySourceResolver, IpfsGatewayStorageResolver,
        RawContent, ResolverRegistry, SourceResolver, StorageError, StorageResolver,
    };
}
