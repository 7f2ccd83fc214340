//! Estaminet Media
//!
//! Converts the loosely structured JSON found behind a storage pointer into a
//! strict [`MediaDescriptor`], and builds the nodes a render sink displays.
//!
//! ```text
//! RawContent ──normalize──► MediaDescriptor ──create_media_node──► ImageNode
//!                                                 (SourceResolver)
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod descriptor;
pub mod node;

// Re-exports for convenience
pub use descriptor::{normalize, MediaDescriptor, MediaKind};
pub use node::{create_media_node, ImageNode, Placeholder, RenderNode, UnsupportedMedia};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
