//! Estaminet Core - media widgets for on-chain collectibles
//!
//! Turns a (connection, collection id, item id) configuration into a rendered
//! image or one of a fixed set of placeholder states:
//!
//! ```text
//! attributes ──► MediaWidget ──► RenderMachine ──► LedgerGateway
//!                                     │                 │ MetadataRecord
//!                                     │                 ▼
//!                                     │         ResolverRegistry (es-storage)
//!                                     │                 │ RawContent
//!                                     │                 ▼
//!                                     │     normalize / create_media_node (es-media)
//!                                     ▼
//!                                 RenderSink
//! ```
//!
//! Only the most recently started run may touch the sink. Every failure
//! along the way ends in a [`VisualState`], never in an error returned to
//! the host.
//!
//! # Example
//!
//! ```rust,ignore
//! use es_core::prelude::*;
//!
//! # async fn example(connection: Connection, sink: Arc<dyn RenderSink>) {
//! let widget = MediaWidget::item(RenderConfig::default(), sink)
//!     .with_default_connection(connection);
//!
//! widget.set_collection(Some(11));
//! if let Some(pending) = widget.set_item(Some(1)) {
//!     pending.settle().await.ok();
//! }
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod machine;
pub mod sink;
pub mod types;
pub mod widget;

// Re-exports for convenience
pub use config::{RenderConfig, Settings, DEFAULT_FETCH_TIMEOUT, DEFAULT_LEDGER_TIMEOUT};
pub use error::{ConfigError, LedgerError, RenderError};
pub use events::WidgetEvent;
pub use ledger::{
    Connection, ConnectionId, Connector, LedgerGateway, MetadataRecord, Provider, ProviderRegistry,
};
pub use machine::{RenderMachine, RunHandle, RunReport};
pub use sink::{RenderSink, SlotSink};
pub use types::{
    CollectionId, ItemId, Lookup, ResolutionRequest, RunId, VisualState, VisualStateKind,
};
pub use widget::{parse_id, MediaWidget, Pending, WidgetKind};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosting media widgets
    pub use crate::{
        CollectionId, Connection, Connector, ItemId, LedgerGateway, MediaWidget, MetadataRecord,
        Pending, Provider, RenderConfig, RenderMachine, RenderSink, VisualState, WidgetEvent,
        WidgetKind,
    };
    pub use es_media::RenderNode;
    pub use std::sync::Arc;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
