//! Widget notifications
//!
//! Published on a `tokio::sync::broadcast` channel. Slow subscribers lag and
//! miss events rather than blocking a widget.

use crate::ledger::ConnectionId;
use crate::types::VisualStateKind;
use serde::{Deserialize, Serialize};

/// Default capacity of a widget's event channel
pub const EVENT_CAPACITY: usize = 64;

/// Something observable happened to a widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WidgetEvent {
    /// An attribute value changed; `None` means unset
    AttributeChanged {
        /// Attribute name
        name: String,
        /// Value before the change
        old: Option<String>,
        /// Value after the change
        new: Option<String>,
    },
    /// The ledger connection was replaced or dropped
    ConnectionChanged {
        /// New connection, if any
        connection: Option<ConnectionId>,
    },
    /// The visual state changed
    StateChanged(VisualStateKind),
}

impl WidgetEvent {
    /// Attribute change event
    #[must_use]
    pub fn attribute(name: impl Into<String>, old: Option<String>, new: Option<String>) -> Self {
        Self::AttributeChanged {
            name: name.into(),
            old,
            new,
        }
    }
}
