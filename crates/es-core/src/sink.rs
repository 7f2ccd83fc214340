//! Render sinks
//!
//! The host surface a widget draws into. One slot, always fully replaced.

use es_media::RenderNode;
use parking_lot::Mutex;
use tokio::sync::watch;

/// Single-slot rendering surface
pub trait RenderSink: Send + Sync {
    /// Replace the slot's content with `node`
    ///
    /// Renders are delivered one at a time, in transition order. The
    /// implementation may read the machine or widget that owns it (state,
    /// attributes, connection) but must not reconfigure it from here:
    /// starting, clearing or setting attributes waits for this call to
    /// return.
    fn render(&self, node: RenderNode);
}

/// Hosts observing renders through a channel
impl RenderSink for watch::Sender<RenderNode> {
    fn render(&self, node: RenderNode) {
        self.send_replace(node);
    }
}

/// Sink keeping only the current slot content in memory
#[derive(Debug)]
pub struct SlotSink {
    slot: Mutex<RenderNode>,
}

impl SlotSink {
    /// Create empty slot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(RenderNode::Cleared),
        }
    }

    /// Current content
    #[must_use]
    pub fn current(&self) -> RenderNode {
        self.slot.lock().clone()
    }
}

impl Default for SlotSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSink for SlotSink {
    fn render(&self, node: RenderNode) {
        *self.slot.lock() = node;
    }
}
