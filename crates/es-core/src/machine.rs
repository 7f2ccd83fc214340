//! Render state machine
//!
//! Drives one render slot through resolution runs:
//!
//! ```text
//! Idle ──start──► Loading ──run──► Rendered | NoMetadata | NoContent | UnsupportedMedia
//!   │                ▲                              │
//!   └──clear──► EmptyConfiguration ◄────clear───────┘
//!                    └──────────start───────────────► Loading
//! ```
//!
//! Every start or clear bumps the current [`RunId`]. A run applies its outcome
//! only if its id is still the current one. Transitions are serialized by an
//! ordering lock held from the id check through the sink call, so a stale run
//! can never overwrite a newer outcome regardless of completion order. The
//! slot itself is unlocked while the sink runs, so a sink may read
//! [`RenderMachine::state`].

use crate::config::RenderConfig;
use crate::error::{LedgerError, RenderError};
use crate::events::{WidgetEvent, EVENT_CAPACITY};
use crate::ledger::{Connection, MetadataRecord};
use crate::sink::RenderSink;
use crate::types::{CollectionId, ItemId, Lookup, ResolutionRequest, RunId, VisualState};
use es_media::{create_media_node, normalize, Placeholder, RenderNode};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Slot content for a visual state; `None` leaves the slot untouched
fn render_node(state: &VisualState) -> Option<RenderNode> {
    match state {
        VisualState::Idle | VisualState::UnsupportedMedia => None,
        VisualState::Loading => Some(RenderNode::Placeholder(Placeholder::Loading)),
        VisualState::Rendered(image) => Some(RenderNode::Image(image.clone())),
        VisualState::EmptyConfiguration => Some(RenderNode::Cleared),
        VisualState::NoMetadata => Some(RenderNode::Placeholder(Placeholder::NoMetadata)),
        VisualState::NoContent => Some(RenderNode::Placeholder(Placeholder::NoContent)),
    }
}

#[derive(Debug, Default)]
struct Slot {
    latest: RunId,
    state: VisualState,
}

struct Shared {
    config: RenderConfig,
    sink: Arc<dyn RenderSink>,
    // Held across the sink call; taken before `slot`
    order: Mutex<()>,
    slot: Mutex<Slot>,
    events: broadcast::Sender<WidgetEvent>,
}

/// State machine owning one render slot
///
/// Cheap to clone; clones drive the same slot.
#[derive(Clone)]
pub struct RenderMachine {
    shared: Arc<Shared>,
}

impl RenderMachine {
    /// Create machine rendering into `sink`
    #[must_use]
    pub fn new(config: RenderConfig, sink: Arc<dyn RenderSink>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                config,
                sink,
                order: Mutex::new(()),
                slot: Mutex::new(Slot::default()),
                events,
            }),
        }
    }

    /// Configuration this machine runs with
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.shared.config
    }

    /// Current visual state
    #[must_use]
    pub fn state(&self) -> VisualState {
        self.shared.slot.lock().state.clone()
    }

    /// Most recently started run
    #[must_use]
    pub fn latest_run(&self) -> RunId {
        self.shared.slot.lock().latest
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.shared.events.subscribe()
    }

    /// Publish an event to subscribers, if there are any
    pub(crate) fn emit(&self, event: WidgetEvent) {
        let _ = self.shared.events.send(event);
    }

    /// Supersede any run in flight and clear the slot
    ///
    /// Used when the configuration lacks a required id or a connection.
    /// Issues no network call.
    pub fn clear(&self) -> RunId {
        let mut run = RunId::default();
        self.transition(|slot| {
            slot.latest = slot.latest.next();
            run = slot.latest;
            info!(%run, "configuration incomplete, clearing");
            Some(VisualState::EmptyConfiguration)
        });
        run
    }

    /// Start a resolution run for `request`
    ///
    /// The loading placeholder is rendered before this returns. The run itself
    /// executes on a spawned task; dropping the handle detaches it.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self, request: ResolutionRequest) -> RunHandle {
        let mut run = RunId::default();
        self.transition(|slot| {
            slot.latest = slot.latest.next();
            run = slot.latest;
            info!(
                %run,
                connection = %request.connection().id(),
                collection = %request.collection_id(),
                item = ?request.item_id().map(ItemId::get),
                "starting resolution run"
            );
            Some(VisualState::Loading)
        });

        let machine = self.clone();
        let task = tokio::spawn(async move {
            let state = resolve(&machine.shared.config, run, &request).await;
            let applied = machine.apply(run, &state);
            RunReport { run, state, applied }
        });

        RunHandle { run, task }
    }

    /// Start a run if `lookup` has everything it needs, clear otherwise
    ///
    /// Returns the handle of the started run, `None` when cleared.
    pub fn reconfigure(
        &self,
        lookup: Lookup,
        connection: Option<Connection>,
        collection: Option<CollectionId>,
        item: Option<ItemId>,
    ) -> Option<RunHandle> {
        match lookup.request(connection, collection, item) {
            Some(request) => Some(self.start(request)),
            None => {
                self.clear();
                None
            }
        }
    }

    /// Apply `state` if `run` is still the latest; returns whether it was
    fn apply(&self, run: RunId, state: &VisualState) -> bool {
        self.transition(|slot| {
            if slot.latest != run {
                debug!(%run, latest = %slot.latest, outcome = ?state.kind(), "discarding superseded run");
                return None;
            }
            info!(%run, outcome = ?state.kind(), "resolution run finished");
            Some(state.clone())
        })
    }

    /// Move to the state `update` picks, then render it
    ///
    /// `update` runs under the slot lock; `None` leaves everything as is.
    /// Returns whether a transition happened.
    fn transition(&self, update: impl FnOnce(&mut Slot) -> Option<VisualState>) -> bool {
        let _order = self.shared.order.lock();
        let state = {
            let mut slot = self.shared.slot.lock();
            let Some(state) = update(&mut slot) else {
                return false;
            };
            slot.state = state.clone();
            state
        };

        if let Some(node) = render_node(&state) {
            self.shared.sink.render(node);
        }
        self.emit(WidgetEvent::StateChanged(state.kind()));
        true
    }
}

impl std::fmt::Debug for RenderMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.shared.slot.lock();
        f.debug_struct("RenderMachine")
            .field("config", &self.shared.config)
            .field("latest", &slot.latest)
            .field("state", &slot.state.kind())
            .finish_non_exhaustive()
    }
}

/// One resolution run: gateway → storage chain → normalize → source
async fn resolve(config: &RenderConfig, run: RunId, request: &ResolutionRequest) -> VisualState {
    let Some(record) = fetch_metadata(config, run, request).await else {
        return VisualState::NoMetadata;
    };

    let pointer = record.data_pointer.as_str();
    debug!(%run, pointer, "resolving content");
    let Some(raw) = config.resolvers.resolve(pointer, Some(config.fetch_timeout)).await else {
        warn!(%run, pointer, backends = ?config.resolvers.names(), "no storage backend produced content");
        return VisualState::NoContent;
    };

    let descriptor = normalize(&raw);
    match create_media_node(&descriptor, config.source_resolver.as_ref()) {
        Ok(image) => VisualState::Rendered(image),
        Err(reason) => {
            warn!(%run, pointer, %reason, "unsupported media");
            VisualState::UnsupportedMedia
        }
    }
}

async fn fetch_metadata(
    config: &RenderConfig,
    run: RunId,
    request: &ResolutionRequest,
) -> Option<MetadataRecord> {
    let gateway = request.connection().gateway();
    let collection = request.collection_id();
    let call = async {
        match request.item_id() {
            Some(item) => gateway.item_metadata(collection, item).await,
            None => gateway.collection_metadata(collection).await,
        }
    };

    let result = tokio::time::timeout(config.ledger_timeout, call)
        .await
        .unwrap_or(Err(LedgerError::Timeout(config.ledger_timeout)));

    match result {
        Ok(Some(record)) => Some(record),
        Ok(None) => {
            debug!(%run, %collection, "ledger holds no metadata");
            None
        }
        Err(error) => {
            warn!(%run, %collection, %error, "metadata lookup failed");
            None
        }
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Run identity
    pub run: RunId,
    /// Terminal state the run reached
    pub state: VisualState,
    /// Whether the state was applied, i.e. the run was not superseded
    pub applied: bool,
}

/// Handle on a spawned resolution run
#[derive(Debug)]
pub struct RunHandle {
    run: RunId,
    task: JoinHandle<RunReport>,
}

impl RunHandle {
    /// Run identity
    #[inline]
    #[must_use]
    pub fn run(&self) -> RunId {
        self.run
    }

    /// Check whether the run has completed
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to complete
    ///
    /// # Errors
    /// - `RenderError::RunAborted` if the run task panicked or was cancelled
    pub async fn finish(self) -> Result<RunReport, RenderError> {
        self.task.await.map_err(|err| {
            error!(run = %self.run, error = %err, "resolution run aborted");
            RenderError::RunAborted {
                run: self.run,
                reason: err.to_string(),
            }
        })
    }
}
