//! Widget façade
//!
//! A [`MediaWidget`] exposes a render slot's configuration as string
//! attributes, the way a host element framework would hand them over. The
//! two variants differ only in [`WidgetKind`]: which attributes they observe
//! and which metadata lookup they issue.
//!
//! Observed attribute changes and connection changes are the only triggers
//! for a new resolution run. Changes are serialized per widget; the
//! attribute state is never locked while the render sink runs.

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::events::WidgetEvent;
use crate::ledger::{Connection, Connector, ProviderRegistry};
use crate::machine::{RenderMachine, RunHandle, RunReport};
use crate::sink::RenderSink;
use crate::types::{CollectionId, ItemId, Lookup, VisualState};
use parking_lot::{Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Network provider selector
pub const ATTR_PROVIDER: &str = "provider";
/// Collection id
pub const ATTR_COLLECTION: &str = "collection";
/// Item id
pub const ATTR_ITEM: &str = "item";

/// Widget variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Collection-level media
    Collection,
    /// Item-level media
    Item,
}

impl WidgetKind {
    /// Element tag name
    #[must_use]
    pub fn tag_name(self) -> &'static str {
        match self {
            Self::Collection => "es-uniques-collection-media",
            Self::Item => "es-uniques-item-media",
        }
    }

    /// Variant registered under `tag`
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        [Self::Collection, Self::Item]
            .into_iter()
            .find(|kind| kind.tag_name().eq_ignore_ascii_case(tag))
    }

    /// Attributes whose changes trigger a run
    #[must_use]
    pub fn observed_attributes(self) -> &'static [&'static str] {
        match self {
            Self::Collection => &[ATTR_COLLECTION, ATTR_PROVIDER],
            Self::Item => &[ATTR_ITEM, ATTR_COLLECTION, ATTR_PROVIDER],
        }
    }

    /// Check whether `name` is observed
    #[inline]
    #[must_use]
    pub fn observes(self, name: &str) -> bool {
        self.observed_attributes().contains(&name)
    }

    /// Metadata lookup this variant performs
    #[inline]
    #[must_use]
    pub fn lookup(self) -> Lookup {
        match self {
            Self::Collection => Lookup::Collection,
            Self::Item => Lookup::Item,
        }
    }
}

/// Parse an id attribute
///
/// Leading whitespace and an optional sign are skipped and the leading
/// digits are read, so `"12abc"` is 12. No digits, zero, negative values and
/// values beyond `u32` are absent.
#[must_use]
pub fn parse_id(value: &str) -> Option<u32> {
    let value = value.trim_start();
    let (negative, rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];

    if digits.is_empty() || negative {
        return None;
    }
    digits.parse::<u32>().ok().filter(|id| *id > 0)
}

/// Work a configuration change set in motion
#[derive(Debug)]
pub enum Pending {
    /// A resolution run
    Run(RunHandle),
    /// A connection attempt, followed by a run if it installs its connection
    Connect(JoinHandle<Option<RunHandle>>),
}

impl Pending {
    /// Wait until the work completes
    ///
    /// Returns the report of the run it led to, if any.
    ///
    /// # Errors
    /// - `RenderError::RunAborted` if the run task panicked
    /// - `RenderError::ConnectAborted` if the connection task panicked
    pub async fn settle(self) -> Result<Option<RunReport>, RenderError> {
        let handle = match self {
            Self::Run(handle) => handle,
            Self::Connect(task) => match task.await {
                Ok(Some(handle)) => handle,
                Ok(None) => return Ok(None),
                Err(err) => {
                    warn!(error = %err, "connection attempt aborted");
                    return Err(RenderError::ConnectAborted(err.to_string()));
                }
            },
        };
        handle.finish().await.map(Some)
    }
}

#[derive(Debug, Default)]
struct WidgetState {
    attributes: BTreeMap<String, String>,
    connection: Option<Connection>,
    connect_attempt: u64,
}

impl WidgetState {
    fn id(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).and_then(|v| parse_id(v))
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            connection: self.connection.clone(),
            collection: self.id(ATTR_COLLECTION).and_then(CollectionId::new),
            item: self.id(ATTR_ITEM).and_then(ItemId::new),
        }
    }

    fn replace_connection(&mut self, connection: Option<Connection>, machine: &RenderMachine) -> bool {
        if self.connection == connection {
            return false;
        }
        self.connection = connection;
        machine.emit(WidgetEvent::ConnectionChanged {
            connection: self.connection.as_ref().map(|c| c.id().clone()),
        });
        true
    }
}

/// Run inputs copied out of the widget state
struct Snapshot {
    connection: Option<Connection>,
    collection: Option<CollectionId>,
    item: Option<ItemId>,
}

impl Snapshot {
    fn apply(self, kind: WidgetKind, machine: &RenderMachine) -> Option<RunHandle> {
        machine.reconfigure(kind.lookup(), self.connection, self.collection, self.item)
    }
}

/// Attribute-driven media widget
///
/// ```rust,ignore
/// let widget = MediaWidget::item(RenderConfig::default(), sink)
///     .with_default_connection(connection);
/// widget.set_collection(Some(11));
/// widget.set_item(Some(1));
/// ```
pub struct MediaWidget {
    kind: WidgetKind,
    machine: RenderMachine,
    providers: ProviderRegistry,
    connector: Option<Arc<dyn Connector>>,
    default_connection: Option<Connection>,
    // Serializes configuration changes; taken before `state`
    ops: Arc<Mutex<()>>,
    state: Arc<Mutex<WidgetState>>,
}

impl MediaWidget {
    /// Create widget of `kind` rendering into `sink`
    #[must_use]
    pub fn new(kind: WidgetKind, config: RenderConfig, sink: Arc<dyn RenderSink>) -> Self {
        Self {
            kind,
            machine: RenderMachine::new(config, sink),
            providers: ProviderRegistry::with_defaults(),
            connector: None,
            default_connection: None,
            ops: Arc::new(Mutex::new(())),
            state: Arc::new(Mutex::new(WidgetState::default())),
        }
    }

    /// Collection-level widget
    #[inline]
    #[must_use]
    pub fn collection(config: RenderConfig, sink: Arc<dyn RenderSink>) -> Self {
        Self::new(WidgetKind::Collection, config, sink)
    }

    /// Item-level widget
    #[inline]
    #[must_use]
    pub fn item(config: RenderConfig, sink: Arc<dyn RenderSink>) -> Self {
        Self::new(WidgetKind::Item, config, sink)
    }

    /// With connector used when the `provider` attribute is set
    #[inline]
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// With provider registry
    #[inline]
    #[must_use]
    pub fn with_providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    /// With shared connection used while no provider is selected
    #[must_use]
    pub fn with_default_connection(mut self, connection: Connection) -> Self {
        {
            let mut state = self.state.lock();
            if !state.attributes.contains_key(ATTR_PROVIDER) {
                state.connection = Some(connection.clone());
            }
        }
        self.default_connection = Some(connection);
        self
    }

    /// Widget variant
    #[inline]
    #[must_use]
    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    /// Underlying state machine
    #[inline]
    #[must_use]
    pub fn machine(&self) -> &RenderMachine {
        &self.machine
    }

    /// Current visual state
    #[must_use]
    pub fn state(&self) -> VisualState {
        self.machine.state()
    }

    /// Current attribute value
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.state.lock().attributes.get(name).cloned()
    }

    /// Current ledger connection
    #[must_use]
    pub fn connection(&self) -> Option<Connection> {
        self.state.lock().connection.clone()
    }

    /// Subscribe to widget events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.machine.subscribe()
    }

    /// Set or remove (`None`) an attribute
    ///
    /// Unchanged values and unobserved attributes start nothing. Returns the
    /// work started otherwise; a configuration missing a required id clears
    /// the slot synchronously and returns `None`.
    pub fn set_attribute(&self, name: &str, value: Option<&str>) -> Option<Pending> {
        let _ops = self.ops.lock();
        let mut state = self.state.lock();
        let old = state.attributes.get(name).cloned();
        if old.as_deref() == value {
            return None;
        }

        match value {
            Some(v) => state.attributes.insert(name.to_string(), v.to_string()),
            None => state.attributes.remove(name),
        };
        self.machine
            .emit(WidgetEvent::attribute(name, old, value.map(str::to_string)));

        if !self.kind.observes(name) {
            debug!(tag = self.kind.tag_name(), attribute = name, "attribute not observed");
            return None;
        }

        if name == ATTR_PROVIDER {
            return self.select_provider(state, value);
        }
        let snapshot = state.snapshot();
        drop(state);
        snapshot.apply(self.kind, &self.machine).map(Pending::Run)
    }

    /// Set the collection id; `None` or zero removes it
    pub fn set_collection(&self, id: Option<u32>) -> Option<Pending> {
        let value = id.filter(|id| *id > 0).map(|id| id.to_string());
        self.set_attribute(ATTR_COLLECTION, value.as_deref())
    }

    /// Set the item id; `None` or zero removes it
    pub fn set_item(&self, id: Option<u32>) -> Option<Pending> {
        let value = id.filter(|id| *id > 0).map(|id| id.to_string());
        self.set_attribute(ATTR_ITEM, value.as_deref())
    }

    /// Select a provider by name; `None` returns to the default connection
    pub fn set_provider(&self, name: Option<&str>) -> Option<Pending> {
        self.set_attribute(ATTR_PROVIDER, name)
    }

    /// Replace the ledger connection directly
    ///
    /// Supersedes any connection attempt in flight.
    pub fn set_connection(&self, connection: Option<Connection>) -> Option<Pending> {
        let _ops = self.ops.lock();
        let snapshot = {
            let mut state = self.state.lock();
            state.connect_attempt += 1;
            if !state.replace_connection(connection, &self.machine) {
                return None;
            }
            state.snapshot()
        };
        snapshot.apply(self.kind, &self.machine).map(Pending::Run)
    }

    /// Re-run resolution for the current configuration
    pub fn refresh(&self) -> Option<Pending> {
        let _ops = self.ops.lock();
        let snapshot = self.state.lock().snapshot();
        snapshot.apply(self.kind, &self.machine).map(Pending::Run)
    }

    /// Caller holds the ops lock
    fn select_provider(
        &self,
        mut state: MutexGuard<'_, WidgetState>,
        name: Option<&str>,
    ) -> Option<Pending> {
        state.connect_attempt += 1;
        let attempt = state.connect_attempt;

        let Some(name) = name else {
            state.replace_connection(self.default_connection.clone(), &self.machine);
            let snapshot = state.snapshot();
            drop(state);
            return snapshot.apply(self.kind, &self.machine).map(Pending::Run);
        };

        // The old connection belongs to the previous provider
        state.replace_connection(None, &self.machine);
        drop(state);
        self.machine.clear();

        let provider = match self.providers.get(name) {
            Ok(provider) => provider.clone(),
            Err(error) => {
                warn!(%error, "cannot select provider");
                return None;
            }
        };
        let Some(connector) = self.connector.clone() else {
            warn!(provider = %provider.name, "no connector configured");
            return None;
        };

        info!(provider = %provider.name, url = %provider.ws_url, attempt, "connecting");
        let ops = Arc::clone(&self.ops);
        let shared = Arc::clone(&self.state);
        let machine = self.machine.clone();
        let kind = self.kind;
        let task = tokio::spawn(async move {
            let result = connector.connect(&provider).await;

            let _ops = ops.lock();
            let snapshot = {
                let mut state = shared.lock();
                if state.connect_attempt != attempt {
                    debug!(provider = %provider.name, attempt, "discarding superseded connection");
                    return None;
                }
                match result {
                    Ok(connection) => {
                        info!(provider = %provider.name, connection = %connection.id(), "connected");
                        state.replace_connection(Some(connection), &machine);
                        state.snapshot()
                    }
                    Err(error) => {
                        warn!(provider = %provider.name, %error, "connection failed");
                        return None;
                    }
                }
            };
            snapshot.apply(kind, &machine)
        });
        Some(Pending::Connect(task))
    }
}

impl std::fmt::Debug for MediaWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaWidget")
            .field("kind", &self.kind)
            .field("machine", &self.machine)
            .field("providers", &self.providers.names())
            .finish_non_exhaustive()
    }
}
