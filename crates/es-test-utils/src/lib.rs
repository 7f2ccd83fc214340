//! Testing utilities for Estaminet workspace
//!
//! Shared fakes for the collaborators a widget talks to: ledger, storage
//! backends, connector and render sink.

#![allow(missing_docs)]

use async_trait::async_trait;
use es_core::{
    CollectionId, Connection, Connector, ItemId, LedgerError, LedgerGateway, MetadataRecord,
    Provider, RenderSink,
};
use es_media::RenderNode;
use es_storage::{RawContent, StorageResolver};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Once};
use std::time::Duration;

static TRACE_INIT: Once = Once::new();

/// Install a test subscriber honouring `RUST_LOG`, once per process
pub fn init_tracing() {
    TRACE_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Ledger query as seen by [`InMemoryLedger`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub collection: u32,
    pub item: Option<u32>,
}

impl LedgerKey {
    pub fn collection(collection: u32) -> Self {
        Self { collection, item: None }
    }

    pub fn item(collection: u32, item: u32) -> Self {
        Self {
            collection,
            item: Some(item),
        }
    }
}

/// Ledger backed by a map, with optional per-key latency and failures
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: HashMap<LedgerKey, MetadataRecord>,
    delays: HashMap<LedgerKey, Duration>,
    failures: HashMap<LedgerKey, LedgerError>,
    calls: Mutex<Vec<LedgerKey>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: u32, pointer: &str) -> Self {
        self.records
            .insert(LedgerKey::collection(collection), MetadataRecord::new(pointer));
        self
    }

    pub fn with_item(mut self, collection: u32, item: u32, pointer: &str) -> Self {
        self.records
            .insert(LedgerKey::item(collection, item), MetadataRecord::new(pointer));
        self
    }

    /// Answer queries for `key` only after `delay`
    pub fn with_delay(mut self, key: LedgerKey, delay: Duration) -> Self {
        self.delays.insert(key, delay);
        self
    }

    pub fn with_failure(mut self, key: LedgerKey, error: LedgerError) -> Self {
        self.failures.insert(key, error);
        self
    }

    /// Every query received, in order
    pub fn calls(&self) -> Vec<LedgerKey> {
        self.calls.lock().clone()
    }

    async fn lookup(&self, key: LedgerKey) -> Result<Option<MetadataRecord>, LedgerError> {
        self.calls.lock().push(key);
        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(error) = self.failures.get(&key) {
            return Err(error.clone());
        }
        Ok(self.records.get(&key).cloned())
    }

    /// Wrap into a connection named `id`
    pub fn into_connection(self, id: &str) -> (Connection, Arc<Self>) {
        let ledger = Arc::new(self);
        (Connection::new(id, ledger.clone()), ledger)
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn collection_metadata(
        &self,
        collection: CollectionId,
    ) -> Result<Option<MetadataRecord>, LedgerError> {
        self.lookup(LedgerKey::collection(collection.get())).await
    }

    async fn item_metadata(
        &self,
        collection: CollectionId,
        item: ItemId,
    ) -> Result<Option<MetadataRecord>, LedgerError> {
        self.lookup(LedgerKey::item(collection.get(), item.get())).await
    }
}

/// Storage backend answering from a script
#[derive(Debug)]
pub struct ScriptedResolver {
    name: String,
    content: HashMap<String, RawContent>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedResolver {
    /// Backend that knows nothing
    pub fn absent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            content: HashMap::new(),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_content(mut self, pointer: &str, content: RawContent) -> Self {
        self.content.insert(pointer.to_string(), content);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared log of pointers this backend was asked for
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl StorageResolver for ScriptedResolver {
    fn backend(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, pointer: &str) -> Option<RawContent> {
        self.calls.lock().push(pointer.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.content.get(pointer).cloned()
    }
}

/// Sink keeping every node it was handed
#[derive(Debug, Default)]
pub struct RecordingSink {
    nodes: Mutex<Vec<RenderNode>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn history(&self) -> Vec<RenderNode> {
        self.nodes.lock().clone()
    }

    pub fn last(&self) -> Option<RenderNode> {
        self.nodes.lock().last().cloned()
    }

    /// Display URL of the last rendered image
    pub fn last_src(&self) -> Option<String> {
        self.last()
            .and_then(|node| node.as_image().map(|image| image.src.clone()))
    }
}

impl RenderSink for RecordingSink {
    fn render(&self, node: RenderNode) {
        self.nodes.lock().push(node);
    }
}

/// Connector handing out prepared connections
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    connections: HashMap<String, (Connection, Duration)>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect to `provider` after `delay`
    pub fn with_connection(mut self, provider: &str, connection: Connection, delay: Duration) -> Self {
        self.connections
            .insert(provider.to_string(), (connection, delay));
        self
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, provider: &Provider) -> Result<Connection, LedgerError> {
        let Some((connection, delay)) = self.connections.get(&provider.name) else {
            return Err(LedgerError::Connection(format!("{} unreachable", provider.ws_url)));
        };
        tokio::time::sleep(*delay).await;
        Ok(connection.clone())
    }
}
