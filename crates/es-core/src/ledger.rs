//! Ledger access contract
//!
//! Dialing a provider and speaking the ledger's wire protocol happen outside
//! this crate. The core only consumes:
//! - [`LedgerGateway`]: metadata lookups by numeric id
//! - [`Connector`]: turns a [`Provider`] into a [`Connection`]

use crate::error::LedgerError;
use crate::types::{CollectionId, ItemId};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// On-chain metadata record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Storage pointer to the descriptive JSON document
    #[serde(rename = "data")]
    pub data_pointer: String,
    /// Remaining ledger fields, opaque to the core
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MetadataRecord {
    /// Create record pointing at `data_pointer`
    #[inline]
    #[must_use]
    pub fn new(data_pointer: impl Into<String>) -> Self {
        Self {
            data_pointer: data_pointer.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Metadata queries against one ledger connection
///
/// `Ok(None)` means the ledger holds no record; `Err` means the query itself
/// failed. Callers abandon a lookup by dropping its future.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Collection-level metadata
    async fn collection_metadata(
        &self,
        collection: CollectionId,
    ) -> Result<Option<MetadataRecord>, LedgerError>;

    /// Item-level metadata
    async fn item_metadata(
        &self,
        collection: CollectionId,
        item: ItemId,
    ) -> Result<Option<MetadataRecord>, LedgerError>;
}

/// Identity of a ledger connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared, read-only handle on a ledger
///
/// Externally owned: the core never mutates it, and a fresh connection and a
/// previously shared one are interchangeable.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    gateway: Arc<dyn LedgerGateway>,
}

impl Connection {
    /// Wrap a gateway under `id`
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, gateway: Arc<dyn LedgerGateway>) -> Self {
        Self {
            id: ConnectionId::new(id),
            gateway,
        }
    }

    /// Connection identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Gateway for metadata queries
    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn LedgerGateway> {
        &self.gateway
    }
}

impl PartialEq for Connection {
    /// Same identity and the very same gateway instance
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && std::ptr::eq(
                Arc::as_ptr(&self.gateway).cast::<()>(),
                Arc::as_ptr(&other.gateway).cast::<()>(),
            )
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish_non_exhaustive()
    }
}

/// A ledger endpoint selectable by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Name used in the `provider` attribute
    pub name: String,
    /// Websocket endpoint
    pub ws_url: String,
}

impl Provider {
    /// Create provider
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ws_url: ws_url.into(),
        }
    }
}

/// Named providers, in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRegistry {
    providers: IndexMap<String, Provider>,
}

impl ProviderRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the well-known parachains
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Provider::new("statemine", "wss://statemine-rpc.polkadot.io"));
        registry.register(Provider::new("statemint", "wss://statemint-rpc.polkadot.io"));
        registry.register(Provider::new("westmint", "wss://westmint-rpc.polkadot.io"));
        registry.register(Provider::new("rockmine", "wss://rococo-rockmine-rpc.polkadot.io"));
        registry
    }

    /// Register or replace a provider
    pub fn register(&mut self, provider: Provider) -> Option<Provider> {
        self.providers.insert(provider.name.clone(), provider)
    }

    /// Look up a provider by name
    ///
    /// # Errors
    /// - `LedgerError::UnknownProvider` if no provider has that name
    pub fn get(&self, name: &str) -> Result<&Provider, LedgerError> {
        self.providers
            .get(name)
            .ok_or_else(|| LedgerError::UnknownProvider(name.to_string()))
    }

    /// Providers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values()
    }

    /// Registered names
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Get number of providers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Establishes ledger connections
#[async_trait]
pub trait Connector: Send + Sync {
    /// Dial `provider` and return a queryable connection
    async fn connect(&self, provider: &Provider) -> Result<Connection, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty;

    #[async_trait]
    impl LedgerGateway for Empty {
        async fn collection_metadata(
            &self,
            _collection: CollectionId,
        ) -> Result<Option<MetadataRecord>, LedgerError> {
            Ok(None)
        }

        async fn item_metadata(
            &self,
            _collection: CollectionId,
            _item: ItemId,
        ) -> Result<Option<MetadataRecord>, LedgerError> {
            Ok(None)
        }
    }

    #[test]
    fn metadata_record_from_ledger_json() {
        let record: MetadataRecord = serde_json::from_value(serde_json::json!({
            "data": "ipfs://Qm123",
            "deposit": 0,
            "isFrozen": false
        }))
        .unwrap();

        assert_eq!(record.data_pointer, "ipfs://Qm123");
        assert_eq!(record.extra.len(), 2);
    }

    #[test]
    fn connection_identity() {
        let gateway: Arc<dyn LedgerGateway> = Arc::new(Empty);
        let a = Connection::new("statemine", Arc::clone(&gateway));
        let b = Connection::new("statemine", Arc::clone(&gateway));
        let c = Connection::new("statemine", Arc::new(Empty));
        let d = Connection::new("westmint", gateway);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(format!("{a:?}"), r#"Connection { id: ConnectionId("statemine"), .. }"#);
    }

    #[test]
    fn provider_registry_defaults() {
        let registry = ProviderRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["statemine", "statemint", "westmint", "rockmine"]);
        assert_eq!(
            registry.get("westmint").map(|p| p.ws_url.as_str()),
            Ok("wss://westmint-rpc.polkadot.io")
        );
    }

    #[test]
    fn provider_registry_unknown() {
        let registry = ProviderRegistry::with_defaults();
        assert_eq!(
            registry.get("kusama"),
            Err(LedgerError::UnknownProvider("kusama".to_string()))
        );
    }
}
