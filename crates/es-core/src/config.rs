//! Configuration
//!
//! [`RenderConfig`] is what a state machine runs with: resolver chain, source
//! resolver and timeouts, passed in explicitly at construction. [`Settings`]
//! is its serializable form, loadable from TOML.

use crate::error::ConfigError;
use crate::ledger::{Provider, ProviderRegistry};
use es_storage::{
    IpfsGateway, IpfsGatewaySourceResolver, IpfsGatewayStorageResolver, ResolverRegistry,
    SourceResolver, StorageResolver, DEFAULT_GATEWAY,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Default bound on a ledger metadata call
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on one storage fetch attempt
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration of a render state machine
///
/// Override points: [`with_resolvers`](Self::with_resolvers),
/// [`with_resolver`](Self::with_resolver),
/// [`with_source_resolver`](Self::with_source_resolver) and the timeouts.
#[derive(Clone)]
pub struct RenderConfig {
    /// Storage backends in fallback order
    pub resolvers: ResolverRegistry,
    /// Media URI → display URL
    pub source_resolver: Arc<dyn SourceResolver>,
    /// Bound on the metadata lookup; elapsed counts as no metadata
    pub ledger_timeout: Duration,
    /// Bound on each storage attempt; elapsed counts as absent
    pub fetch_timeout: Duration,
}

impl RenderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With resolver chain
    #[inline]
    #[must_use]
    pub fn with_resolvers(mut self, resolvers: ResolverRegistry) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// With one more resolver, lowest priority unless `name` is already registered
    #[inline]
    #[must_use]
    pub fn with_resolver(mut self, name: impl Into<String>, resolver: Arc<dyn StorageResolver>) -> Self {
        self.resolvers.register(name, resolver);
        self
    }

    /// With source resolver
    #[inline]
    #[must_use]
    pub fn with_source_resolver(mut self, source_resolver: Arc<dyn SourceResolver>) -> Self {
        self.source_resolver = source_resolver;
        self
    }

    /// With ledger timeout
    #[inline]
    #[must_use]
    pub fn with_ledger_timeout(mut self, timeout: Duration) -> Self {
        self.ledger_timeout = timeout;
        self
    }

    /// With storage fetch timeout
    #[inline]
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            resolvers: ResolverRegistry::with_defaults(),
            source_resolver: Arc::new(IpfsGatewaySourceResolver::default()),
            ledger_timeout: DEFAULT_LEDGER_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderConfig")
            .field("resolvers", &self.resolvers)
            .field("source_resolver", &self.source_resolver.backend())
            .field("ledger_timeout", &self.ledger_timeout)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

/// Serializable settings
///
/// ```toml
/// gateway = "https://ipfs.io/ipfs/"
/// ledger_timeout_ms = 10000
/// fetch_timeout_ms = 15000
///
/// [providers]
/// local = "ws://127.0.0.1:9944"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IPFS gateway base URL
    pub gateway: String,
    /// Ledger timeout in milliseconds
    pub ledger_timeout_ms: u64,
    /// Storage fetch timeout in milliseconds
    pub fetch_timeout_ms: u64,
    /// Provider name → websocket URL
    pub providers: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gateway: DEFAULT_GATEWAY.to_string(),
            ledger_timeout_ms: millis(DEFAULT_LEDGER_TIMEOUT),
            fetch_timeout_ms: millis(DEFAULT_FETCH_TIMEOUT),
            providers: ProviderRegistry::with_defaults()
                .iter()
                .map(|p| (p.name.clone(), p.ws_url.clone()))
                .collect(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Settings {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - `ConfigError::Invalid` / `ConfigError::Storage` from [`validate`](Self::validate)
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - anything [`from_toml_str`](Self::from_toml_str) returns
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// - `ConfigError::Storage` if the gateway URL is unusable
    /// - `ConfigError::Invalid` for zero timeouts or non-websocket providers
    pub fn validate(&self) -> Result<(), ConfigError> {
        IpfsGateway::new(self.gateway.as_str())?;

        if self.ledger_timeout_ms == 0 {
            return Err(ConfigError::invalid("ledger_timeout_ms", "must be greater than 0"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::invalid("fetch_timeout_ms", "must be greater than 0"));
        }

        for (name, url) in &self.providers {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(ConfigError::invalid(
                    "providers",
                    format!("provider '{name}' is not a websocket url: {url}"),
                ));
            }
        }

        Ok(())
    }

    /// Build the runtime configuration
    ///
    /// The IPFS gateway serves both metadata documents and display URLs.
    ///
    /// # Errors
    /// - `ConfigError::Storage` if the gateway or HTTP client cannot be built
    pub fn render_config(&self) -> Result<RenderConfig, ConfigError> {
        let gateway = IpfsGateway::new(self.gateway.as_str())?;
        let fetch_timeout = Duration::from_millis(self.fetch_timeout_ms);
        let storage = IpfsGatewayStorageResolver::with_timeout(gateway.clone(), fetch_timeout)?;

        Ok(RenderConfig {
            resolvers: ResolverRegistry::new().with("ipfs", Arc::new(storage)),
            source_resolver: Arc::new(IpfsGatewaySourceResolver::new(gateway)),
            ledger_timeout: Duration::from_millis(self.ledger_timeout_ms),
            fetch_timeout,
        })
    }

    /// Build the provider registry
    #[must_use]
    pub fn provider_registry(&self) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for (name, url) in &self.providers {
            registry.register(Provider::new(name.as_str(), url.as_str()));
        }
        registry
    }
}
