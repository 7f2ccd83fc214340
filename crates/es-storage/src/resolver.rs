//! Storage resolvers and the ordered fallback chain
//!
//! A [`StorageResolver`] dereferences a storage pointer against one backend.
//! [`resolve_content`] walks an ordered list of them, strictly one after the
//! other, and returns the first answer. Backends are tried sequentially: some
//! are rate-limited and the order expresses preference.

use crate::error::StorageError;
use crate::ipfs::IpfsGateway;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Untyped JSON returned by a storage backend
pub type RawContent = serde_json::Value;

/// One storage backend able to dereference a pointer
///
/// Implementations fold every failure (non-success status, transport error,
/// undecodable body) into `None`: the chain's contract is "try the next one".
#[async_trait]
pub trait StorageResolver: Send + Sync {
    /// Backend identifier, used for logging
    fn backend(&self) -> &str;

    /// Fetch the content behind `pointer`
    async fn resolve(&self, pointer: &str) -> Option<RawContent>;
}

/// Resolve `pointer` against `resolvers` in order
///
/// Returns the first non-absent content, or `None` once every resolver (or an
/// empty list) has been exhausted.
pub async fn resolve_content(
    pointer: &str,
    resolvers: &[Arc<dyn StorageResolver>],
) -> Option<RawContent> {
    resolve_content_within(pointer, resolvers, None).await
}

/// Resolve `pointer` in order, bounding every attempt by `per_attempt`
///
/// An attempt that does not settle in time counts as absent and the chain
/// moves on. No attempt is retried.
pub async fn resolve_content_within(
    pointer: &str,
    resolvers: &[Arc<dyn StorageResolver>],
    per_attempt: Option<Duration>,
) -> Option<RawContent> {
    for resolver in resolvers {
        let attempt = resolver.resolve(pointer);
        let content = match per_attempt {
            Some(limit) => tokio::time::timeout(limit, attempt).await.unwrap_or_else(|_| {
                tracing::warn!(
                    backend = resolver.backend(),
                    pointer,
                    "storage fetch timed out after {:?}",
                    limit
                );
                None
            }),
            None => attempt.await,
        };

        match content {
            Some(content) if is_present(&content) => {
                tracing::debug!(backend = resolver.backend(), pointer, "content resolved");
                return Some(content);
            }
            _ => {
                tracing::debug!(backend = resolver.backend(), pointer, "backend has no content");
            }
        }
    }

    None
}

/// Whether a backend answer counts as content
///
/// `null`, `false`, `0` and `""` are empty answers; arrays and objects
/// always count, even when empty.
fn is_present(content: &RawContent) -> bool {
    match content {
        RawContent::Null => false,
        RawContent::Bool(flag) => *flag,
        RawContent::Number(n) => n.as_f64().is_some_and(|n| n.abs() > 0.0),
        RawContent::String(s) => !s.is_empty(),
        RawContent::Array(_) | RawContent::Object(_) => true,
    }
}

/// IPFS backend going through an HTTP gateway
#[derive(Debug, Clone)]
pub struct IpfsGatewayStorageResolver {
    client: reqwest::Client,
    gateway: IpfsGateway,
}

impl IpfsGatewayStorageResolver {
    /// Create resolver for a gateway with a default HTTP client
    #[inline]
    #[must_use]
    pub fn new(gateway: IpfsGateway) -> Self {
        Self::with_client(reqwest::Client::new(), gateway)
    }

    /// Create resolver sharing an existing HTTP client
    #[inline]
    #[must_use]
    pub fn with_client(client: reqwest::Client, gateway: IpfsGateway) -> Self {
        Self { client, gateway }
    }

    /// Create resolver whose HTTP client enforces `timeout` per request
    ///
    /// # Errors
    /// - `StorageError::Http` if the client cannot be built
    pub fn with_timeout(gateway: IpfsGateway, timeout: Duration) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, gateway))
    }

    /// Gateway in use
    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &IpfsGateway {
        &self.gateway
    }

    /// Fetch and decode the JSON document behind `pointer`
    ///
    /// # Errors
    /// - `StorageError::NoContentId` if the pointer has no identifier
    /// - `StorageError::Status` on a non-success answer
    /// - `StorageError::Http` / `StorageError::Decode` on transport or body failures
    pub async fn fetch(&self, pointer: &str) -> Result<RawContent, StorageError> {
        let url = self
            .gateway
            .url_for(pointer)
            .ok_or_else(|| StorageError::NoContentId(pointer.to_string()))?;

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl Default for IpfsGatewayStorageResolver {
    fn default() -> Self {
        Self::new(IpfsGateway::default())
    }
}

#[async_trait]
impl StorageResolver for IpfsGatewayStorageResolver {
    fn backend(&self) -> &str {
        "ipfs"
    }

    async fn resolve(&self, pointer: &str) -> Option<RawContent> {
        match self.fetch(pointer).await {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::debug!(pointer, gateway = self.gateway.base(), "ipfs fetch failed: {}", e);
                None
            }
        }
    }
}
