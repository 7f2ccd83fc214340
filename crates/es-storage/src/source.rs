//! Display source resolution
//!
//! Media URIs stored in metadata are gateway-agnostic. A [`SourceResolver`]
//! maps them to something an image element can load, so gateway choice can
//! change without touching stored data.

use crate::ipfs::{extract_content_id, IpfsGateway};

/// Maps a media URI to a directly fetchable display URL
pub trait SourceResolver: Send + Sync {
    /// Backend identifier
    fn backend(&self) -> &str;

    /// Display URL for `media_uri`, or `None` when it carries no identifier
    fn resolve(&self, media_uri: &str) -> Option<String>;
}

/// Resolves media URIs through an IPFS HTTP gateway
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpfsGatewaySourceResolver {
    gateway: IpfsGateway,
}

impl IpfsGatewaySourceResolver {
    /// Create resolver for `gateway`
    #[inline]
    #[must_use]
    pub fn new(gateway: IpfsGateway) -> Self {
        Self { gateway }
    }
}

impl SourceResolver for IpfsGatewaySourceResolver {
    fn backend(&self) -> &str {
        "ipfs"
    }

    fn resolve(&self, media_uri: &str) -> Option<String> {
        let id = extract_content_id(media_uri.trim())?;
        self.gateway.url_for(id)
    }
}
