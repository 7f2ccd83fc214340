//! IPFS content identifiers and gateway URLs

use crate::error::StorageError;
use reqwest::Url;

/// Gateway used when none is configured
pub const DEFAULT_GATEWAY: &str = "https://gateway.pinata.cloud/ipfs/";

/// Extract the backend-neutral content identifier from a pointer or URI
///
/// The identifier is the final path segment, so `ipfs://ipfs/Qm..`,
/// `ipfs://Qm..`, `https://host/ipfs/Qm..` and a bare `Qm..` all agree.
/// A trailing slash leaves nothing to extract.
#[inline]
#[must_use]
pub fn extract_content_id(data: &str) -> Option<&str> {
    data.rsplit('/').next().filter(|id| !id.is_empty())
}

/// An HTTP gateway serving IPFS content by identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpfsGateway {
    base: String,
}

impl IpfsGateway {
    /// Create gateway from a base URL
    ///
    /// # Errors
    /// - `StorageError::InvalidGateway` if the URL does not parse or is not http(s)
    pub fn new(base: impl Into<String>) -> Result<Self, StorageError> {
        let mut base = base.into();
        let url = Url::parse(&base).map_err(|e| StorageError::invalid_gateway(&base, e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(StorageError::invalid_gateway(
                &base,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self { base })
    }

    /// Base URL, always ending with `/`
    #[inline]
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Fetchable URL for a pointer, if it carries a content identifier
    #[must_use]
    pub fn url_for(&self, data: &str) -> Option<String> {
        extract_content_id(data).map(|id| format!("{}{id}", self.base))
    }
}

impl Default for IpfsGateway {
    fn default() -> Self {
        Self {
            base: DEFAULT_GATEWAY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn extract_from_uri_forms() {
        assert_eq!(extract_content_id("ipfs://Qm123"), Some("Qm123"));
        assert_eq!(extract_content_id("ipfs://ipfs/Qm123"), Some("Qm123"));
        assert_eq!(extract_content_id("https://host/ipfs/Qm123"), Some("Qm123"));
        assert_eq!(extract_content_id("Qm123"), Some("Qm123"));
    }

    #[test]
    fn extract_rejects_empty() {
        assert_eq!(extract_content_id(""), None);
        assert_eq!(extract_content_id("ipfs://Qm123/"), None);
    }

    #[test]
    fn gateway_default_url() {
        let gateway = IpfsGateway::default();
        assert_eq!(
            gateway.url_for("ipfs://Qm456").as_deref(),
            Some("https://gateway.pinata.cloud/ipfs/Qm456")
        );
    }

    #[test]
    fn gateway_appends_slash() {
        let gateway = IpfsGateway::new("https://ipfs.io/ipfs").unwrap();
        assert_eq!(gateway.base(), "https://ipfs.io/ipfs/");
        assert_eq!(gateway.url_for("Qm1").as_deref(), Some("https://ipfs.io/ipfs/Qm1"));
    }

    #[test]
    fn gateway_rejects_bad_urls() {
        assert!(matches!(
            IpfsGateway::new("not a url"),
            Err(StorageError::InvalidGateway { .. })
        ));
        assert!(matches!(
            IpfsGateway::new("ftp://host/ipfs/"),
            Err(StorageError::InvalidGateway { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_extracted_id_has_no_slash(data in ".*") {
            if let Some(id) = extract_content_id(&data) {
                prop_assert!(!id.is_empty());
                prop_assert!(!id.contains('/'));
                prop_assert!(data.ends_with(id));
            }
        }
    }
}
