//! Error types for storage resolution
//!
//! These never cross the resolver boundary: a [`StorageResolver`] folds every
//! failure into "absent". They exist so backends can use `?` internally and
//! log a precise reason.
//!
//! [`StorageResolver`]: crate::StorageResolver

use std::time::Duration;

/// Storage backend errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Gateway base URL cannot be used
    #[error("invalid gateway url '{url}': {reason}")]
    InvalidGateway {
        /// Rejected base URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Pointer carries no content identifier
    #[error("no content identifier in pointer '{0}'")]
    NoContentId(String),

    /// Transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway answered with a non-success status
    #[error("gateway returned status {status} for {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Body is not JSON
    #[error("response is not valid json: {0}")]
    Decode(#[from] serde_json::Error),

    /// Fetch did not settle in time
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl StorageError {
    /// Create invalid gateway error
    pub fn invalid_gateway(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGateway {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is a timeout
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Check if another backend might still answer
    ///
    /// Malformed pointers fail the same way everywhere; everything else is
    /// backend-specific.
    #[inline]
    #[must_use]
    pub fn is_backend_specific(&self) -> bool {
        !matches!(self, Self::NoContentId(_) | Self::InvalidGateway { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_display() {
        let err = StorageError::Status {
            status: 404,
            url: "https://gw/ipfs/Qm".to_string(),
        };
        assert_eq!(err.to_string(), "gateway returned status 404 for https://gw/ipfs/Qm");
    }

    #[test]
    fn storage_error_is_timeout() {
        assert!(StorageError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(!StorageError::NoContentId(String::new()).is_timeout());
    }

    #[test]
    fn storage_error_backend_specific() {
        assert!(!StorageError::NoContentId("ipfs://".into()).is_backend_specific());
        assert!(!StorageError::invalid_gateway("x", "y").is_backend_specific());
        assert!(StorageError::Timeout(Duration::from_millis(5)).is_backend_specific());
    }
}
