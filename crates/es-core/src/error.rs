//! Error types for Estaminet Core
//!
//! Provides error handling for:
//! - Ledger queries and connections
//! - Configuration loading
//! - Aborted resolution runs
//!
//! None of these reach the render slot: the state machine maps every
//! failure to a visual state and logs the cause.

use crate::types::RunId;
use es_storage::StorageError;
use std::path::PathBuf;
use std::time::Duration;

/// Ledger gateway errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Could not reach the provider
    #[error("connection failed: {0}")]
    Connection(String),

    /// Provider name not in the registry
    #[error("unknown provider: '{0}'")]
    UnknownProvider(String),

    /// Query reached the ledger but failed
    #[error("query failed: {0}")]
    Query(String),

    /// Call did not settle in time
    #[error("ledger call timed out after {0:?}")]
    Timeout(Duration),
}

impl LedgerError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Settings file unreadable
    #[error("io error reading {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Settings document is not valid TOML
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Settings key
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Storage backend could not be built
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ConfigError {
    /// Create invalid value error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Failures surfacing from the widget machinery itself
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A run task panicked or was cancelled before reporting
    #[error("run {run} aborted: {reason}")]
    RunAborted {
        /// Run that never reported
        run: RunId,
        /// Join error text
        reason: String,
    },

    /// A connection attempt task panicked or was cancelled
    #[error("connection attempt aborted: {0}")]
    ConnectAborted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_error_display() {
        let err = LedgerError::UnknownProvider("kusama".to_string());
        assert_eq!(err.to_string(), "unknown provider: 'kusama'");
    }

    #[test]
    fn ledger_error_is_retryable() {
        assert!(LedgerError::Connection("reset".into()).is_retryable());
        assert!(LedgerError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!LedgerError::Query("bad id".into()).is_retryable());
    }

    #[test]
    fn config_error_invalid() {
        let err = ConfigError::invalid("ledger_timeout_ms", "must be greater than 0");
        assert!(err.to_string().contains("ledger_timeout_ms"));
    }

    #[test]
    fn render_error_display() {
        let err = RenderError::RunAborted {
            run: RunId(7),
            reason: "panicked".to_string(),
        };
        assert_eq!(err.to_string(), "run #7 aborted: panicked");
    }
}
