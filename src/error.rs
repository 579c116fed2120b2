//! Error types for the cachegate engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CacheGateError>;

/// Error types that can occur in the engine
#[derive(Error, Debug, Clone)]
pub enum CacheGateError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("No cache entry for key: {0}")]
    CacheMiss(String),

    #[error("Warm-set install batch failed: {failed} of {total} resources")]
    InstallBatchFailure { failed: usize, total: usize },

    #[error("Unknown control message kind: {0}")]
    UnknownControlMessage(String),
}

impl CacheGateError {
    /// Whether this error is a transport-level network failure.
    ///
    /// Strategies use this to decide between cache fallback (network failures)
    /// and plain propagation (everything else).
    pub fn is_network_failure(&self) -> bool {
        matches!(self, CacheGateError::NetworkFailure(_))
    }

    /// Create a NetworkFailure from any displayable transport error
    pub fn network(err: impl std::fmt::Display) -> Self {
        CacheGateError::NetworkFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_network_failure() {
        assert!(CacheGateError::network("connection reset").is_network_failure());
        assert!(!CacheGateError::CacheMiss("GET /x".to_string()).is_network_failure());
    }

    #[test]
    fn test_install_batch_failure_message() {
        let err = CacheGateError::InstallBatchFailure { failed: 2, total: 6 };
        assert_eq!(
            err.to_string(),
            "Warm-set install batch failed: 2 of 6 resources"
        );
    }
}
