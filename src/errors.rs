//! Error types for IPAM infrastructure operations

use thiserror::Error;

/// Errors that can occur outside the pure domain core
#[derive(Debug, Error)]
pub enum IpamError {
    /// Optimistic concurrency check failed on append
    #[error("Concurrency conflict: expected version {expected}, got {actual}")]
    ConcurrencyConflict { expected: u64, actual: u64 },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Event storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for IPAM infrastructure operations
pub type IpamResult<T> = Result<T, IpamError>;

impl From<serde_json::Error> for IpamError {
    fn from(err: serde_json::Error) -> Self {
        IpamError::Serialization(err.to_string())
    }
}
