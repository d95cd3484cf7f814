//! Error types for the memory crate.

use thiserror::Error;

/// Result type for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors that can occur in the memory tiers.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Backing store failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<homewise_core::Error> for MemoryError {
    fn from(e: homewise_core::Error) -> Self {
        match e {
            homewise_core::Error::Serialization(s) => MemoryError::Serialization(s),
            other => MemoryError::Storage(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for MemoryError {
    fn from(e: serde_json::Error) -> Self {
        MemoryError::Serialization(e.to_string())
    }
}
