//! Core error types shared across the workspace.

use thiserror::Error;

use crate::types::RecommendationStatus;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A recommendation was already resolved and cannot transition again.
    #[error("Recommendation {id} already resolved: {status}")]
    AlreadyResolved {
        id: String,
        status: RecommendationStatus,
    },

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// External gateway error (weather, device gateway, hardware channel).
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// LLM runtime error.
    #[error("LLM error: {0}")]
    Llm(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<crate::llm::LlmError> for Error {
    fn from(e: crate::llm::LlmError) -> Self {
        Error::Llm(e.to_string())
    }
}
