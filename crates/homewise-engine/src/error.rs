//! Error types for the recommendation engine.

use thiserror::Error;

use homewise_core::types::RecommendationStatus;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the engine facade and its components.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No recommendation record with the given id.
    #[error("Recommendation not found: {0}")]
    NotFound(String),

    /// The record already left `Pending` and cannot transition again.
    #[error("Recommendation {id} already resolved: {status}")]
    AlreadyResolved {
        id: String,
        status: RecommendationStatus,
    },

    /// Storage failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Memory subsystem failure.
    #[error("Memory error: {0}")]
    Memory(String),

    /// LLM runtime failure (transport-level; malformed output is recovered
    /// before it gets here).
    #[error("LLM error: {0}")]
    Llm(String),

    /// External collaborator failure that could not be degraded around.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Invalid input.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<homewise_core::Error> for EngineError {
    fn from(e: homewise_core::Error) -> Self {
        match e {
            homewise_core::Error::NotFound(what) => EngineError::NotFound(what),
            homewise_core::Error::AlreadyResolved { id, status } => {
                EngineError::AlreadyResolved { id, status }
            }
            homewise_core::Error::Validation(msg) => EngineError::Validation(msg),
            homewise_core::Error::Storage(msg) => EngineError::Storage(msg),
            homewise_core::Error::Serialization(msg) => EngineError::Storage(msg),
            homewise_core::Error::Gateway(msg) => EngineError::Gateway(msg),
            homewise_core::Error::Llm(msg) => EngineError::Llm(msg),
        }
    }
}

impl From<homewise_memory::MemoryError> for EngineError {
    fn from(e: homewise_memory::MemoryError) -> Self {
        EngineError::Memory(e.to_string())
    }
}

impl From<homewise_core::llm::LlmError> for EngineError {
    fn from(e: homewise_core::llm::LlmError) -> Self {
        EngineError::Llm(e.to_string())
    }
}
