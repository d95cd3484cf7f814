//! Core types and abstractions for the Homewise recommendation engine.
//!
//! This crate defines the shared data model (recommendations, device
//! descriptors, preference profiles), the LLM runtime abstraction, and the
//! collaborator traits the engine talks to. Everything here is
//! implementation-agnostic: concrete backends live in the sibling crates.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod llm;
pub mod storage;
pub mod types;

pub use collaborators::{
    DeviceExecutor, DeviceInventory, HardwareChannel, UserDirectory, WeatherProvider,
};
pub use error::{Error, Result};
pub use llm::{
    FinishReason, GenerationParams, LlmError, LlmInput, LlmOutput, LlmRuntime, Message,
    MessageRole, TokenUsage,
};
pub use storage::{PreferenceStore, RecommendationStore};
pub use types::{
    DeviceAction, DeviceControl, DeviceDescriptor, Mode, PreferencePatch, PreferenceProfile,
    Recommendation, RecommendationId, RecommendationStatus, Season, TimePeriod, UserResponse,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
