//! LLM runtime backends for the Homewise engine.
//!
//! The engine depends only on [`homewise_core::LlmRuntime`]; this crate
//! provides the concrete backends: an Ollama HTTP backend for real
//! deployments and a scriptable mock for tests.

pub mod backends;
pub mod mock;

pub use backends::ollama::{OllamaConfig, OllamaRuntime};
pub use mock::MockRuntime;
