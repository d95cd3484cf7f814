//! Concrete LLM backends.

pub mod ollama;
