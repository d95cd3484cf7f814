//! Abstract LLM runtime.
//!
//! The engine never talks to a concrete model API. It builds an [`LlmInput`]
//! and hands it to whatever [`LlmRuntime`] was wired in at startup, so the
//! reasoning backend can be swapped without touching the pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from an LLM backend.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network-level failure reaching the backend.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend did not answer within the configured timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The backend answered with something we could not decode.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Backend-specific failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Generation parameters.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Top-p sampling (0.0 - 1.0)
    pub top_p: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<usize>,
    /// Stop sequences
    pub stop: Option<Vec<String>>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            top_p: Some(0.9),
            max_tokens: Some(2048),
            stop: None,
        }
    }
}

/// LLM input.
#[derive(Debug, Clone)]
pub struct LlmInput {
    /// Messages for the conversation
    pub messages: Vec<Message>,
    /// Generation parameters
    pub params: GenerationParams,
    /// Model identifier (backend-specific)
    pub model: Option<String>,
}

impl LlmInput {
    /// Create a new input with a single user message.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
            params: GenerationParams::default(),
            model: None,
        }
    }

    /// Add a message to the conversation.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Set model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Finish reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Model stopped naturally
    Stop,
    /// Max tokens reached
    Length,
    /// Model hit an error
    Error,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// LLM output.
#[derive(Debug, Clone)]
pub struct LlmOutput {
    /// Generated text content
    pub text: String,
    /// Finish reason
    pub finish_reason: FinishReason,
    /// Tokens used, when the backend reports them
    pub usage: Option<TokenUsage>,
}

impl LlmOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: FinishReason::Stop,
            usage: None,
        }
    }
}

/// Abstract LLM inference backend.
#[async_trait]
pub trait LlmRuntime: Send + Sync {
    /// Backend identifier (e.g. "ollama", "mock").
    fn id(&self) -> &str;

    /// Run one non-streaming generation.
    async fn generate(&self, input: LlmInput) -> Result<LlmOutput, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_builder() {
        let input = LlmInput::new("hello")
            .with_message(Message::assistant("hi"))
            .with_model("test-model");
        assert_eq!(input.messages.len(), 2);
        assert_eq!(input.messages[0].role, MessageRole::User);
        assert_eq!(input.model.as_deref(), Some("test-model"));
    }

    #[test]
    fn test_token_usage() {
        let usage = TokenUsage::new(10, 20);
        assert_eq!(usage.total_tokens, 30);
    }
}
