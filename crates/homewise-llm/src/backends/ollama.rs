//! Ollama LLM backend.
//!
//! Talks to a local Ollama server via its native `/api/chat` endpoint,
//! non-streaming. The recommendation pipeline only needs one-shot
//! generations with a strict timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use homewise_core::config::{defaults, endpoints};
use homewise_core::llm::{
    FinishReason, LlmError, LlmInput, LlmOutput, LlmRuntime, MessageRole, TokenUsage,
};

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama endpoint (default: http://localhost:11434).
    pub endpoint: String,

    /// Model name (e.g. "qwen3:4b", "llama3:8b").
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    defaults::LLM_TIMEOUT_SECS
}

impl OllamaConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoints::OLLAMA.to_string(),
            model: model.into(),
            timeout_secs: defaults::LLM_TIMEOUT_SECS,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama runtime backend.
pub struct OllamaRuntime {
    config: OllamaConfig,
    client: Client,
}

impl OllamaRuntime {
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        tracing::debug!(endpoint = %config.endpoint, model = %config.model, "creating Ollama runtime");
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn role_str(role: MessageRole) -> &'static str {
        match role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[async_trait]
impl LlmRuntime for OllamaRuntime {
    fn id(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, input: LlmInput) -> Result<LlmOutput, LlmError> {
        let url = format!("{}/api/chat", self.config.endpoint);
        let model = input.model.as_deref().unwrap_or(&self.config.model);

        let request = ChatRequest {
            model,
            messages: input
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: Self::role_str(m.role),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            options: ChatOptions {
                temperature: input.params.temperature,
                top_p: input.params.top_p,
                num_predict: input.params.max_tokens,
                stop: input.params.stop.clone(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(format!("ollama generation timed out: {e}"))
                } else {
                    LlmError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Backend(format!(
                "ollama returned {status}: {body}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let finish_reason = match chat.done_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("stop") | None => FinishReason::Stop,
            Some(_) => FinishReason::Stop,
        };
        let usage = match (chat.prompt_eval_count, chat.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage::new(prompt, completion)),
            _ => None,
        };

        Ok(LlmOutput {
            text: chat.message.content,
            finish_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::new("qwen3:4b");
        assert_eq!(config.endpoint, "http://localhost:11434");
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "qwen3:4b",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            stream: false,
            options: ChatOptions {
                temperature: Some(0.2),
                top_p: None,
                num_predict: Some(512),
                stop: None,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "qwen3:4b");
        assert_eq!(json["options"]["temperature"], 0.2);
        assert!(json["options"].get("top_p").is_none());
    }
}
