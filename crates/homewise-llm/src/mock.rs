//! Scriptable mock LLM runtime for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use homewise_core::llm::{LlmError, LlmInput, LlmOutput, LlmRuntime};

/// A mock runtime that replays queued responses in order.
///
/// When the queue is empty it returns the configured default response, or an
/// error if constructed with [`MockRuntime::failing`].
pub struct MockRuntime {
    responses: Mutex<VecDeque<String>>,
    default_response: Option<String>,
    calls: AtomicUsize,
    /// Captured prompts, newest last.
    prompts: Mutex<Vec<LlmInput>>,
}

impl MockRuntime {
    /// Mock that always answers with `default_response` once the queue runs
    /// out.
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            default_response: Some(default_response.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Mock that fails with a network error once the queue runs out.
    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            default_response: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response to be returned by the next call.
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push_back(response.into());
    }

    /// Number of generate calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Inputs seen so far.
    pub fn seen_inputs(&self) -> Vec<LlmInput> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmRuntime for MockRuntime {
    fn id(&self) -> &str {
        "mock"
    }

    async fn generate(&self, input: LlmInput) -> Result<LlmOutput, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(input);

        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return Ok(LlmOutput::text(response));
        }
        match &self.default_response {
            Some(response) => Ok(LlmOutput::text(response.clone())),
            None => Err(LlmError::Network("mock runtime configured to fail".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_queued_then_default() {
        let mock = MockRuntime::new("default");
        mock.push_response("first");

        let out = mock.generate(LlmInput::new("hi")).await.unwrap();
        assert_eq!(out.text, "first");
        let out = mock.generate(LlmInput::new("hi")).await.unwrap();
        assert_eq!(out.text, "default");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockRuntime::failing();
        assert!(mock.generate(LlmInput::new("hi")).await.is_err());
    }
}
