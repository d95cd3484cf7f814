//! LLM-backed decision engine.
//!
//! Produces at most one recommendation draft per call. Malformed model output
//! is never an error: extraction falls through a chain of strategies and,
//! when all of them fail, a fixed deterministic fallback draft is used.
//! Transport failures (the backend is down or timed out) do propagate.

use std::sync::Arc;

use serde::Deserialize;

use homewise_core::llm::{GenerationParams, LlmInput, LlmRuntime, Message};
use homewise_core::types::{DeviceAction, DeviceControl};
use homewise_memory::MemoryContext;

use crate::context::EnvironmentContext;
use crate::error::Result;

const DEFAULT_TITLE: &str = "Smart home recommendation";
const DEFAULT_CONTENTS: &str = "A device adjustment is suggested based on your current context.";

const SYSTEM_PROMPT: &str = "You are a proactive smart-home assistant. Based on the \
environment and the user's habits you decide whether to suggest one helpful device \
action right now. Be conservative: only recommend when there is a clear benefit. \
Respond with a single JSON object and nothing else, using exactly this schema:\n\
{\n\
  \"should_recommend\": true or false,\n\
  \"title\": \"short title\",\n\
  \"contents\": \"one or two sentences explaining the suggestion\",\n\
  \"device_control\": {\n\
    \"device_type\": \"device type\",\n\
    \"device_id\": \"target device id\",\n\
    \"actions\": [{\"action\": \"command\", \"order\": 1, \"delay_secs\": 0}]\n\
  },\n\
  \"confidence\": 0.0 to 1.0,\n\
  \"reasoning\": \"why\"\n\
}";

/// What the model is asked to return. Every field is tolerant: a missing
/// title or contents gets a generic default, a missing or malformed
/// device_control is dropped.
#[derive(Debug, Deserialize)]
pub(crate) struct LlmRecommendation {
    #[serde(default = "default_true")]
    should_recommend: bool,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    contents: Option<String>,
    #[serde(default)]
    device_control: Option<serde_json::Value>,
    #[serde(default)]
    #[allow(dead_code)]
    confidence: Option<f64>,
    #[serde(default)]
    reasoning: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A recommendation the engine wants to make, before it becomes a persisted
/// record.
#[derive(Debug, Clone)]
pub struct RecommendationDraft {
    pub title: String,
    pub contents: String,
    pub device_control: Option<DeviceControl>,
}

impl RecommendationDraft {
    /// The deterministic fallback used when model output cannot be parsed.
    pub fn fallback() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            contents: DEFAULT_CONTENTS.to_string(),
            device_control: Some(DeviceControl {
                device_type: "air_conditioner".to_string(),
                device_id: None,
                actions: vec![DeviceAction::new("turn_on")],
            }),
        }
    }
}

/// Extract a JSON object from a fenced ```json block.
pub(crate) fn extract_json_fence(text: &str) -> Option<&str> {
    let start = text.find("```json")? + "```json".len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    let candidate = rest[..end].trim();
    (!candidate.is_empty()).then_some(candidate)
}

/// Extract the contents of the first fenced block of any language.
pub(crate) fn extract_any_fence(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    let rest = &text[start..];
    // Skip a language tag on the opening line.
    let body_start = rest.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &rest[body_start..];
    let end = body.find("```")?;
    let candidate = body[..end].trim();
    (!candidate.is_empty()).then_some(candidate)
}

/// Extract the first balanced `{ .. }` slice, respecting string literals.
pub(crate) fn extract_balanced_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Run the extraction chain: fenced json block, any fenced block, balanced
/// braces, raw trimmed text.
pub(crate) fn extract_recommendation(text: &str) -> Option<LlmRecommendation> {
    let candidates = [
        extract_json_fence(text),
        extract_any_fence(text),
        extract_balanced_braces(text),
        Some(text.trim()),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Ok(parsed) = serde_json::from_str::<LlmRecommendation>(candidate) {
            return Some(parsed);
        }
    }
    None
}

fn parse_device_control(value: serde_json::Value) -> Option<DeviceControl> {
    let control: DeviceControl = serde_json::from_value(value).ok()?;
    control.is_valid().then_some(control)
}

/// Decides whether to recommend, and what.
pub struct DecisionEngine {
    llm: Arc<dyn LlmRuntime>,
    model: Option<String>,
}

impl DecisionEngine {
    pub fn new(llm: Arc<dyn LlmRuntime>) -> Self {
        Self { llm, model: None }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    fn build_prompt(&self, env: &EnvironmentContext, memory: &MemoryContext) -> String {
        let mut device_lines = Vec::new();
        for device in env.controllable_devices() {
            let name = device
                .display_name
                .as_deref()
                .unwrap_or(&device.device_name);
            device_lines.push(format!(
                "- {} ({}, id {}), state: {}",
                name, device.device_type, device.device_id, device.current_state
            ));
        }

        format!(
            "Current time: {:02}:00 ({}, {}, {})\n\
             Weather: {}\n\
             Controllable devices:\n{}\n\
             Recent interactions:\n{}\n\
             Learned habits:\n{}\n\
             Preferred temperature: {}°C, preferred brightness: {}%\n\n\
             Decide whether to recommend one device action right now.",
            env.hour,
            env.time_period,
            env.weekday,
            env.season.as_str(),
            env.weather_summary,
            device_lines.join("\n"),
            memory.context_summary,
            memory.pattern_insights,
            memory.preferences.temperature_preference,
            memory.preferences.brightness_preference,
        )
    }

    /// Produce a recommendation draft, or `None` when there is nothing to
    /// recommend. Only transport-level LLM failures return an error.
    pub async fn generate(
        &self,
        user_id: &str,
        env: &EnvironmentContext,
        memory: &MemoryContext,
    ) -> Result<Option<RecommendationDraft>> {
        if !env.has_controllable_device() {
            tracing::debug!(user_id, "no controllable devices, skipping");
            return Ok(None);
        }

        let input = LlmInput {
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(self.build_prompt(env, memory)),
            ],
            params: GenerationParams {
                temperature: Some(0.2),
                ..GenerationParams::default()
            },
            model: self.model.clone(),
        };

        let output = self.llm.generate(input).await?;

        let parsed = match extract_recommendation(&output.text) {
            Some(parsed) => parsed,
            None => {
                tracing::warn!(
                    user_id,
                    "could not extract JSON from model output, using fallback draft"
                );
                return Ok(Some(RecommendationDraft::fallback()));
            }
        };

        if !parsed.should_recommend {
            tracing::debug!(
                user_id,
                reasoning = parsed.reasoning.as_deref().unwrap_or(""),
                "model declined to recommend"
            );
            return Ok(None);
        }

        Ok(Some(RecommendationDraft {
            title: parsed
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            contents: parsed
                .contents
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENTS.to_string()),
            device_control: parsed.device_control.and_then(parse_device_control),
        }))
    }
}
