//! Model Gateway Boundary
//!
//! The loop consumes the language model exclusively through [`ChatModel`]:
//! one blocking call per iteration, supplied with the full conversation and
//! the full tool-schema list, returning an assistant completion that may
//! carry tool-call requests. Concrete implementations live in the runtime
//! crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{Conversation, Message};
use crate::tool::{ToolCall, ToolSchema};

/// Configuration for model generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gpt-4o-mini", "qwen2.5")
    pub model: String,

    /// Sampling temperature; 0.0 keeps decoding deterministic
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_tokens() -> u32 {
    2048
}

impl GenerationOptions {
    /// Greedy-decoding options for a model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason the model stopped generating
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

/// Response from one model invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Tool invocations the model requested, in issue order
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if reported)
    pub usage: Option<TokenUsage>,

    /// Finish reason (if reported)
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// Convert into the assistant message appended to the conversation
    pub fn into_message(self) -> Message {
        Message::assistant_with_calls(self.content, self.tool_calls).with_model(self.model)
    }
}

/// Boundary trait for language-model backends.
///
/// The model is stateless between calls, so `generate` always receives the
/// complete history plus every tool schema it may choose from.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate one assistant completion
    async fn generate(
        &self,
        system_prompt: &str,
        conversation: &Conversation,
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion>;

    /// Check if the backend is reachable and configured correctly
    async fn health_check(&self) -> Result<bool>;
}
