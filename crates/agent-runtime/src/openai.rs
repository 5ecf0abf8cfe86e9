//! OpenAI-Compatible Gateway
//!
//! Implementation of `ChatModel` for any endpoint speaking the
//! chat-completions protocol with function calling.

use std::collections::HashMap;
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    gateway::{ChatModel, Completion, FinishReason, GenerationOptions, TokenUsage},
    message::Conversation,
    tool::{ToolCall, ToolSchema},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAI-compatible endpoint configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,

    /// Bearer token; optional for keyless local endpoints
    pub api_key: Option<String>,

    /// Connection timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

impl OpenAiConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("OPENAI_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let api_key = std::env::var("OPENAI_API_KEY").ok();

        Self {
            base_url,
            api_key,
            ..Default::default()
        }
    }
}

/// OpenAI-compatible model gateway
pub struct OpenAiGateway {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiGateway {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OpenAiConfig::from_env())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Convert the system prompt plus conversation to wire format
    fn convert_messages(system_prompt: &str, conversation: &Conversation) -> Result<Vec<WireMessage>> {
        let mut wire = Vec::with_capacity(conversation.len() + 1);
        wire.push(WireMessage {
            role: "system".into(),
            content: Some(system_prompt.into()),
            tool_calls: None,
            tool_call_id: None,
        });

        for message in conversation.messages() {
            let tool_calls = if message.tool_calls.is_empty() {
                None
            } else {
                Some(
                    message
                        .tool_calls
                        .iter()
                        .map(WireToolCall::from_call)
                        .collect::<Result<Vec<_>>>()?,
                )
            };

            wire.push(WireMessage {
                role: message.role.to_string(),
                content: Some(message.content.clone()),
                tool_calls,
                tool_call_id: message.tool_call_id().map(str::to_owned),
            });
        }

        Ok(wire)
    }

    /// Convert tool schemas to function-calling wire format
    fn convert_tools(tools: &[ToolSchema]) -> Option<Vec<WireTool>> {
        if tools.is_empty() {
            return None;
        }

        Some(
            tools
                .iter()
                .map(|schema| WireTool {
                    kind: "function".into(),
                    function: WireFunction {
                        name: schema.name.clone(),
                        description: schema.description.clone(),
                        parameters: schema.parameters_json(),
                    },
                })
                .collect(),
        )
    }

    /// Convert a wire response to an agent completion
    fn convert_completion(payload: ChatResponse, fallback_model: &str) -> Result<Completion> {
        let choice = payload
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("completion carried no choices".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(WireToolCall::into_call)
            .collect::<Result<Vec<_>>>()?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            model: payload
                .model
                .unwrap_or_else(|| fallback_model.to_string()),
            usage: payload.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice
                .finish_reason
                .as_deref()
                .and_then(convert_finish_reason),
        })
    }
}

fn convert_finish_reason(reason: &str) -> Option<FinishReason> {
    match reason {
        "stop" => Some(FinishReason::Stop),
        "length" => Some(FinishReason::Length),
        "tool_calls" => Some(FinishReason::ToolCalls),
        "content_filter" => Some(FinishReason::ContentFilter),
        _ => None,
    }
}

#[async_trait]
impl ChatModel for OpenAiGateway {
    async fn generate(
        &self,
        system_prompt: &str,
        conversation: &Conversation,
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = ChatRequest {
            model: options.model.clone(),
            messages: Self::convert_messages(system_prompt, conversation)?,
            tools: Self::convert_tools(tools),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .authorize(self.client.post(self.endpoint("chat/completions")))
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::GatewayUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(body),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(body),
                s if s.is_server_error() => {
                    AgentError::GatewayUnavailable(format!("{status}: {body}"))
                }
                _ => AgentError::Gateway(format!("{status}: {body}")),
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("malformed completion payload: {e}")))?;

        Self::convert_completion(payload, &options.model)
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .authorize(self.client.get(self.endpoint("models")))
            .send()
            .await;

        match response {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("model endpoint health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireCallFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireCallFunction {
    name: String,
    /// JSON-encoded argument object, as the protocol ships it
    arguments: String,
}

impl WireToolCall {
    fn from_call(call: &ToolCall) -> Result<Self> {
        Ok(Self {
            id: call.id.clone(),
            kind: "function".into(),
            function: WireCallFunction {
                name: call.name.clone(),
                arguments: serde_json::to_string(&call.arguments)?,
            },
        })
    }

    fn into_call(self) -> Result<ToolCall> {
        let arguments: HashMap<String, Value> = if self.function.arguments.trim().is_empty() {
            HashMap::new()
        } else {
            serde_json::from_str(&self.function.arguments).map_err(|e| {
                AgentError::Parse(format!(
                    "malformed arguments for tool '{}': {e}",
                    self.function.name
                ))
            })?
        };

        Ok(ToolCall {
            id: self.id,
            name: self.function.name,
            arguments,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use agent_core::message::Message;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OpenAiConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_message_conversion_prepends_system_prompt() {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("What is 2 + 3?"));
        conversation.append(Message::tool("5", "c1"));

        let wire = OpenAiGateway::convert_messages("Be helpful.", &conversation).unwrap();

        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[0].content.as_deref(), Some("Be helpful."));
        assert_eq!(wire[1].role, "user");
        assert_eq!(wire[2].role, "tool");
        assert_eq!(wire[2].tool_call_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_assistant_tool_calls_round_trip() {
        let call = ToolCall {
            id: "c1".into(),
            name: "add".into(),
            arguments: HashMap::from([("a".into(), json!(2)), ("b".into(), json!(3))]),
        };
        let mut conversation = Conversation::new();
        conversation.append(Message::assistant_with_calls("", vec![call]));

        let wire = OpenAiGateway::convert_messages("sys", &conversation).unwrap();
        let wire_calls = wire[1].tool_calls.as_ref().unwrap();
        assert_eq!(wire_calls[0].function.name, "add");

        let parsed: Value = serde_json::from_str(&wire_calls[0].function.arguments).unwrap();
        assert_eq!(parsed["a"], json!(2));
    }

    #[test]
    fn test_tool_schema_conversion() {
        use agent_core::tool::ParameterSchema;

        let schemas = vec![ToolSchema {
            name: "add".into(),
            description: "Add two numbers".into(),
            parameters: vec![ParameterSchema::required("a", "integer", "First operand")],
        }];

        let wire = OpenAiGateway::convert_tools(&schemas).unwrap();
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].kind, "function");
        assert_eq!(wire[0].function.name, "add");
        assert_eq!(wire[0].function.parameters["type"], "object");

        assert!(OpenAiGateway::convert_tools(&[]).is_none());
    }

    #[test]
    fn test_completion_conversion_parses_tool_calls() {
        let payload: ChatResponse = serde_json::from_value(json!({
            "model": "test-model",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "add",
                            "arguments": "{\"a\": 2, \"b\": 3}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();

        let completion = OpenAiGateway::convert_completion(payload, "fallback").unwrap();

        assert_eq!(completion.content, "");
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].id, "call_abc");
        assert_eq!(
            completion.tool_calls[0].arguments.get("a"),
            Some(&json!(2))
        );
        assert_eq!(completion.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(completion.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_completion_without_choices_is_parse_error() {
        let payload: ChatResponse =
            serde_json::from_value(json!({"model": null, "choices": [], "usage": null})).unwrap();

        let err = OpenAiGateway::convert_completion(payload, "fallback").unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[test]
    fn test_malformed_call_arguments_is_parse_error() {
        let wire = WireToolCall {
            id: "c1".into(),
            kind: "function".into(),
            function: WireCallFunction {
                name: "add".into(),
                arguments: "not json".into(),
            },
        };

        let err = wire.into_call().unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[test]
    fn test_empty_call_arguments_parse_to_empty_map() {
        let wire = WireToolCall {
            id: "c1".into(),
            kind: "function".into(),
            function: WireCallFunction {
                name: "now".into(),
                arguments: "".into(),
            },
        };

        let call = wire.into_call().unwrap();
        assert!(call.arguments.is_empty());
    }
}
