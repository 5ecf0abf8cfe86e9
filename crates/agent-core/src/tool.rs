//! Tool System
//!
//! Tool definitions, the provider contract, and the registry the reasoning
//! loop dispatches against. Providers are plain values collected by the
//! composition root at startup; once aggregated, the registry is immutable
//! and safe to share across turns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::Message;

/// Tool call request produced by the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation token, unique within the issuing assistant message
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

/// Result of executing one tool call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolObservation {
    /// Correlation id of the originating request
    pub call_id: String,

    /// Tool that was called
    pub name: String,

    /// Serialized value or error descriptor
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

/// Outcome of a tool invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// Tool ran and produced a value
    Success { result: Value },
    /// Requested tool is not in the registry
    UnknownTool,
    /// Tool failed during validation or execution
    Failed { reason: String },
}

impl ToolObservation {
    pub fn success(call_id: impl Into<String>, name: impl Into<String>, result: Value) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            outcome: ToolOutcome::Success { result },
        }
    }

    pub fn unknown_tool(call_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            outcome: ToolOutcome::UnknownTool,
        }
    }

    pub fn failed(
        call_id: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            outcome: ToolOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success { .. })
    }

    /// Serialize the outcome to the text form the model reads
    pub fn render(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success { result } => result.to_string(),
            ToolOutcome::UnknownTool => {
                json!({ "error": format!("unknown tool '{}'", self.name) }).to_string()
            }
            ToolOutcome::Failed { reason } => json!({ "error": reason }).to_string(),
        }
    }

    /// Convert into the tool message appended to the conversation
    pub fn into_message(self) -> Message {
        let content = self.render();
        Message::tool(content, self.call_id)
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, integer, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ParameterSchema {
    /// A required parameter with no default or enum constraint
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
            enum_values: None,
        }
    }
}

/// Tool definition schema advertised to the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// Render the parameter list as a JSON Schema object
    pub fn parameters_json(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = serde_json::Map::new();
            prop.insert("type".into(), Value::String(param.param_type.clone()));
            prop.insert(
                "description".into(),
                Value::String(param.description.clone()),
            );
            if let Some(default) = &param.default {
                prop.insert("default".into(), default.clone());
            }
            if let Some(values) = &param.enum_values {
                prop.insert("enum".into(), Value::Array(values.clone()));
            }
            properties.insert(param.name.clone(), Value::Object(prop));

            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for model function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with the given arguments
    async fn invoke(&self, arguments: &HashMap<String, Value>) -> Result<Value>;

    /// Validate arguments before execution (optional)
    fn validate(&self, arguments: &HashMap<String, Value>) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && !arguments.contains_key(&param.name) {
                return Err(AgentError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Explicit registration value exposed by each provider module.
///
/// Replaces reflective module scanning: the composition root collects these
/// and hands them to [`ToolRegistry::aggregate`].
pub struct ToolProvider {
    name: &'static str,
    provide: Box<dyn Fn() -> Result<Vec<Arc<dyn Tool>>> + Send + Sync>,
}

impl ToolProvider {
    pub fn new(
        name: &'static str,
        provide: impl Fn() -> Result<Vec<Arc<dyn Tool>>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            provide: Box::new(provide),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Construct this provider's tool list
    pub fn provide(&self) -> Result<Vec<Arc<dyn Tool>>> {
        (self.provide)()
    }
}

impl std::fmt::Debug for ToolProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolProvider")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Immutable registry of available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    schemas: Vec<ToolSchema>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("schemas", &self.schemas)
            .finish_non_exhaustive()
    }
}

impl ToolRegistry {
    /// Aggregate tool lists from every provider.
    ///
    /// A provider that fails to produce its tools is skipped with one warning
    /// so the rest still register. A name collision aborts aggregation: a
    /// silently overridden tool would poison lookups for the whole process.
    pub fn aggregate(providers: &[ToolProvider]) -> Result<Self> {
        let mut tools: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        let mut schemas = Vec::new();

        for provider in providers {
            let provided = match provider.provide() {
                Ok(provided) => provided,
                Err(err) => {
                    tracing::warn!(provider = provider.name(), %err, "skipping tool provider");
                    continue;
                }
            };

            for tool in provided {
                let schema = tool.schema();
                if tools.contains_key(&schema.name) {
                    return Err(AgentError::DuplicateTool {
                        name: schema.name,
                        provider: provider.name().to_string(),
                    });
                }
                tools.insert(schema.name.clone(), tool);
                schemas.push(schema);
            }
        }

        Ok(Self { tools, schemas })
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Schemas in registration order, for model advertisement
    pub fn schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.schemas.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool {
        name: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.name.into(),
                description: "Echo the input back".into(),
                parameters: vec![ParameterSchema::required(
                    "text",
                    "string",
                    "Text to echo",
                )],
            }
        }

        async fn invoke(&self, arguments: &HashMap<String, Value>) -> Result<Value> {
            Ok(arguments.get("text").cloned().unwrap_or(Value::Null))
        }
    }

    fn echo_provider(name: &'static str, tools: &'static [&'static str]) -> ToolProvider {
        ToolProvider::new(name, move || {
            Ok(tools
                .iter()
                .copied()
                .map(|name| Arc::new(EchoTool { name }) as Arc<dyn Tool>)
                .collect())
        })
    }

    #[test]
    fn test_aggregate_unions_provider_tools() {
        let providers = [
            echo_provider("alpha", &["one", "two"]),
            echo_provider("beta", &["three"]),
        ];

        let registry = ToolRegistry::aggregate(&providers).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["one", "two", "three"]);
        assert!(registry.get("three").is_some());
        assert!(registry.get("four").is_none());
    }

    #[test]
    fn test_aggregate_isolates_failing_provider() {
        let providers = [
            echo_provider("good", &["one"]),
            ToolProvider::new("broken", || {
                Err(AgentError::Other("tool list construction failed".into()))
            }),
            echo_provider("also_good", &["two"]),
        ];

        let registry = ToolRegistry::aggregate(&providers).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("one").is_some());
        assert!(registry.get("two").is_some());
    }

    #[test]
    fn test_aggregate_rejects_duplicate_names() {
        let providers = [
            echo_provider("alpha", &["same"]),
            echo_provider("beta", &["same"]),
        ];

        let err = ToolRegistry::aggregate(&providers).unwrap_err();
        assert!(matches!(
            err,
            AgentError::DuplicateTool { name, provider } if name == "same" && provider == "beta"
        ));
    }

    #[test]
    fn test_parameters_json_shape() {
        let schema = ToolSchema {
            name: "add".into(),
            description: "Add two numbers".into(),
            parameters: vec![
                ParameterSchema::required("a", "integer", "First operand"),
                ParameterSchema::required("b", "integer", "Second operand"),
            ],
        };

        let json = schema.parameters_json();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["a"]["type"], "integer");
        assert_eq!(json["required"], json!(["a", "b"]));
    }

    #[test]
    fn test_validate_rejects_missing_required() {
        let tool = EchoTool { name: "echo" };
        let err = tool.validate(&HashMap::new()).unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));
    }

    #[test]
    fn test_observation_render() {
        let ok = ToolObservation::success("c1", "add", json!(5));
        assert_eq!(ok.render(), "5");

        let missing = ToolObservation::unknown_tool("c2", "subtract");
        assert!(missing.render().contains("unknown tool 'subtract'"));

        let failed = ToolObservation::failed("c3", "add", "integer overflow");
        assert!(failed.render().contains("integer overflow"));
    }

    #[test]
    fn test_observation_into_message_keeps_correlation() {
        let message = ToolObservation::success("call_9", "add", json!(5)).into_message();
        assert_eq!(message.tool_call_id(), Some("call_9"));
        assert_eq!(message.content, "5");
    }
}
