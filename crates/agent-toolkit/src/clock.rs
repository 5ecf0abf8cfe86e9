//! Date/Time Tool

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_core::{
    error::Result,
    tool::{ParameterSchema, Tool, ToolProvider, ToolSchema},
};

/// Returns the current date and time
pub struct DateTimeTool;

#[async_trait]
impl Tool for DateTimeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "datetime".into(),
            description: "Get the current date and time (UTC).".into(),
            parameters: vec![ParameterSchema {
                name: "format".into(),
                param_type: "string".into(),
                description: "Output format: 'iso', 'human', or 'unix'".into(),
                required: false,
                default: Some(json!("human")),
                enum_values: Some(vec![json!("iso"), json!("human"), json!("unix")]),
            }],
        }
    }

    async fn invoke(&self, arguments: &HashMap<String, Value>) -> Result<Value> {
        let format = arguments
            .get("format")
            .and_then(Value::as_str)
            .unwrap_or("human");

        let now = chrono::Utc::now();

        let rendered = match format {
            "iso" => now.to_rfc3339(),
            "unix" => now.timestamp().to_string(),
            _ => now.format("%A, %B %d, %Y at %H:%M:%S UTC").to_string(),
        };

        Ok(json!(rendered))
    }
}

/// Date/time tool provider
pub fn provider() -> ToolProvider {
    ToolProvider::new("clock", || Ok(vec![Arc::new(DateTimeTool) as Arc<dyn Tool>]))
}
