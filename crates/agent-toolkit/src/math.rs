//! Arithmetic Tools
//!
//! Integer arithmetic over checked operations, so overflow comes back to the
//! model as a tool failure instead of wrapping silently.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_core::{
    error::{AgentError, Result},
    tool::{ParameterSchema, Tool, ToolProvider, ToolSchema},
};

fn int_arg(arguments: &HashMap<String, Value>, name: &str) -> Result<i64> {
    arguments
        .get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| AgentError::ToolValidation(format!("parameter '{name}' must be an integer")))
}

fn operands(description_a: &str, description_b: &str) -> Vec<ParameterSchema> {
    vec![
        ParameterSchema::required("a", "integer", description_a),
        ParameterSchema::required("b", "integer", description_b),
    ]
}

/// Add two numbers
pub struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "add".into(),
            description: "Add two numbers.".into(),
            parameters: operands("The first number.", "The second number."),
        }
    }

    async fn invoke(&self, arguments: &HashMap<String, Value>) -> Result<Value> {
        let a = int_arg(arguments, "a")?;
        let b = int_arg(arguments, "b")?;

        a.checked_add(b)
            .map(|sum| json!(sum))
            .ok_or_else(|| AgentError::ToolExecution("integer overflow".into()))
    }
}

/// Multiply two numbers
pub struct MultiplyTool;

#[async_trait]
impl Tool for MultiplyTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "multiply".into(),
            description: "Multiply two numbers.".into(),
            parameters: operands("The first number.", "The second number."),
        }
    }

    async fn invoke(&self, arguments: &HashMap<String, Value>) -> Result<Value> {
        let a = int_arg(arguments, "a")?;
        let b = int_arg(arguments, "b")?;

        a.checked_mul(b)
            .map(|product| json!(product))
            .ok_or_else(|| AgentError::ToolExecution("integer overflow".into()))
    }
}

/// Raise a number to the power of another
pub struct PowerTool;

#[async_trait]
impl Tool for PowerTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "power".into(),
            description: "Raise a number to the power of another.".into(),
            parameters: operands("The base number.", "The exponent."),
        }
    }

    async fn invoke(&self, arguments: &HashMap<String, Value>) -> Result<Value> {
        let a = int_arg(arguments, "a")?;
        let b = int_arg(arguments, "b")?;

        let exponent = u32::try_from(b).map_err(|_| {
            AgentError::ToolValidation("exponent must be a non-negative integer".into())
        })?;

        a.checked_pow(exponent)
            .map(|result| json!(result))
            .ok_or_else(|| AgentError::ToolExecution("integer overflow".into()))
    }
}

/// Arithmetic tool provider
pub fn provider() -> ToolProvider {
    ToolProvider::new("math", || {
        Ok(vec![
            Arc::new(AddTool) as Arc<dyn Tool>,
            Arc::new(MultiplyTool),
            Arc::new(PowerTool),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(a: i64, b: i64) -> HashMap<String, Value> {
        HashMap::from([("a".into(), json!(a)), ("b".into(), json!(b))])
    }

    #[tokio::test]
    async fn test_add() {
        assert_eq!(AddTool.invoke(&args(2, 3)).await.unwrap(), json!(5));
        assert_eq!(AddTool.invoke(&args(-4, 4)).await.unwrap(), json!(0));
    }

    #[tokio::test]
    async fn test_multiply() {
        assert_eq!(MultiplyTool.invoke(&args(10, 5)).await.unwrap(), json!(50));
    }

    #[tokio::test]
    async fn test_power() {
        assert_eq!(PowerTool.invoke(&args(2, 8)).await.unwrap(), json!(256));
        assert_eq!(PowerTool.invoke(&args(7, 0)).await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_negative_exponent_rejected() {
        let err = PowerTool.invoke(&args(2, -1)).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));
    }

    #[tokio::test]
    async fn test_overflow_is_execution_error() {
        let err = MultiplyTool
            .invoke(&args(i64::MAX, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution(_)));
    }

    #[tokio::test]
    async fn test_non_integer_argument_rejected() {
        let arguments = HashMap::from([("a".into(), json!("two")), ("b".into(), json!(3))]);
        let err = AddTool.invoke(&arguments).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));
    }

    #[test]
    fn test_provider_exposes_all_tools() {
        let tools = provider().provide().unwrap();
        let names: Vec<String> = tools.iter().map(|t| t.schema().name).collect();
        assert_eq!(names, vec!["add", "multiply", "power"]);
    }
}
