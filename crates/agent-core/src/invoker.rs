//! Tool Invoker
//!
//! Resolves and executes the tool calls carried by one assistant message.
//! Calls fan out concurrently; the join preserves request order, and a
//! failure in one call never cancels its siblings. Every failure mode is
//! converted into an observation so the loop can feed it back to the model.

use std::time::Duration;

use futures::future::join_all;

use crate::tool::{ToolCall, ToolObservation, ToolRegistry};

/// Execute every request against the registry, returning one observation per
/// request in request order. Infallible: unknown tools, validation failures,
/// execution errors, and timeouts all come back as observations.
pub async fn invoke_all(
    registry: &ToolRegistry,
    requests: &[ToolCall],
    tool_timeout: Duration,
) -> Vec<ToolObservation> {
    join_all(
        requests
            .iter()
            .map(|call| invoke_one(registry, call, tool_timeout)),
    )
    .await
}

async fn invoke_one(
    registry: &ToolRegistry,
    call: &ToolCall,
    tool_timeout: Duration,
) -> ToolObservation {
    let Some(tool) = registry.get(&call.name) else {
        tracing::warn!(tool = %call.name, "model requested unregistered tool");
        return ToolObservation::unknown_tool(&call.id, &call.name);
    };

    if let Err(err) = tool.validate(&call.arguments) {
        return ToolObservation::failed(&call.id, &call.name, err.to_string());
    }

    match tokio::time::timeout(tool_timeout, tool.invoke(&call.arguments)).await {
        Ok(Ok(result)) => {
            tracing::debug!(tool = %call.name, "tool call succeeded");
            ToolObservation::success(&call.id, &call.name, result)
        }
        Ok(Err(err)) => {
            tracing::warn!(tool = %call.name, %err, "tool call failed");
            ToolObservation::failed(&call.id, &call.name, err.to_string())
        }
        Err(_) => {
            tracing::warn!(tool = %call.name, "tool call timed out");
            ToolObservation::failed(
                &call.id,
                &call.name,
                format!("timed out after {}s", tool_timeout.as_secs()),
            )
        }
    }
}
