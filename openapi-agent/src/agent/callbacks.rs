//! Hooks the agent loop runs around tool execution.

use std::collections::HashMap;

use serde_json::Value;

use crate::tools::{BaseTool, ToolContext, ToolResult};

/// Runs after every tool invocation, before the result reaches the model.
///
/// Returning `Some` replaces the tool's result; `None` keeps it.
#[async_trait::async_trait]
pub trait AfterToolCallback: Send + Sync {
    async fn after_tool(
        &self,
        tool: &dyn BaseTool,
        args: &HashMap<String, Value>,
        context: &ToolContext<'_>,
        response: &ToolResult,
    ) -> Option<ToolResult>;
}

/// Logs each tool call and its response. Never alters the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogToolCalls;

#[async_trait::async_trait]
impl AfterToolCallback for LogToolCalls {
    async fn after_tool(
        &self,
        tool: &dyn BaseTool,
        _args: &HashMap<String, Value>,
        context: &ToolContext<'_>,
        response: &ToolResult,
    ) -> Option<ToolResult> {
        tracing::info!(invocation_id = context.invocation_id(), "Tool called: {}", tool.name());
        tracing::info!(
            invocation_id = context.invocation_id(),
            "Tool response: {}",
            response.to_json()
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingTool;
    use crate::tools::DefaultExecutionState;
    use serde_json::json;

    #[tokio::test]
    async fn log_tool_calls_keeps_the_response() {
        let tool = RecordingTool::default();
        let state = DefaultExecutionState::new();
        let context = ToolContext::builder(&state).build();
        let args = HashMap::from([("petId".to_string(), json!(1))]);

        let replaced = LogToolCalls
            .after_tool(&tool, &args, &context, &ToolResult::success(json!({"id": 1})))
            .await;
        assert!(replaced.is_none());

        let replaced = LogToolCalls
            .after_tool(&tool, &args, &context, &ToolResult::error("HTTP 404 Not Found"))
            .await;
        assert!(replaced.is_none());
    }
}
