use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::tools::tool::{FunctionDeclaration, ToolResult};
use crate::tools::tool_context::ToolContext;

/// Core trait for all tools in the system.
/// Tools provide functionality that agents can use during conversations.
#[async_trait]
pub trait BaseTool: Send + Sync {
    /// The name of the tool - must be unique within an agent
    fn name(&self) -> &str;

    /// Human-readable description of what this tool does
    fn description(&self) -> &str;

    /// Describes the tool's arguments to the LLM.
    fn declaration(&self) -> FunctionDeclaration;

    /// Executes the tool with the given arguments and context.
    /// Failures are reported through [`ToolResult::error`], never by panicking.
    async fn run_async(
        &self,
        args: HashMap<String, Value>,
        context: &ToolContext<'_>,
    ) -> ToolResult;
}
