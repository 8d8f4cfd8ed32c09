//! Tools and toolsets for agent capabilities.
//!
//! - [`BaseTool`]: The fundamental trait for implementing a tool
//! - [`BaseToolset`]: Collections of related tools
//! - [`OpenApiToolSet`]: One tool per operation of an OpenAPI document
//! - [`ToolContext`]: Execution context passed to tools
//! - [`ExecutionState`]: Key-value storage for execution-scoped data

pub mod base_tool;
pub mod base_toolset;
mod execution_state;
pub mod openapi;
pub mod tool;
pub mod tool_context;

pub use base_tool::BaseTool;
pub use base_toolset::{BaseToolset, ToolList, ToolsetGroup};
pub use execution_state::{DefaultExecutionState, ExecutionState};
pub use openapi::{AuthConfig, HeaderOrQuery, OAuth2AuthorizationCode, OAuth2Token, OpenApiToolSet};
pub use tool::{FunctionDeclaration, ToolCall, ToolResponse, ToolResult};
pub use tool_context::{ToolContext, ToolContextBuilder};
