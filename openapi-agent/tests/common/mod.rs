//! Live Pet Store servers on ephemeral ports.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use openapi_agent::tools::{BaseTool, BaseToolset, DefaultExecutionState, ToolContext, ToolResult};
use petstore_server::{ApiVariant, PetStore, PetStoreServer};
use serde_json::Value;

pub struct LiveServer {
    pub base_url: String,
    pub store: Arc<PetStore>,
}

impl LiveServer {
    pub fn openapi_url(&self) -> String {
        format!("{}/openapi.json", self.base_url)
    }
}

/// Binds 127.0.0.1:0 and serves the given variant in the background.
pub async fn spawn_server(variant: ApiVariant) -> LiveServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let base_url = format!("http://{}", listener.local_addr().expect("local addr"));

    let server = PetStoreServer::builder(variant)
        .with_public_url(base_url.clone())
        .build();
    let store = server.store();
    tokio::spawn(server.serve_listener(listener));

    LiveServer { base_url, store }
}

pub async fn find_tool(toolset: &dyn BaseToolset, name: &str) -> Arc<dyn BaseTool> {
    toolset
        .get_tools()
        .await
        .into_iter()
        .find(|t| t.name() == name)
        .unwrap_or_else(|| panic!("tool {name} not generated"))
}

pub async fn call(tool: &dyn BaseTool, args: Value) -> ToolResult {
    let args: HashMap<String, Value> = serde_json::from_value(args).expect("object arguments");
    let state = DefaultExecutionState::new();
    let context = ToolContext::builder(&state).with_agent_name("test").build();
    tool.run_async(args, &context).await
}
