//! Scripted model and tool doubles for agent tests.
//!
//! Compiled under `cfg(test)` and behind the `test-support` feature for the
//! integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{json, Value};

use crate::errors::{AgentError, AgentResult};
use crate::models::{BaseLlm, LlmResponse, ModelReply, Thread, TokenUsage};
use crate::tools::{BaseTool, BaseToolset, FunctionDeclaration, ToolCall, ToolContext, ToolResult};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct Script {
    replies: VecDeque<AgentResult<LlmResponse>>,
    requests: Vec<(Thread, Vec<String>)>,
}

/// Model that answers from a fixed script and remembers each request.
///
/// An exhausted script answers with [`AgentError::ModelRequest`].
#[derive(Clone, Default)]
pub struct FakeLlm {
    name: String,
    script: Arc<Mutex<Script>>,
}

impl FakeLlm {
    #[must_use]
    pub fn with_responses<I>(name: impl Into<String>, replies: I) -> Self
    where
        I: IntoIterator<Item = AgentResult<LlmResponse>>,
    {
        let script = Script {
            replies: replies.into_iter().collect(),
            requests: Vec::new(),
        };
        Self {
            name: name.into(),
            script: Arc::new(Mutex::new(script)),
        }
    }

    /// Threads sent to the model, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Thread> {
        locked(&self.script)
            .requests
            .iter()
            .map(|(thread, _)| thread.clone())
            .collect()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        locked(&self.script).requests.len()
    }

    /// Tool names offered with each request.
    #[must_use]
    pub fn advertised_tools(&self) -> Vec<Vec<String>> {
        locked(&self.script)
            .requests
            .iter()
            .map(|(_, tools)| tools.clone())
            .collect()
    }

    #[must_use]
    pub fn reply_response(reply: ModelReply) -> AgentResult<LlmResponse> {
        Ok(LlmResponse::new(reply, TokenUsage::empty()))
    }

    #[must_use]
    pub fn text_response(text: impl Into<String>) -> AgentResult<LlmResponse> {
        Self::reply_response(ModelReply::text(text))
    }

    /// A reply with one call, whose id is `call_<name>`.
    #[must_use]
    pub fn tool_call_response(name: &str, arguments: Value) -> AgentResult<LlmResponse> {
        let call = ToolCall::new(format!("call_{name}"), name, arguments);
        Self::reply_response(ModelReply::tool_calls(vec![call]))
    }
}

#[async_trait::async_trait]
impl BaseLlm for FakeLlm {
    fn model_name(&self) -> &str {
        if self.name.is_empty() {
            "fake-llm"
        } else {
            &self.name
        }
    }

    async fn generate_content(
        &self,
        thread: Thread,
        toolset: Option<Arc<dyn BaseToolset>>,
    ) -> AgentResult<LlmResponse> {
        let mut offered = Vec::new();
        if let Some(toolset) = toolset {
            for tool in toolset.get_tools().await {
                offered.push(tool.name().to_string());
            }
        }

        let mut script = locked(&self.script);
        script.requests.push((thread, offered));
        script.replies.pop_front().unwrap_or_else(|| {
            Err(AgentError::ModelRequest {
                provider: "fake".to_string(),
                reason: format!("script exhausted after {} calls", script.requests.len()),
            })
        })
    }
}

/// Tool that hands back queued results and keeps the arguments it got.
///
/// Clones share their queue and log.
#[derive(Clone)]
pub struct RecordingTool {
    name: String,
    description: String,
    log: Arc<Mutex<(VecDeque<ToolResult>, Vec<HashMap<String, Value>>)>>,
}

impl RecordingTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        results: impl Into<VecDeque<ToolResult>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            log: Arc::new(Mutex::new((results.into(), Vec::new()))),
        }
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        locked(&self.log).1.len()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<HashMap<String, Value>> {
        locked(&self.log).1.clone()
    }
}

impl Default for RecordingTool {
    fn default() -> Self {
        Self::new("recording_tool", "Records invocations", Vec::<ToolResult>::new())
    }
}

#[async_trait::async_trait]
impl BaseTool for RecordingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration::new(
            self.name.clone(),
            self.description.clone(),
            json!({"type": "object", "properties": {}}),
        )
    }

    async fn run_async(&self, args: HashMap<String, Value>, _context: &ToolContext<'_>) -> ToolResult {
        let mut log = locked(&self.log);
        log.1.push(args);
        log.0
            .pop_front()
            .unwrap_or_else(|| ToolResult::success(Value::Null))
    }
}
