//! An LLM agent that drives tools until the model answers in plain text.
//!
//! - [`LlmAgent`]: model + instruction + toolsets + optional after-tool hook
//! - [`LlmAgentBuilder`]: builder combining any number of toolsets

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::agent::callbacks::AfterToolCallback;
use crate::agent::session::Session;
use crate::errors::{AgentError, AgentResult};
use crate::models::{BaseLlm, Turn};
use crate::tools::{BaseTool, BaseToolset, ToolContext, ToolList, ToolResponse, ToolsetGroup};

pub const DEFAULT_AGENT_NAME: &str = "open_api_agent";
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Conversational agent over a set of tools.
///
/// Each [`run`](LlmAgent::run) appends the user's message to the session,
/// then alternates model calls and tool executions until the model replies
/// without requesting a tool.
///
/// ```ignore
/// let agent = LlmAgent::builder(GeminiLlm::new("gemini-2.5-pro", api_key))
///     .with_instruction("You are a Pet Store assistant.")
///     .with_toolset(Arc::new(toolset))
///     .with_after_tool_callback(LogToolCalls)
///     .build();
///
/// let mut session = Session::new();
/// let reply = agent.run(&mut session, "What is in the inventory?").await?;
/// ```
pub struct LlmAgent {
    name: String,
    description: String,
    instruction: String,
    model: Arc<dyn BaseLlm>,
    toolset: Option<Arc<dyn BaseToolset>>,
    after_tool_callback: Option<Arc<dyn AfterToolCallback>>,
    max_iterations: usize,
}

impl LlmAgent {
    pub fn builder(model: impl BaseLlm + 'static) -> LlmAgentBuilder {
        LlmAgentBuilder::new(Arc::new(model))
    }

    pub fn builder_arc(model: Arc<dyn BaseLlm>) -> LlmAgentBuilder {
        LlmAgentBuilder::new(model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    #[must_use]
    pub fn toolset(&self) -> Option<&Arc<dyn BaseToolset>> {
        self.toolset.as_ref()
    }

    /// Handles one user message and returns the model's final text.
    ///
    /// # Errors
    ///
    /// Fails if the model call fails, if the model asks for a tool that does
    /// not exist, or if the loop exceeds the iteration budget. Tool failures
    /// are not errors: they are handed back to the model as tool results.
    ///
    /// A failed run leaves the session thread as it was before the call, so
    /// the next run never replays a tool call without its response.
    #[tracing::instrument(
        name = "agent_run",
        skip_all,
        fields(agent = %self.name, session = session.id())
    )]
    pub async fn run(&self, session: &mut Session, input: impl Into<String>) -> AgentResult<String> {
        let checkpoint = session.thread().len();
        let outcome = self.run_turns(session, input.into()).await;
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "run failed, discarding its turns");
            session.thread_mut().truncate(checkpoint);
        }
        outcome
    }

    async fn run_turns(&self, session: &mut Session, input: String) -> AgentResult<String> {
        session.thread_mut().push(Turn::user(input));

        let tools = self.load_tools().await;
        let invocation_id = uuid::Uuid::new_v4().to_string();
        let state = session.state().clone();
        let context = ToolContext::builder(&state)
            .with_agent_name(&self.name)
            .with_invocation_id(&invocation_id)
            .build();

        for iteration in 1..=self.max_iterations {
            let thread = session.thread().clone().with_system(self.instruction.clone());
            let response = self
                .model
                .generate_content(thread, self.toolset.clone())
                .await?;
            let (reply, usage) = response.into_parts();
            tracing::debug!(
                iteration,
                total_tokens = usage.total_tokens(),
                tool_calls = reply.tool_calls.len(),
                "model responded"
            );

            if !reply.wants_tools() {
                let answer = reply.text.clone().unwrap_or_default();
                session.thread_mut().push(reply);
                return Ok(answer);
            }

            let mut responses = Vec::with_capacity(reply.tool_calls.len());
            for call in &reply.tool_calls {
                let tool = tools
                    .get(call.name())
                    .ok_or_else(|| AgentError::ToolNotFound {
                        tool_name: call.name().to_string(),
                    })?;
                let args = value_to_arguments(call.name(), call.arguments())?;

                let mut result = tool.run_async(args.clone(), &context).await;
                if let Some(callback) = &self.after_tool_callback {
                    if let Some(replacement) = callback
                        .after_tool(tool.as_ref(), &args, &context, &result)
                        .await
                    {
                        result = replacement;
                    }
                }
                responses.push(ToolResponse::new(call.id().to_string(), result));
            }

            let thread = session.thread_mut();
            thread.push(reply);
            thread.push(Turn::ToolResults { responses });
        }

        Err(AgentError::IterationLimit {
            max: self.max_iterations,
        })
    }

    /// Releases toolset resources.
    pub async fn close(&self) {
        if let Some(toolset) = &self.toolset {
            toolset.close().await;
        }
    }

    async fn load_tools(&self) -> HashMap<String, Arc<dyn BaseTool>> {
        let Some(toolset) = &self.toolset else {
            return HashMap::new();
        };
        let mut map = HashMap::new();
        for tool in toolset.get_tools().await {
            let name = tool.name().to_string();
            if map.insert(name.clone(), tool).is_some() {
                tracing::warn!(tool = %name, "duplicate tool name, keeping the last one");
            }
        }
        map
    }
}

impl std::fmt::Debug for LlmAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAgent")
            .field("name", &self.name)
            .field("model", &self.model.model_name())
            .field("has_tools", &self.toolset.is_some())
            .field("has_after_tool_callback", &self.after_tool_callback.is_some())
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

fn value_to_arguments(tool_name: &str, value: &Value) -> AgentResult<HashMap<String, Value>> {
    match value {
        Value::Null => Ok(HashMap::new()),
        Value::Object(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        _ => Err(AgentError::InvalidToolArguments {
            tool_name: tool_name.to_string(),
            reason: "Tool arguments must be a JSON object".to_string(),
        }),
    }
}

/// Builder for [`LlmAgent`].
///
/// Loose tools become one [`ToolList`] placed ahead of the other toolsets.
pub struct LlmAgentBuilder {
    model: Arc<dyn BaseLlm>,
    name: String,
    description: String,
    instruction: String,
    tools: Vec<Arc<dyn BaseTool>>,
    toolsets: Vec<Arc<dyn BaseToolset>>,
    after_tool_callback: Option<Arc<dyn AfterToolCallback>>,
    max_iterations: usize,
}

impl LlmAgentBuilder {
    fn new(model: Arc<dyn BaseLlm>) -> Self {
        Self {
            model,
            name: DEFAULT_AGENT_NAME.to_string(),
            description: String::new(),
            instruction: String::new(),
            tools: Vec::new(),
            toolsets: Vec::new(),
            after_tool_callback: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn BaseTool>) -> Self {
        self.tools.push(tool);
        self
    }

    #[must_use]
    pub fn with_toolset(mut self, toolset: Arc<dyn BaseToolset>) -> Self {
        self.toolsets.push(toolset);
        self
    }

    #[must_use]
    pub fn with_after_tool_callback(mut self, callback: impl AfterToolCallback + 'static) -> Self {
        self.after_tool_callback = Some(Arc::new(callback));
        self
    }

    /// Zero is clamped to one so the model is always consulted.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn build(self) -> LlmAgent {
        let mut toolsets = self.toolsets;
        if !self.tools.is_empty() {
            toolsets.insert(0, Arc::new(self.tools.into_iter().collect::<ToolList>()));
        }
        let toolset = ToolsetGroup::collapse(toolsets);

        LlmAgent {
            name: self.name,
            description: self.description,
            instruction: self.instruction,
            model: self.model,
            toolset,
            after_tool_callback: self.after_tool_callback,
            max_iterations: self.max_iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelReply;
    use crate::test_support::{FakeLlm, RecordingTool};
    use crate::tools::{ToolCall, ToolResult};
    use serde_json::json;
    use std::sync::Mutex;

    /// Records what it saw and optionally swaps the result.
    #[derive(Default)]
    struct Spy {
        seen: Mutex<Vec<(String, Value, bool)>>,
        replacement: Option<ToolResult>,
    }

    #[async_trait::async_trait]
    impl AfterToolCallback for Arc<Spy> {
        async fn after_tool(
            &self,
            tool: &dyn BaseTool,
            args: &HashMap<String, Value>,
            context: &ToolContext<'_>,
            response: &ToolResult,
        ) -> Option<ToolResult> {
            assert_eq!(context.agent_name(), DEFAULT_AGENT_NAME);
            self.seen.lock().unwrap().push((
                tool.name().to_string(),
                json!(args),
                response.is_success(),
            ));
            self.replacement.clone()
        }
    }

    fn inventory_tool() -> RecordingTool {
        RecordingTool::new(
            "getInventory",
            "Returns pet inventories by status",
            vec![ToolResult::success(json!({"status": 200, "body": {"available": 2}}))],
        )
    }

    #[tokio::test]
    async fn run_without_tool_calls_returns_text() {
        let llm = FakeLlm::with_responses("fake", [FakeLlm::text_response("Hello!")]);
        let agent = LlmAgent::builder(llm.clone())
            .with_instruction("Be helpful")
            .build();
        let mut session = Session::new();

        let reply = agent.run(&mut session, "hi").await.unwrap();

        assert_eq!(reply, "Hello!");
        assert_eq!(llm.call_count(), 1);
        assert_eq!(llm.calls()[0].system(), Some("Be helpful"));
        assert_eq!(session.thread().len(), 2);
    }

    #[tokio::test]
    async fn run_executes_tools_and_feeds_results_back() {
        let llm = FakeLlm::with_responses(
            "fake",
            [
                FakeLlm::tool_call_response("getInventory", json!({})),
                FakeLlm::text_response("You have 2 available pets."),
            ],
        );
        let tool = inventory_tool();
        let agent = LlmAgent::builder(llm.clone())
            .with_tool(Arc::new(tool.clone()))
            .build();
        let mut session = Session::new();

        let reply = agent.run(&mut session, "inventory?").await.unwrap();

        assert_eq!(reply, "You have 2 available pets.");
        assert_eq!(tool.call_count(), 1);
        assert_eq!(llm.advertised_tools()[0], vec!["getInventory".to_string()]);

        let second_call = &llm.calls()[1];
        let responses: Vec<_> = second_call.tool_responses().collect();
        assert_eq!(responses.len(), 1);
        assert!(second_call.unanswered_calls().is_empty());
        assert_eq!(responses[0].tool_call_id(), "call_getInventory");
        assert_eq!(responses[0].result().data()["body"]["available"], 2);
    }

    #[tokio::test]
    async fn after_tool_callback_observes_every_call() {
        let llm = FakeLlm::with_responses(
            "fake",
            [
                FakeLlm::tool_call_response("getInventory", json!({"verbose": true})),
                FakeLlm::text_response("done"),
            ],
        );
        let spy = Arc::new(Spy::default());
        let agent = LlmAgent::builder(llm)
            .with_tool(Arc::new(inventory_tool()))
            .with_after_tool_callback(spy.clone())
            .build();

        agent.run(&mut Session::new(), "inventory?").await.unwrap();

        let seen = spy.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ("getInventory".to_string(), json!({"verbose": true}), true));
    }

    #[tokio::test]
    async fn after_tool_callback_can_replace_the_result() {
        let llm = FakeLlm::with_responses(
            "fake",
            [
                FakeLlm::tool_call_response("getInventory", json!({})),
                FakeLlm::text_response("done"),
            ],
        );
        let spy = Arc::new(Spy {
            replacement: Some(ToolResult::success(json!("redacted"))),
            ..Spy::default()
        });
        let agent = LlmAgent::builder(llm.clone())
            .with_tool(Arc::new(inventory_tool()))
            .with_after_tool_callback(spy)
            .build();

        agent.run(&mut Session::new(), "inventory?").await.unwrap();

        let thread = &llm.calls()[1];
        let response = thread.tool_responses().next().unwrap();
        assert_eq!(response.result().data(), &json!("redacted"));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let llm = FakeLlm::with_responses("fake", [FakeLlm::tool_call_response("deletePet", json!({}))]);
        let agent = LlmAgent::builder(llm)
            .with_tool(Arc::new(inventory_tool()))
            .build();

        let err = agent.run(&mut Session::new(), "delete pet 1").await.unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound { ref tool_name } if tool_name == "deletePet"));
    }

    #[tokio::test]
    async fn non_object_arguments_are_rejected() {
        let llm = FakeLlm::with_responses(
            "fake",
            [FakeLlm::tool_call_response("getInventory", json!([1, 2]))],
        );
        let agent = LlmAgent::builder(llm)
            .with_tool(Arc::new(inventory_tool()))
            .build();

        let err = agent.run(&mut Session::new(), "x").await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidToolArguments { .. }));
    }

    #[tokio::test]
    async fn failed_run_leaves_no_dangling_tool_call() {
        let llm = FakeLlm::with_responses(
            "fake",
            [
                FakeLlm::text_response("Pet 0 is doggie."),
                FakeLlm::tool_call_response("deletePet", json!({"petId": 0})),
                FakeLlm::text_response("I can't delete pets."),
            ],
        );
        let agent = LlmAgent::builder(llm.clone())
            .with_tool(Arc::new(inventory_tool()))
            .build();
        let mut session = Session::new();

        agent.run(&mut session, "show pet 0").await.unwrap();
        let before = session.thread().clone();

        let err = agent.run(&mut session, "delete pet 0").await.unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound { .. }));
        assert_eq!(session.thread(), &before);

        let reply = agent.run(&mut session, "never mind").await.unwrap();
        assert_eq!(reply, "I can't delete pets.");

        let third = &llm.calls()[2];
        assert!(third.unanswered_calls().is_empty());
        assert!(third.transcript().ends_with("user: never mind"));
        assert!(!third.transcript().contains("delete pet 0"));
    }

    #[tokio::test]
    async fn iteration_budget_is_enforced() {
        let llm = FakeLlm::with_responses(
            "fake",
            (0..3).map(|_| FakeLlm::tool_call_response("getInventory", json!({}))),
        );
        let agent = LlmAgent::builder(llm.clone())
            .with_tool(Arc::new(RecordingTool::new("getInventory", "", Vec::<ToolResult>::new())))
            .with_max_iterations(2)
            .build();

        let err = agent.run(&mut Session::new(), "loop").await.unwrap_err();
        assert!(matches!(err, AgentError::IterationLimit { max: 2 }));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn session_thread_carries_over_between_runs() {
        let llm = FakeLlm::with_responses(
            "fake",
            [FakeLlm::text_response("first"), FakeLlm::text_response("second")],
        );
        let agent = LlmAgent::builder(llm.clone()).build();
        let mut session = Session::new();

        agent.run(&mut session, "one").await.unwrap();
        agent.run(&mut session, "two").await.unwrap();

        assert_eq!(
            llm.calls()[1].turns(),
            &[
                Turn::user("one"),
                Turn::Model(ModelReply::text("first")),
                Turn::user("two"),
            ]
        );
    }

    #[tokio::test]
    async fn parallel_tool_calls_each_get_a_response() {
        let calls = ModelReply::tool_calls(vec![
            ToolCall::new("a", "getInventory", json!({})),
            ToolCall::new("b", "getInventory", json!({})),
        ]);
        let llm = FakeLlm::with_responses(
            "fake",
            [FakeLlm::reply_response(calls), FakeLlm::text_response("ok")],
        );
        let tool = inventory_tool();
        let agent = LlmAgent::builder(llm.clone())
            .with_tool(Arc::new(tool.clone()))
            .build();

        agent.run(&mut Session::new(), "twice").await.unwrap();

        assert_eq!(tool.call_count(), 2);
        let second_call = &llm.calls()[1];
        let ids: Vec<_> = second_call.tool_responses().map(|r| r.tool_call_id()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(matches!(
            second_call.turns().last(),
            Some(Turn::ToolResults { responses }) if responses.len() == 2
        ));
    }
}
