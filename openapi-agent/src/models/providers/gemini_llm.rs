//! Google Gemini LLM provider implementation.
//!
//! API Documentation: <https://ai.google.dev/api/generate-content>
//! Model Names: <https://ai.google.dev/gemini-api/docs/models/gemini>

use std::sync::Arc;

use serde_json::{json, Value};

use crate::errors::{AgentError, AgentResult};
use crate::models::{BaseLlm, LlmResponse, ModelReply, Thread, TokenUsage, Turn};
use crate::tools::{BaseToolset, ToolCall, ToolResponse};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const PROVIDER: &str = "Gemini";

/// Google Gemini LLM implementation.
///
/// The key is sent in the `x-goog-api-key` header. Configuration files name
/// the environment variable holding it, `GEMINI_API_KEY` by default.
pub struct GeminiLlm {
    model_name: String,
    api_key: String,
    base_url: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    client: reqwest::Client,
}

impl GeminiLlm {
    /// Environment variable name for the Gemini API key.
    pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

    /// Model used when none is configured.
    pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

    /// Creates a new Gemini LLM instance with explicit API key.
    pub fn new(model_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            max_tokens: None,
            temperature: None,
            client: reqwest::Client::new(),
        }
    }

    /// Sets a custom base URL for the API endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the maximum number of tokens to generate.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the temperature for generation (0.0 to 2.0).
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Converts a Thread into Gemini API request format.
    async fn build_request_payload(
        &self,
        thread: Thread,
        toolset: Option<Arc<dyn BaseToolset>>,
    ) -> AgentResult<Value> {
        let (system_prompt, turns) = thread.into_parts();

        // Gemini only knows "user" and "model"; tool results travel as user turns
        let contents: Vec<Value> = turns
            .iter()
            .map(|turn| match turn {
                Turn::User { text } => json!({"role": "user", "parts": [{"text": text}]}),
                Turn::Model(reply) => json!({"role": "model", "parts": reply_parts(reply)}),
                Turn::ToolResults { responses } => json!({
                    "role": "user",
                    "parts": responses.iter().map(function_response).collect::<Vec<_>>()
                }),
            })
            .collect();

        let mut payload = json!({
            "contents": contents
        });

        if let Some(system) = system_prompt {
            payload["systemInstruction"] = json!({"parts": [{"text": system}]});
        }

        let mut generation_config = serde_json::Map::new();
        if let Some(temperature) = self.temperature {
            generation_config.insert("temperature".into(), json!(temperature));
        }
        if let Some(max_tokens) = self.max_tokens {
            generation_config.insert("maxOutputTokens".into(), json!(max_tokens));
        }
        if !generation_config.is_empty() {
            payload["generationConfig"] = Value::Object(generation_config);
        }

        if let Some(toolset) = toolset {
            let tools_list = toolset.get_tools().await;
            if !tools_list.is_empty() {
                let function_declarations: Vec<Value> = tools_list
                    .iter()
                    .map(|tool| {
                        let decl = tool.declaration();
                        json!({
                            "name": decl.name(),
                            "description": decl.description(),
                            "parameters": decl.parameters()
                        })
                    })
                    .collect();

                payload["tools"] = json!([{
                    "function_declarations": function_declarations
                }]);
            }
        }

        Ok(payload)
    }

    /// Collects the text and `functionCall` parts of the first candidate.
    fn parse_response(&self, response_body: &Value) -> AgentResult<ModelReply> {
        let mut reply = ModelReply::default();

        let first_candidate = response_body
            .get("candidates")
            .and_then(|v| v.as_array())
            .and_then(|candidates| candidates.first())
            .ok_or_else(|| provider_error("Missing or empty 'candidates' in response"))?;

        let parts = first_candidate
            .get("content")
            .and_then(|v| v.get("parts"))
            .and_then(|v| v.as_array())
            .ok_or_else(|| provider_error("Missing or invalid 'content.parts' in candidate"))?;

        for part in parts {
            if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
                if !text.trim().is_empty() {
                    reply.push_text(text);
                }
            }

            if let Some(function_call) = part.get("functionCall") {
                let name = function_call
                    .get("name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| provider_error("Missing 'name' in functionCall"))?;

                let args = function_call.get("args").cloned().unwrap_or(Value::Null);

                // Gemini doesn't provide call_id, so use name as id
                reply.tool_calls.push(ToolCall::new(name, name, args));
            }
        }

        Ok(reply)
    }

    /// Parses token usage. `candidatesTokenCount` excludes `thoughtsTokenCount`,
    /// so the two are summed into the output count.
    fn parse_usage(&self, response_body: &Value) -> TokenUsage {
        let Some(usage_obj) = response_body.get("usageMetadata") else {
            return TokenUsage::empty();
        };

        let count = |field: &str| {
            usage_obj
                .get(field)
                .and_then(Value::as_u64)
                .map(|v| v as u32)
        };

        let completion_tokens = match (count("candidatesTokenCount"), count("thoughtsTokenCount")) {
            (Some(c), Some(t)) => Some(c + t),
            (c, t) => c.or(t),
        };

        TokenUsage::partial(
            count("promptTokenCount"),
            completion_tokens,
            count("totalTokenCount"),
        )
    }
}

fn provider_error(message: &str) -> AgentError {
    AgentError::ModelRequest {
        provider: PROVIDER.to_string(),
        reason: message.to_string(),
    }
}

fn reply_parts(reply: &ModelReply) -> Vec<Value> {
    let text = reply.text.iter().map(|text| json!({"text": text}));
    let calls = reply.tool_calls.iter().map(|call| {
        json!({"functionCall": {"name": call.name(), "args": call.arguments()}})
    });
    text.chain(calls).collect()
}

fn function_response(tool_response: &ToolResponse) -> Value {
    let result = tool_response.result();
    let response_content = if result.is_success() {
        result.data().clone()
    } else {
        json!({
            "error": result.error_message().unwrap_or("Unknown error")
        })
    };

    json!({
        "functionResponse": {
            "name": tool_response.tool_call_id(),
            "response": {
                "name": tool_response.tool_call_id(),
                "content": response_content
            }
        }
    })
}

#[async_trait::async_trait]
impl BaseLlm for GeminiLlm {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    #[tracing::instrument(skip_all, fields(model = %self.model_name))]
    async fn generate_content(
        &self,
        thread: Thread,
        toolset: Option<Arc<dyn BaseToolset>>,
    ) -> AgentResult<LlmResponse> {
        let payload = self.build_request_payload(thread, toolset).await?;

        let url = format!(
            "{}models/{}:generateContent",
            self.base_url, self.model_name
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(match status.as_u16() {
                401 | 403 => AgentError::ModelAuth {
                    provider: PROVIDER.to_string(),
                },
                429 => AgentError::ModelRateLimit {
                    provider: PROVIDER.to_string(),
                },
                _ => AgentError::ModelRequest {
                    provider: PROVIDER.to_string(),
                    reason: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let response_body: Value = response.json().await?;

        if let Some(error) = response_body.get("error") {
            return Err(provider_error(&format!("API error: {error}")));
        }

        let reply = self.parse_response(&response_body)?;
        let usage = self.parse_usage(&response_body);
        tracing::debug!(
            tool_calls = reply.tool_calls.len(),
            total_tokens = usage.total_tokens(),
            "gemini response parsed"
        );

        Ok(LlmResponse::new(reply, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolList, ToolResult};
    use crate::test_support::RecordingTool;

    fn llm() -> GeminiLlm {
        GeminiLlm::new(GeminiLlm::DEFAULT_MODEL, "test-key")
    }

    #[tokio::test]
    async fn payload_maps_roles_and_tools() {
        let thread = Thread::from_user("show pet 0")
            .with_system("You manage pets")
            .with_turn(ModelReply::tool_calls(vec![ToolCall::new(
                "getPetById",
                "getPetById",
                json!({"petId": 0}),
            )]))
            .with_turn(Turn::ToolResults {
                responses: vec![ToolResponse::new(
                    "getPetById",
                    ToolResult::success(json!({"status": 200})),
                )],
            });

        let toolset: Arc<dyn BaseToolset> = Arc::new(
            ToolList::default().with_tool(Arc::new(RecordingTool::default())),
        );

        let payload = llm()
            .with_temperature(0.5)
            .build_request_payload(thread, Some(toolset))
            .await
            .unwrap();

        assert_eq!(payload["systemInstruction"]["parts"][0]["text"], "You manage pets");
        let contents = payload["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["functionCall"]["args"]["petId"], 0);
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(
            contents[2]["parts"][0]["functionResponse"]["response"]["content"]["status"],
            200
        );
        assert_eq!(payload["generationConfig"]["temperature"], 0.5);
        assert_eq!(
            payload["tools"][0]["function_declarations"][0]["name"],
            "recording_tool"
        );
    }

    #[tokio::test]
    async fn payload_reports_tool_errors() {
        let thread = Thread::from_user("add pet").with_turn(Turn::ToolResults {
            responses: vec![ToolResponse::new(
                "addPet",
                ToolResult::error("HTTP 401 Unauthorized"),
            )],
        });
        let payload = llm().build_request_payload(thread, None).await.unwrap();

        assert!(payload.get("generationConfig").is_none());
        assert!(payload.get("tools").is_none());
        assert_eq!(
            payload["contents"][1]["parts"][0]["functionResponse"]["response"]["content"]["error"],
            "HTTP 401 Unauthorized"
        );
    }

    #[test]
    fn parse_response_extracts_text_and_calls() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Let me look that up."},
                    {"functionCall": {"name": "getInventory", "args": {}}}
                ]}
            }],
            "usageMetadata": {
                "promptTokenCount": 12,
                "candidatesTokenCount": 4,
                "thoughtsTokenCount": 6,
                "totalTokenCount": 22
            }
        });

        let gemini = llm();
        let reply = gemini.parse_response(&body).unwrap();
        assert_eq!(reply.text.as_deref(), Some("Let me look that up."));
        let calls = &reply.tool_calls;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name(), "getInventory");
        assert_eq!(calls[0].id(), "getInventory");

        let usage = gemini.parse_usage(&body);
        assert_eq!(usage.input_tokens(), Some(12));
        assert_eq!(usage.output_tokens(), Some(10));
        assert_eq!(usage.total_tokens(), 22);
    }

    #[test]
    fn parse_response_rejects_empty_candidates() {
        let err = llm().parse_response(&json!({"candidates": []})).unwrap_err();
        assert!(matches!(err, AgentError::ModelRequest { .. }));
    }
}
