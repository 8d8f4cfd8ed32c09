//! Conversation history exchanged with the model.
//!
//! A [`Thread`] is a system instruction plus [`Turn`]s. Every tool call in a
//! [`Turn::Model`] is answered by a matching [`ToolResponse`] in the
//! [`Turn::ToolResults`] that follows it; providers reject threads that break
//! this pairing.

use serde::{Deserialize, Serialize};

use crate::tools::{ToolCall, ToolResponse};

/// What the model produced on one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: None,
            tool_calls,
        }
    }

    /// Appends a text fragment, separated from earlier text by a blank line.
    pub fn push_text(&mut self, fragment: &str) {
        match &mut self.text {
            Some(text) => {
                text.push_str("\n\n");
                text.push_str(fragment);
            }
            None => self.text = Some(fragment.to_string()),
        }
    }

    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    User { text: String },
    Model(ModelReply),
    ToolResults { responses: Vec<ToolResponse> },
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }
}

impl From<ModelReply> for Turn {
    fn from(reply: ModelReply) -> Self {
        Self::Model(reply)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(default)]
    turns: Vec<Turn>,
}

impl Thread {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_user(text: impl Into<String>) -> Self {
        Self::new().with_turn(Turn::user(text))
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_turn(mut self, turn: impl Into<Turn>) -> Self {
        self.push(turn);
        self
    }

    pub fn push(&mut self, turn: impl Into<Turn>) {
        self.turns.push(turn.into());
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drops every turn after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.turns.truncate(len);
    }

    pub fn into_parts(self) -> (Option<String>, Vec<Turn>) {
        (self.system, self.turns)
    }

    pub fn tool_responses(&self) -> impl Iterator<Item = &ToolResponse> {
        self.turns.iter().flat_map(|turn| match turn {
            Turn::ToolResults { responses } => responses.as_slice(),
            _ => &[][..],
        })
    }

    /// Tool calls that no later turn answers.
    pub fn unanswered_calls(&self) -> Vec<&ToolCall> {
        let mut pending: Vec<&ToolCall> = Vec::new();
        for turn in &self.turns {
            match turn {
                Turn::Model(reply) => pending.extend(&reply.tool_calls),
                Turn::ToolResults { responses } => pending.retain(|call| {
                    !responses
                        .iter()
                        .any(|response| response.tool_call_id() == call.id())
                }),
                Turn::User { .. } => {}
            }
        }
        pending
    }

    /// One line per text or tool exchange, for logs and assertions.
    pub fn transcript(&self) -> String {
        let mut lines = Vec::new();
        for turn in &self.turns {
            match turn {
                Turn::User { text } => lines.push(format!("user: {text}")),
                Turn::Model(reply) => {
                    if let Some(text) = &reply.text {
                        lines.push(format!("model: {text}"));
                    }
                    for call in &reply.tool_calls {
                        lines.push(format!("call {}: {}", call.name(), call.arguments()));
                    }
                }
                Turn::ToolResults { responses } => {
                    for response in responses {
                        lines.push(format!(
                            "result {}: {}",
                            response.tool_call_id(),
                            response.result().to_json()
                        ));
                    }
                }
            }
        }
        lines.join("\n")
    }
}
