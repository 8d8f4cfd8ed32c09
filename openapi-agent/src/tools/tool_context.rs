//! ToolContext - the limited view of the running agent that tools receive.

use serde_json::Value;

use crate::tools::execution_state::ExecutionState;

pub struct ToolContext<'a> {
    state: &'a dyn ExecutionState,
    agent_name: &'a str,
    invocation_id: &'a str,
}

impl<'a> ToolContext<'a> {
    pub fn builder(state: &'a dyn ExecutionState) -> ToolContextBuilder<'a> {
        ToolContextBuilder {
            state,
            agent_name: "",
            invocation_id: "",
        }
    }

    /// Name of the agent running the tool.
    pub fn agent_name(&self) -> &str {
        self.agent_name
    }

    /// Identifies one `run` of the agent; shared by every tool call it makes.
    pub fn invocation_id(&self) -> &str {
        self.invocation_id
    }

    pub fn state(&self) -> &dyn ExecutionState {
        self.state
    }

    pub fn get_state(&self, key: &str) -> Option<Value> {
        self.state.get_state(key)
    }

    pub fn set_state(&self, key: &str, value: Value) {
        self.state.set_state(key, value);
    }
}

pub struct ToolContextBuilder<'a> {
    state: &'a dyn ExecutionState,
    agent_name: &'a str,
    invocation_id: &'a str,
}

impl<'a> ToolContextBuilder<'a> {
    #[must_use]
    pub fn with_agent_name(mut self, agent_name: &'a str) -> Self {
        self.agent_name = agent_name;
        self
    }

    #[must_use]
    pub fn with_invocation_id(mut self, invocation_id: &'a str) -> Self {
        self.invocation_id = invocation_id;
        self
    }

    pub fn build(self) -> ToolContext<'a> {
        ToolContext {
            state: self.state,
            agent_name: self.agent_name,
            invocation_id: self.invocation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::DefaultExecutionState;
    use serde_json::json;

    #[test]
    fn context_exposes_identity_and_state() {
        let state = DefaultExecutionState::new();
        let ctx = ToolContext::builder(&state)
            .with_agent_name("open_api_agent")
            .with_invocation_id("inv-1")
            .build();

        assert_eq!(ctx.agent_name(), "open_api_agent");
        assert_eq!(ctx.invocation_id(), "inv-1");

        ctx.set_state("token", json!("sat_x"));
        assert_eq!(state.get_state("token"), Some(json!("sat_x")));
    }
}
