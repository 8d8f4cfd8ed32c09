//! The Pet Store assistant: bundled API document, prompt and agent wiring.

use std::sync::Arc;

use crate::agent::{LlmAgent, LogToolCalls, DEFAULT_AGENT_NAME};
use crate::models::BaseLlm;
use crate::tools::BaseToolset;

/// OpenAPI document for the Pet Store operations the assistant can call.
pub const PETS_SPEC: &str = include_str!("../specs/pets.json");

pub const AGENT_NAME: &str = DEFAULT_AGENT_NAME;

pub const AGENT_DESCRIPTION: &str =
    "Manages a Pet Store using tools generated from an OpenAPI spec.";

pub const INSTRUCTION: &str = "\
You are a Pet Store assistant managing pets via an API.
Tell the user that you can tell them more about how to use the APIs and also call them for you.
Use the available tools to fulfill user requests.
For any tools that need user input, always tell the user about both required and non-required fields.
Only ask the user for required fields, and fake rest of the details needed so that tools do not fail.
Help user in understanding what all API endpoints exist, what all can a user do and what endpoints are public and what endpoints are secure.
You can determine if the endpoint needs authentication (and it's type) from the API specs.
DO NOT HALLUCINATE on the authentication type, check the specs and security scheme attached to the endpoints.
Also help generating code examples for the user if they would like to integrate these APIs.
The code examples should be in the language that user prefers such as Python, Javascript, etc.
Also, help the user with sample data so that they can create their own requests.
Share the exact response from the API/tools if the user asks so that helps the user to understand the endpoints.
";

/// API key the public Pet Store demo accepts.
pub const DEMO_API_KEY: &str = "special-key";

/// The assistant with its default name, prompt and logging hook.
pub fn assistant(model: Arc<dyn BaseLlm>, toolset: Arc<dyn BaseToolset>) -> LlmAgent {
    LlmAgent::builder_arc(model)
        .with_name(AGENT_NAME)
        .with_description(AGENT_DESCRIPTION)
        .with_instruction(INSTRUCTION)
        .with_toolset(toolset)
        .with_after_tool_callback(LogToolCalls)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeLlm;
    use crate::tools::openapi::{OpenApiSpec, OpenApiToolSet};

    #[test]
    fn bundled_spec_parses() {
        let spec = OpenApiSpec::from_str(PETS_SPEC, None).unwrap();
        assert_eq!(spec.base_url(), "http://127.0.0.1:8000");
        assert!(spec.security_scheme("api_key").is_some());
        assert!(spec.security_scheme("petstore_auth").is_some());
    }

    #[tokio::test]
    async fn assistant_exposes_the_four_operations() {
        let toolset = OpenApiToolSet::from_str("pets".into(), PETS_SPEC, None, None).unwrap();
        let mut names = toolset.tool_names();
        names.sort_unstable();
        assert_eq!(names, vec!["addPet", "getInventory", "getPetById", "updatePet"]);

        let agent = assistant(Arc::new(FakeLlm::default()), Arc::new(toolset));
        assert_eq!(agent.name(), "open_api_agent");
        assert!(agent.instruction().starts_with("You are a Pet Store assistant"));
        assert_eq!(agent.max_iterations(), 20);
    }
}
