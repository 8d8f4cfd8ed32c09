//! Agent definition primitives.

pub mod callbacks;
pub mod llm_agent;
pub mod session;

pub use callbacks::{AfterToolCallback, LogToolCalls};
pub use llm_agent::{LlmAgent, LlmAgentBuilder, DEFAULT_AGENT_NAME, DEFAULT_MAX_ITERATIONS};
pub use session::Session;
