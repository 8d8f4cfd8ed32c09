//! An LLM agent whose tools are generated from an OpenAPI document.
//!
//! - [`tools::openapi`]: one tool per API operation, plus the OAuth2 client
//! - [`agent`]: the tool-calling loop and its after-tool hook
//! - [`models`]: the LLM seam and the Gemini provider
//! - [`config`]: YAML agent definitions
//! - [`petstore`]: the bundled Pet Store assistant

pub mod agent;
pub mod config;
pub mod errors;
pub mod models;
pub mod petstore;
pub mod tools;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent::{AfterToolCallback, LlmAgent, LogToolCalls, Session};
pub use errors::{AgentError, AgentResult};
