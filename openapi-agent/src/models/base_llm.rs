//! Base LLM trait for content generation.
//!
//! This module defines the [`BaseLlm`] trait, the single seam between the agent
//! loop and a model provider.
//!
//! # Examples
//!
//! ```ignore
//! use openapi_agent::models::{BaseLlm, Thread};
//!
//! async fn generate(llm: &dyn BaseLlm) {
//!     let thread = Thread::from_user("Show me pet 0");
//!     let response = llm.generate_content(thread, None).await.unwrap();
//!     println!("Response: {:?}", response);
//! }
//! ```

use std::sync::Arc;

use crate::errors::AgentResult;
use crate::models::{LlmResponse, Thread};
use crate::tools::BaseToolset;

/// Base trait for Large Language Model implementations.
///
/// Implementations are shared across async tasks and must be `Send + Sync`.
/// Provider-specific failures are mapped into [`AgentError`](crate::errors::AgentError)
/// variants (authentication, rate limit, generic provider error).
#[async_trait::async_trait]
pub trait BaseLlm: Send + Sync {
    /// Returns the model identifier for this LLM instance, e.g. `gemini-2.5-pro`.
    fn model_name(&self) -> &str;

    /// Generates content in response to a conversation thread.
    ///
    /// When a toolset is supplied its declarations are advertised to the model,
    /// which may answer with tool calls instead of (or alongside) text. Executing
    /// those calls is the caller's job.
    async fn generate_content(
        &self,
        thread: Thread,
        toolset: Option<Arc<dyn BaseToolset>>,
    ) -> AgentResult<LlmResponse>;
}
