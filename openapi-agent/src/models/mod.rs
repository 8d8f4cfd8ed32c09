//! The LLM seam: conversation types, the [`BaseLlm`] trait and providers.

pub mod base_llm;
pub mod conversation;
pub mod llm_response;
pub mod providers;

pub use self::base_llm::BaseLlm;
pub use self::conversation::{ModelReply, Thread, Turn};
pub use self::llm_response::{LlmResponse, TokenUsage};
