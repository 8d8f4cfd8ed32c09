//! LLM provider implementations.
//!
//! - [`GeminiLlm`]: Gemini models via the Google AI `generateContent` API

mod gemini_llm;

pub use gemini_llm::GeminiLlm;
