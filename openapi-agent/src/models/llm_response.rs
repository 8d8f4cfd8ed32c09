//! Response returned by [`BaseLlm::generate_content`](crate::models::BaseLlm::generate_content).

use crate::models::ModelReply;
use serde::{Deserialize, Serialize};

/// Token accounting reported by the provider. Any field may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

impl TokenUsage {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            input_tokens: None,
            output_tokens: None,
            total_tokens: None,
        }
    }

    #[must_use]
    pub const fn partial(
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
        total_tokens: Option<u32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }

    #[must_use]
    pub const fn input_tokens(&self) -> Option<u32> {
        self.input_tokens
    }

    #[must_use]
    pub const fn output_tokens(&self) -> Option<u32> {
        self.output_tokens
    }

    /// Reported total, or input plus output when the provider omits it.
    #[must_use]
    pub fn total_tokens(&self) -> u32 {
        self.total_tokens.unwrap_or_else(|| {
            self.input_tokens.unwrap_or(0) + self.output_tokens.unwrap_or(0)
        })
    }
}

/// One model call's output and what it cost.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    reply: ModelReply,
    usage: TokenUsage,
}

impl LlmResponse {
    #[must_use]
    pub const fn new(reply: ModelReply, usage: TokenUsage) -> Self {
        Self { reply, usage }
    }

    #[must_use]
    pub const fn reply(&self) -> &ModelReply {
        &self.reply
    }

    #[must_use]
    pub const fn usage(&self) -> TokenUsage {
        self.usage
    }

    #[must_use]
    pub fn into_parts(self) -> (ModelReply, TokenUsage) {
        (self.reply, self.usage)
    }
}
