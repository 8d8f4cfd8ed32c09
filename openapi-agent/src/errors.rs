//! Errors raised while configuring or running the agent.
//!
//! Failures of an individual API call are not errors here: the operation
//! tool turns them into a failed [`ToolResult`](crate::tools::ToolResult)
//! and the model gets to react.

pub type AgentResult<T> = std::result::Result<T, AgentError>;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("{provider} request failed: {reason}")]
    ModelRequest { provider: String, reason: String },

    #[error("{provider} rejected the API key")]
    ModelAuth { provider: String },

    #[error("{provider} rate limit exceeded")]
    ModelRateLimit { provider: String },

    #[error("Tool not found: {tool_name}")]
    ToolNotFound { tool_name: String },

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidToolArguments { tool_name: String, reason: String },

    #[error("Cannot set up {tool_name}: {reason}")]
    ToolSetupFailed { tool_name: String, reason: String },

    #[error("No answer after {max} model calls")]
    IterationLimit { max: usize },

    #[error("OAuth2 {stage} failed: {reason}")]
    OAuthFlow { stage: String, reason: String },

    #[error("Invalid configuration: {field}: {reason}")]
    Config { field: String, reason: String },

    #[error("Missing setting: {field}")]
    MissingSetting { field: String },

    #[error("HTTP {operation} failed: {reason}")]
    Http { operation: String, reason: String },

    #[error("Cannot decode {format}: {reason}")]
    Decode { format: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<AgentError> for crate::tools::ToolResult {
    fn from(error: AgentError) -> Self {
        Self::error(error.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode {
            format: "json".to_string(),
            reason: error.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for AgentError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Decode {
            format: "yaml".to_string(),
            reason: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(error: reqwest::Error) -> Self {
        let operation = match error.url() {
            Some(url) => format!("request to {}", url.path()),
            None => "request".to_string(),
        };
        Self::Http {
            operation,
            reason: error.to_string(),
        }
    }
}
