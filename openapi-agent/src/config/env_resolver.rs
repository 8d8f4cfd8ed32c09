//! References to secrets held in environment variables.

use crate::errors::AgentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Name of an environment variable, never its value.
///
/// Serializes as a bare string, so YAML can say `api_key_env: GEMINI_API_KEY`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvKey(String);

/// Resolves a key through something other than the process environment.
pub type EnvResolverFn = Arc<dyn Fn(&str) -> Result<String, AgentError> + Send + Sync>;

impl EnvKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }

    /// Looks the key up in the environment. Unset and empty are both errors.
    pub fn resolve(&self) -> Result<String, AgentError> {
        default_env_resolver(&self.0)
    }

    /// Uses `resolver` when given, the environment otherwise.
    pub fn resolve_with(&self, resolver: Option<&EnvResolverFn>) -> Result<String, AgentError> {
        match resolver {
            Some(resolver) => resolver(self.key()),
            None => self.resolve(),
        }
    }
}

impl fmt::Display for EnvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EnvKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

pub fn default_env_resolver(key: &str) -> Result<String, AgentError> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) => Err(AgentError::Config {
            field: key.to_string(),
            reason: format!("Environment variable '{key}' is empty"),
        }),
        Err(_) => Err(AgentError::MissingSetting {
            field: key.to_string(),
        }),
    }
}
