use crate::agent::DEFAULT_MAX_ITERATIONS;
use crate::config::EnvKey;
use crate::errors::{AgentError, AgentResult};
use crate::models::providers::GeminiLlm;
use crate::petstore;
use crate::tools::HeaderOrQuery;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete agent configuration, usually read from YAML.
///
/// ```yaml
/// name: open_api_agent
/// model:
///   type: gemini
///   name: gemini-2.5-pro
///   api_key_env: GEMINI_API_KEY
/// spec:
///   location: http://127.0.0.1:8000/openapi.json
/// auth:
///   type: oauth2
///   client_id: agent
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AgentDefinition {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default = "default_instruction")]
    pub instruction: String,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub spec: SpecSource,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

/// Model configuration variants
///
/// `api_key_env` holds the **name** of the environment variable with the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelConfig {
    Gemini {
        #[serde(default = "default_model_name")]
        name: String,
        #[serde(default = "default_gemini_key")]
        api_key_env: EnvKey,
    },
}

/// Where the OpenAPI document comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SpecSource {
    /// File path or `http(s)` URL; the bundled Pet Store document when absent
    #[serde(default)]
    pub location: Option<String>,

    /// Overrides the document's `servers` entry
    #[serde(default)]
    pub base_url: Option<String>,
}

/// How the generated tools authenticate against the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthSettings {
    #[default]
    None,
    ApiKey {
        #[serde(default = "default_api_key_location")]
        location: HeaderOrQuery,
        #[serde(default = "default_api_key_name")]
        name: String,
        value_env: EnvKey,
    },
    Bearer {
        token_env: EnvKey,
    },
    /// Interactive authorization-code flow against a scheme of the document.
    Oauth2 {
        #[serde(default = "default_oauth_scheme")]
        scheme: String,
        #[serde(default = "default_client_id")]
        client_id: String,
        #[serde(default)]
        client_secret_env: Option<EnvKey>,
        #[serde(default = "default_redirect_uri")]
        redirect_uri: String,
    },
}

impl AuthSettings {
    /// The Pet Store demo key in the `api_key` header, read from `PETSTORE_API_KEY`.
    pub fn demo_api_key() -> Self {
        Self::ApiKey {
            location: HeaderOrQuery::Header,
            name: default_api_key_name(),
            value_env: EnvKey::new("PETSTORE_API_KEY"),
        }
    }

    pub fn default_oauth2() -> Self {
        Self::Oauth2 {
            scheme: default_oauth_scheme(),
            client_id: default_client_id(),
            client_secret_env: None,
            redirect_uri: default_redirect_uri(),
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Oauth2 { .. })
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::Gemini {
            name: default_model_name(),
            api_key_env: default_gemini_key(),
        }
    }
}

impl Default for AgentDefinition {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: default_description(),
            instruction: default_instruction(),
            model: ModelConfig::default(),
            spec: SpecSource::default(),
            auth: AuthSettings::default(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl AgentDefinition {
    pub fn from_yaml(yaml: &str) -> AgentResult<Self> {
        let definition: Self = serde_yaml::from_str(yaml)?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn from_file(path: impl AsRef<Path>) -> AgentResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AgentError::Config {
            field: "config".to_string(),
            reason: format!("failed to read '{}': {e}", path.display()),
        })?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> AgentResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> AgentResult<()> {
        let invalid = |field: &str, reason: &str| AgentError::Config {
            field: field.to_string(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name", "Agent name cannot be empty"));
        }
        if self.instruction.trim().is_empty() {
            return Err(invalid("instruction", "Instruction cannot be empty"));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }
        Ok(())
    }
}

fn default_name() -> String {
    petstore::AGENT_NAME.to_string()
}

fn default_description() -> String {
    petstore::AGENT_DESCRIPTION.to_string()
}

fn default_instruction() -> String {
    petstore::INSTRUCTION.to_string()
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_model_name() -> String {
    GeminiLlm::DEFAULT_MODEL.to_string()
}

fn default_gemini_key() -> EnvKey {
    EnvKey::new(GeminiLlm::API_KEY_ENV)
}

fn default_api_key_location() -> HeaderOrQuery {
    HeaderOrQuery::Header
}

fn default_api_key_name() -> String {
    "api_key".to_string()
}

fn default_oauth_scheme() -> String {
    "petstore_auth".to_string()
}

fn default_client_id() -> String {
    "openapi-agent".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:8080/callback".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_pet_store_defaults() {
        let definition = AgentDefinition::from_yaml("{}").unwrap();
        assert_eq!(definition, AgentDefinition::default());
        assert_eq!(definition.name, "open_api_agent");
        assert_eq!(definition.max_iterations, 20);
        assert_eq!(
            definition.model,
            ModelConfig::Gemini {
                name: "gemini-2.5-pro".into(),
                api_key_env: EnvKey::new("GEMINI_API_KEY"),
            }
        );
    }

    #[test]
    fn parses_api_key_auth() {
        let yaml = r#"
spec:
  location: http://127.0.0.1:8000/openapi.json
auth:
  type: api_key
  location: query
  value_env: PETSTORE_API_KEY
"#;
        let definition = AgentDefinition::from_yaml(yaml).unwrap();
        assert_eq!(
            definition.spec.location.as_deref(),
            Some("http://127.0.0.1:8000/openapi.json")
        );
        assert_eq!(
            definition.auth,
            AuthSettings::ApiKey {
                location: HeaderOrQuery::Query,
                name: "api_key".into(),
                value_env: EnvKey::new("PETSTORE_API_KEY"),
            }
        );
    }

    #[test]
    fn parses_oauth2_auth_with_defaults() {
        let definition = AgentDefinition::from_yaml("auth:\n  type: oauth2\n  client_id: cli\n").unwrap();
        assert!(definition.auth.is_interactive());
        let AuthSettings::Oauth2 { scheme, client_id, .. } = definition.auth else {
            panic!("expected oauth2 settings");
        };
        assert_eq!(scheme, "petstore_auth");
        assert_eq!(client_id, "cli");
    }

    #[test]
    fn rejects_unknown_fields_and_empty_instruction() {
        assert!(AgentDefinition::from_yaml("tools: []").is_err());
        let err = AgentDefinition::from_yaml("instruction: \"  \"").unwrap_err();
        assert!(err.to_string().contains("Instruction cannot be empty"));
        assert!(AgentDefinition::from_yaml("max_iterations: 0").is_err());
    }

    #[test]
    fn yaml_round_trip_keeps_settings() {
        let definition = AgentDefinition {
            auth: AuthSettings::default_oauth2(),
            ..AgentDefinition::default()
        };
        let yaml = definition.to_yaml().unwrap();
        assert_eq!(AgentDefinition::from_yaml(&yaml).unwrap(), definition);
    }
}
