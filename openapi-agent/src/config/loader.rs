//! Turns an [`AgentDefinition`] into a running [`LlmAgent`].
//!
//! Loading happens in steps so the CLI can slot the interactive OAuth2 flow
//! between reading the document and building the tools.

use std::sync::Arc;

use crate::agent::{LlmAgent, LogToolCalls};
use crate::config::{AgentDefinition, AuthSettings, EnvResolverFn, ModelConfig, SpecSource};
use crate::errors::{AgentError, AgentResult};
use crate::models::providers::GeminiLlm;
use crate::models::BaseLlm;
use crate::petstore::PETS_SPEC;
use crate::tools::openapi::{AuthConfig, OAuth2AuthorizationCode, OpenApiSpec, OpenApiToolSet};

/// Resolves secrets through the environment unless given a custom resolver.
#[derive(Clone, Default)]
pub struct AgentLoader {
    resolver: Option<EnvResolverFn>,
}

impl AgentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve secrets from a vault or similar instead of the environment.
    #[must_use]
    pub fn with_resolver(mut self, resolver: EnvResolverFn) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn model(&self, model: &ModelConfig) -> AgentResult<Arc<dyn BaseLlm>> {
        match model {
            ModelConfig::Gemini { name, api_key_env } => {
                let api_key = api_key_env.resolve_with(self.resolver.as_ref())?;
                Ok(Arc::new(GeminiLlm::new(name.clone(), api_key)))
            }
        }
    }

    /// Reads the document from a URL, a file, or the bundled Pet Store spec.
    pub async fn load_spec(&self, source: &SpecSource) -> AgentResult<OpenApiSpec> {
        let spec = match source.location.as_deref() {
            None => OpenApiSpec::from_str(PETS_SPEC, None)?,
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                OpenApiSpec::from_url(url).await?
            }
            Some(path) => OpenApiSpec::from_file(path)?,
        };
        Ok(match &source.base_url {
            Some(base_url) => spec.with_base_url(base_url.clone()),
            None => spec,
        })
    }

    /// Credentials that need no user interaction.
    ///
    /// # Errors
    ///
    /// OAuth2 settings are rejected here; use [`oauth2_client`](Self::oauth2_client).
    pub fn static_auth(&self, auth: &AuthSettings) -> AgentResult<Option<AuthConfig>> {
        match auth {
            AuthSettings::None => Ok(None),
            AuthSettings::ApiKey {
                location,
                name,
                value_env,
            } => Ok(Some(AuthConfig::ApiKey {
                location: *location,
                name: name.clone(),
                value: value_env.resolve_with(self.resolver.as_ref())?,
            })),
            AuthSettings::Bearer { token_env } => Ok(Some(AuthConfig::Bearer {
                token: token_env.resolve_with(self.resolver.as_ref())?,
            })),
            AuthSettings::Oauth2 { .. } => Err(AgentError::Config {
                field: "auth".to_string(),
                reason: "oauth2 needs the interactive authorization flow".to_string(),
            }),
        }
    }

    /// OAuth2 client for the configured security scheme, if OAuth2 is configured.
    pub fn oauth2_client(
        &self,
        auth: &AuthSettings,
        spec: &OpenApiSpec,
    ) -> AgentResult<Option<OAuth2AuthorizationCode>> {
        let AuthSettings::Oauth2 {
            scheme,
            client_id,
            client_secret_env,
            redirect_uri,
        } = auth
        else {
            return Ok(None);
        };

        let mut client =
            OAuth2AuthorizationCode::from_spec(spec, scheme, client_id.clone(), redirect_uri.clone())?;
        if let Some(secret_env) = client_secret_env {
            client = client.with_client_secret(secret_env.resolve_with(self.resolver.as_ref())?);
        }
        Ok(Some(client))
    }

    /// Generates the tools and assembles the agent.
    pub fn build_agent(
        &self,
        definition: &AgentDefinition,
        model: Arc<dyn BaseLlm>,
        spec: OpenApiSpec,
        auth: Option<AuthConfig>,
    ) -> AgentResult<LlmAgent> {
        definition.validate()?;
        let spec_path = definition
            .spec
            .location
            .clone()
            .unwrap_or_else(|| "<bundled pets.json>".to_string());
        let toolset = OpenApiToolSet::from_spec(format!("{}_tools", definition.name), spec_path, spec, auth)?;
        tracing::info!(tools = ?toolset.tool_names(), "loaded OpenAPI toolset");

        Ok(LlmAgent::builder_arc(model)
            .with_name(definition.name.clone())
            .with_description(definition.description.clone())
            .with_instruction(definition.instruction.clone())
            .with_toolset(Arc::new(toolset))
            .with_after_tool_callback(LogToolCalls)
            .with_max_iterations(definition.max_iterations)
            .build())
    }
}

impl std::fmt::Debug for AgentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentLoader")
            .field("custom_resolver", &self.resolver.is_some())
            .finish()
    }
}
