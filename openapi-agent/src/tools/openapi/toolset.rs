//! OpenAPI Toolset - Dynamic tool generation from OpenAPI specifications
//!
//! Implements [`BaseToolset`] for an OpenAPI document, generating one tool
//! per API operation.

use crate::errors::{AgentError, AgentResult};
use crate::tools::openapi::{OpenApiOperationTool, OpenApiSpec};
use crate::tools::{BaseTool, BaseToolset};
use async_trait::async_trait;
use openapiv3::{Operation, ReferenceOr};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Generates one [`OpenApiOperationTool`] per operation of a document.
pub struct OpenApiToolSet {
    name: String,
    /// Path or URL the document was loaded from
    spec_path: String,
    tools: Vec<Arc<OpenApiOperationTool>>,
}

impl OpenApiToolSet {
    /// Create a toolset from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Example
    /// ```no_run
    /// use openapi_agent::tools::openapi::{AuthConfig, HeaderOrQuery, OpenApiToolSet};
    ///
    /// # async fn demo() -> openapi_agent::errors::AgentResult<()> {
    /// let auth = AuthConfig::ApiKey {
    ///     location: HeaderOrQuery::Header,
    ///     name: "api_key".to_string(),
    ///     value: "special-key".to_string(),
    /// };
    ///
    /// let toolset =
    ///     OpenApiToolSet::from_file("petstore_api".to_string(), "specs/pets.json", Some(auth))
    ///         .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_file(
        name: String,
        path: impl AsRef<Path>,
        auth: Option<AuthConfig>,
    ) -> AgentResult<Self> {
        let spec_path = path.as_ref().to_string_lossy().to_string();
        let spec = OpenApiSpec::from_file(path)?;
        Self::from_spec(name, spec_path, spec, auth)
    }

    /// Create a toolset from a document served over HTTP.
    pub async fn from_url(
        name: String,
        url: &str,
        auth: Option<AuthConfig>,
    ) -> AgentResult<Self> {
        let spec = OpenApiSpec::from_url(url).await?;
        Self::from_spec(name, url.to_string(), spec, auth)
    }

    /// Create a toolset from an in-memory JSON or YAML document.
    pub fn from_str(
        name: String,
        content: &str,
        base_url: Option<String>,
        auth: Option<AuthConfig>,
    ) -> AgentResult<Self> {
        let spec = OpenApiSpec::from_str(content, base_url)?;
        Self::from_spec(name, "<inline>".to_string(), spec, auth)
    }

    /// Create a toolset from an already parsed document.
    pub fn from_spec(
        name: String,
        spec_path: String,
        spec: OpenApiSpec,
        auth: Option<AuthConfig>,
    ) -> AgentResult<Self> {
        let spec = Arc::new(spec);
        let http_client = Arc::new(
            reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|e| AgentError::ToolSetupFailed {
                    tool_name: name.clone(),
                    reason: format!("failed to build HTTP client: {e}"),
                })?,
        );

        let mut tools = Vec::new();
        for (path, path_item) in &spec.spec().paths.paths {
            // $ref path items are not followed
            let ReferenceOr::Item(path_item) = path_item else {
                continue;
            };

            let operations = [
                (Method::GET, &path_item.get),
                (Method::POST, &path_item.post),
                (Method::PUT, &path_item.put),
                (Method::DELETE, &path_item.delete),
                (Method::PATCH, &path_item.patch),
                (Method::HEAD, &path_item.head),
                (Method::OPTIONS, &path_item.options),
                (Method::TRACE, &path_item.trace),
            ];

            for (method, operation) in operations {
                let Some(operation) = operation else {
                    continue;
                };
                let operation_id = operation
                    .operation_id
                    .clone()
                    .unwrap_or_else(|| synthetic_operation_id(&method, path));

                tools.push(Arc::new(OpenApiOperationTool::new(
                    operation_id,
                    operation_description(&method, path, operation),
                    method,
                    path.clone(),
                    spec.clone(),
                    http_client.clone(),
                    auth.clone(),
                )));
            }
        }

        tracing::debug!(toolset = %name, tools = tools.len(), "generated OpenAPI tools");

        Ok(Self {
            name,
            spec_path,
            tools,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec_path(&self) -> &str {
        &self.spec_path
    }

    /// Names of the generated tools, in document order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

/// `GET /pet/{petId}` becomes `get_pet_by_petId`.
fn synthetic_operation_id(method: &Method, path: &str) -> String {
    let path = path
        .trim_start_matches('/')
        .replace('/', "_")
        .replace('{', "by_")
        .replace('}', "");
    format!("{}_{}", method.as_str().to_lowercase(), path)
}

fn operation_description(method: &Method, path: &str, operation: &Operation) -> String {
    operation
        .summary
        .clone()
        .or_else(|| operation.description.clone())
        .unwrap_or_else(|| format!("{method} {path}"))
}

/// Runtime authentication configuration (contains secrets, never serialized).
///
/// Use `None` instead of an enum variant to represent no authentication.
#[derive(Clone)]
pub enum AuthConfig {
    Basic {
        username: String,
        password: String,
    },
    ApiKey {
        location: HeaderOrQuery,
        name: String,
        value: String,
    },
    /// OAuth2 access token sent as `Authorization: Bearer <token>`
    Bearer { token: String },
}

impl AuthConfig {
    /// Builds credentials from a token and the name of its scheme.
    ///
    /// `"apikey"` needs a location and a parameter name; `"oauth2Token"` and
    /// `"bearer"` take the value as an access token.
    pub fn from_token(
        scheme: &str,
        location: Option<HeaderOrQuery>,
        name: Option<&str>,
        value: impl Into<String>,
    ) -> AgentResult<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "apikey" => {
                let name = name.ok_or_else(|| AgentError::MissingSetting {
                    field: "api key parameter name".to_string(),
                })?;
                Ok(Self::ApiKey {
                    location: location.unwrap_or(HeaderOrQuery::Header),
                    name: name.to_string(),
                    value: value.into(),
                })
            }
            "oauth2token" | "bearer" => Ok(Self::Bearer {
                token: value.into(),
            }),
            other => Err(AgentError::Config {
                field: "auth_scheme".to_string(),
                reason: format!("unsupported token scheme '{other}'"),
            }),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::ApiKey { location, name, .. } => f
                .debug_struct("ApiKey")
                .field("location", location)
                .field("name", name)
                .field("value", &"<redacted>")
                .finish(),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"<redacted>").finish(),
        }
    }
}

/// Location for API key authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderOrQuery {
    Header,
    Query,
}

impl std::str::FromStr for HeaderOrQuery {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "header" => Ok(Self::Header),
            "query" => Ok(Self::Query),
            other => Err(AgentError::Config {
                field: "api_key.location".to_string(),
                reason: format!("expected 'header' or 'query', got '{other}'"),
            }),
        }
    }
}

#[async_trait]
impl BaseToolset for OpenApiToolSet {
    async fn get_tools(&self) -> Vec<Arc<dyn BaseTool>> {
        self.tools
            .iter()
            .map(|t| t.clone() as Arc<dyn BaseTool>)
            .collect()
    }
}

impl std::fmt::Debug for OpenApiToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenApiToolSet")
            .field("name", &self.name)
            .field("spec_path", &self.spec_path)
            .field("tools_count", &self.tools.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Test API", "version": "1.0.0"},
        "paths": {
            "/pet/{petId}": {
                "get": {"summary": "Find pet by ID", "responses": {"200": {"description": "OK"}}},
                "delete": {"operationId": "deletePet", "description": "Deletes a pet",
                           "responses": {"200": {"description": "OK"}}}
            },
            "/store/inventory": {
                "get": {"operationId": "getInventory", "responses": {"200": {"description": "OK"}}}
            }
        }
    }"#;

    #[tokio::test]
    async fn generates_one_tool_per_operation() {
        let toolset = OpenApiToolSet::from_str("pets".into(), SPEC, None, None).unwrap();
        let mut names = toolset.tool_names();
        names.sort_unstable();
        assert_eq!(names, vec!["deletePet", "getInventory", "get_pet_by_petId"]);
        assert_eq!(toolset.get_tools().await.len(), 3);
    }

    #[tokio::test]
    async fn descriptions_fall_back_to_method_and_path() {
        let toolset = OpenApiToolSet::from_str("pets".into(), SPEC, None, None).unwrap();
        let tools = toolset.get_tools().await;
        let description = |name: &str| {
            tools
                .iter()
                .find(|t| t.name() == name)
                .map(|t| t.description().to_string())
                .unwrap()
        };
        assert_eq!(description("get_pet_by_petId"), "Find pet by ID");
        assert_eq!(description("deletePet"), "Deletes a pet");
        assert_eq!(description("getInventory"), "GET /store/inventory");
    }

    #[test]
    fn from_token_maps_schemes() {
        let auth = AuthConfig::from_token("apikey", None, Some("api_key"), "secret").unwrap();
        assert!(matches!(
            auth,
            AuthConfig::ApiKey { location: HeaderOrQuery::Header, ref name, ref value }
                if name == "api_key" && value == "secret"
        ));

        let auth = AuthConfig::from_token("oauth2Token", None, None, "sat_1").unwrap();
        assert!(matches!(auth, AuthConfig::Bearer { ref token } if token == "sat_1"));

        assert!(AuthConfig::from_token("apikey", None, None, "x").is_err());
        assert!(AuthConfig::from_token("digest", None, None, "x").is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let auth = AuthConfig::Bearer {
            token: "sat_secret".into(),
        };
        assert!(!format!("{auth:?}").contains("sat_secret"));
    }

    #[test]
    fn header_or_query_parses_case_insensitively() {
        assert_eq!("Header".parse::<HeaderOrQuery>().unwrap(), HeaderOrQuery::Header);
        assert_eq!("query".parse::<HeaderOrQuery>().unwrap(), HeaderOrQuery::Query);
        assert!("cookie".parse::<HeaderOrQuery>().is_err());
    }
}
