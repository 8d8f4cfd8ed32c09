//! OpenAPI Specification Parser
//!
//! Loads, parses and validates OpenAPI 3.x documents from files (JSON/YAML),
//! URLs or strings.

use openapiv3::{OpenAPI, Parameter, ReferenceOr, Schema, SecurityScheme};
use std::collections::HashSet;
use std::path::Path;

use crate::errors::{AgentError, AgentResult};

const FALLBACK_BASE_URL: &str = "http://localhost";

/// Parsed OpenAPI specification with extracted metadata
#[derive(Debug, Clone)]
pub struct OpenApiSpec {
    spec: OpenAPI,
    /// Base URL for API calls, from `servers[0]` unless overridden
    base_url: String,
}

fn spec_error(reason: impl Into<String>) -> AgentError {
    AgentError::Config {
        field: "openapi_spec".to_string(),
        reason: reason.into(),
    }
}

impl OpenApiSpec {
    /// Load OpenAPI spec from file with STRICT format detection
    ///
    /// File extension MUST match content:
    /// - `.json` → JSON content
    /// - `.yaml` or `.yml` → YAML content
    /// - No extension or unknown → Error
    pub fn from_file(path: impl AsRef<Path>) -> AgentResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            spec_error(format!("Failed to read spec file '{}': {}", path.display(), e))
        })?;

        let spec = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str::<OpenAPI>(&content).map_err(|e| {
                spec_error(format!(
                    "Failed to parse '{}' as JSON: {}. \
                     If the file contains YAML, rename it to .yaml or .yml",
                    path.display(),
                    e
                ))
            })?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str::<OpenAPI>(&content).map_err(|e| {
                    spec_error(format!(
                        "Failed to parse '{}' as YAML: {}. \
                         If the file contains JSON, rename it to .json",
                        path.display(),
                        e
                    ))
                })?
            }
            Some(ext) => {
                return Err(spec_error(format!(
                    "Unsupported file extension '.{}' for '{}'; expected .json, .yaml or .yml",
                    ext,
                    path.display()
                )));
            }
            None => {
                return Err(spec_error(format!(
                    "No file extension for '{}'; expected .json, .yaml or .yml",
                    path.display()
                )));
            }
        };

        Self::from_parsed(spec, None)
    }

    /// Load OpenAPI spec from URL, picking the format from the Content-Type header.
    pub async fn from_url(url: &str) -> AgentResult<Self> {
        let response = reqwest::get(url).await.map_err(|e| AgentError::Http {
            operation: format!("fetch OpenAPI spec from {url}"),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(AgentError::Http {
                operation: format!("fetch OpenAPI spec from {url}"),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_default();

        let content = response.text().await?;

        let spec = if content_type.contains("json") || url.ends_with(".json") {
            serde_json::from_str::<OpenAPI>(&content)
                .map_err(|e| spec_error(format!("Failed to parse JSON from '{url}': {e}")))?
        } else if content_type.contains("yaml") || url.ends_with(".yaml") || url.ends_with(".yml") {
            serde_yaml::from_str::<OpenAPI>(&content)
                .map_err(|e| spec_error(format!("Failed to parse YAML from '{url}': {e}")))?
        } else {
            parse_any(&content)
                .map_err(|e| spec_error(format!("Failed to parse spec from '{url}': {e}")))?
        };

        // Without a servers entry, calls go to the host the document came from
        let fallback = url::Url::parse(url)
            .ok()
            .map(|u| u.origin().ascii_serialization());
        Self::from_parsed(spec, None).map(|mut parsed| {
            if parsed.spec.servers.is_empty() {
                if let Some(origin) = fallback {
                    parsed.base_url = origin;
                }
            }
            parsed
        })
    }

    /// Load OpenAPI spec from a string, trying JSON first and then YAML.
    ///
    /// `base_url` overrides the document's `servers` entry when given.
    pub fn from_str(content: &str, base_url: Option<String>) -> AgentResult<Self> {
        let spec = parse_any(content)
            .map_err(|e| spec_error(format!("Failed to parse OpenAPI spec string: {e}")))?;
        Self::from_parsed(spec, base_url)
    }

    fn from_parsed(spec: OpenAPI, base_url: Option<String>) -> AgentResult<Self> {
        Self::validate_spec(&spec)?;

        let base_url = base_url
            .or_else(|| spec.servers.first().map(|s| s.url.clone()))
            .unwrap_or_else(|| FALLBACK_BASE_URL.to_string());

        Ok(Self { spec, base_url })
    }

    /// Fail only on issues that make tool generation impossible
    fn validate_spec(spec: &OpenAPI) -> AgentResult<()> {
        if !spec.openapi.starts_with("3.") {
            return Err(spec_error(format!(
                "Unsupported OpenAPI version '{}'. Only 3.x is supported",
                spec.openapi
            )));
        }

        if spec.paths.paths.is_empty() {
            return Err(spec_error(
                "OpenAPI spec has no paths defined. Cannot generate tools without API operations",
            ));
        }

        let mut operation_ids = HashSet::new();
        let mut duplicates = Vec::new();

        for path_item in spec.paths.paths.values() {
            let ReferenceOr::Item(item) = path_item else {
                continue;
            };
            for (_, operation) in item.iter() {
                if let Some(op_id) = &operation.operation_id {
                    if !operation_ids.insert(op_id.clone()) {
                        duplicates.push(op_id.clone());
                    }
                }
            }
        }

        if !duplicates.is_empty() {
            return Err(spec_error(format!(
                "Duplicate operation IDs found: [{}]",
                duplicates.join(", ")
            )));
        }

        Ok(())
    }

    /// Replace the base URL used for API calls
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Get the base URL for API calls
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get access to the underlying OpenAPI spec
    pub fn spec(&self) -> &OpenAPI {
        &self.spec
    }

    /// Looks up a `#/components/schemas/<name>` reference.
    pub fn resolve_schema_ref(&self, reference: &str) -> Option<&Schema> {
        let name = reference.strip_prefix("#/components/schemas/")?;
        match self.spec.components.as_ref()?.schemas.get(name)? {
            ReferenceOr::Item(schema) => Some(schema),
            ReferenceOr::Reference { reference } => self.resolve_schema_ref(reference),
        }
    }

    /// Looks up a `#/components/parameters/<name>` reference.
    pub fn resolve_parameter_ref(&self, reference: &str) -> Option<&Parameter> {
        let name = reference.strip_prefix("#/components/parameters/")?;
        match self.spec.components.as_ref()?.parameters.get(name)? {
            ReferenceOr::Item(parameter) => Some(parameter),
            ReferenceOr::Reference { reference } => self.resolve_parameter_ref(reference),
        }
    }

    /// Security scheme declared under `components/securitySchemes`.
    pub fn security_scheme(&self, name: &str) -> Option<&SecurityScheme> {
        match self.spec.components.as_ref()?.security_schemes.get(name)? {
            ReferenceOr::Item(scheme) => Some(scheme),
            ReferenceOr::Reference { .. } => None,
        }
    }
}

fn parse_any(content: &str) -> Result<OpenAPI, String> {
    serde_json::from_str::<OpenAPI>(content)
        .or_else(|json_err| {
            serde_yaml::from_str::<OpenAPI>(content)
                .map_err(|yaml_err| format!("not JSON ({json_err}) nor YAML ({yaml_err})"))
        })
}
