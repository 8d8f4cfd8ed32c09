//! OpenAPI 3.x support: tools generated from an API document.
//!
//! # Example
//! ```no_run
//! use openapi_agent::tools::openapi::{AuthConfig, OpenApiToolSet};
//! use openapi_agent::tools::BaseToolset;
//!
//! # async fn demo() -> openapi_agent::errors::AgentResult<()> {
//! let auth = AuthConfig::from_token("apikey", None, Some("api_key"), "special-key")?;
//! let toolset =
//!     OpenApiToolSet::from_url("petstore".to_string(), "http://127.0.0.1:8000/openapi.json", Some(auth))
//!         .await?;
//!
//! let tools = toolset.get_tools().await;
//! # Ok(())
//! # }
//! ```

pub mod oauth2;
pub mod operation_tool;
pub mod spec;
pub mod toolset;

pub use oauth2::{AuthorizationResponse, OAuth2AuthorizationCode, OAuth2Token};
pub use operation_tool::OpenApiOperationTool;
pub use spec::OpenApiSpec;
pub use toolset::{AuthConfig, HeaderOrQuery, OpenApiToolSet};
