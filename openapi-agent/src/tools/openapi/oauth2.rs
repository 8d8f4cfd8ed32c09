//! Client side of the OAuth2 authorization-code flow.
//!
//! The agent builds the authorization URL, the user signs in with a browser,
//! and the redirect URL they land on is handed back to exchange the code for
//! a bearer token.

use openapiv3::SecurityScheme;
use serde::Deserialize;
use url::Url;

use crate::errors::{AgentError, AgentResult};
use crate::tools::openapi::{AuthConfig, OpenApiSpec};

/// Access token returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuth2Token {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl OAuth2Token {
    pub fn into_auth_config(self) -> AuthConfig {
        AuthConfig::Bearer {
            token: self.access_token,
        }
    }
}

/// `code` and `state` read back from the redirect URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: String,
}

#[derive(Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OAuth2AuthorizationCode {
    client_id: String,
    client_secret: Option<String>,
    authorization_url: String,
    token_url: String,
    redirect_uri: String,
    scopes: Vec<String>,
    http: reqwest::Client,
}

fn flow_error(stage: &str, reason: impl Into<String>) -> AgentError {
    AgentError::OAuthFlow {
        stage: stage.to_string(),
        reason: reason.into(),
    }
}

impl OAuth2AuthorizationCode {
    pub fn new(
        client_id: impl Into<String>,
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            authorization_url: authorization_url.into(),
            token_url: token_url.into(),
            redirect_uri: redirect_uri.into(),
            scopes: Vec::new(),
            http: reqwest::Client::new(),
        }
    }

    /// Reads the authorization and token URLs, plus every declared scope,
    /// from an `oauth2` security scheme with an `authorizationCode` flow.
    pub fn from_spec(
        spec: &OpenApiSpec,
        scheme: &str,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> AgentResult<Self> {
        let Some(SecurityScheme::OAuth2 { flows, .. }) = spec.security_scheme(scheme) else {
            return Err(AgentError::Config {
                field: "security_scheme".to_string(),
                reason: format!("'{scheme}' is not an OAuth2 security scheme"),
            });
        };
        let flow = flows
            .authorization_code
            .as_ref()
            .ok_or_else(|| AgentError::Config {
                field: "security_scheme".to_string(),
                reason: format!("'{scheme}' has no authorizationCode flow"),
            })?;

        Ok(
            Self::new(client_id, &flow.authorization_url, &flow.token_url, redirect_uri)
                .with_scopes(flow.scopes.keys().cloned()),
        )
    }

    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Random value to pass as `state` and check on the way back.
    pub fn new_state() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    pub fn authorization_url(&self, state: &str) -> AgentResult<Url> {
        let mut url = Url::parse(&self.authorization_url)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);
        Ok(url)
    }

    /// Extracts the code from the URL the browser was redirected to.
    pub fn parse_redirect(
        &self,
        redirect: &str,
        expected_state: &str,
    ) -> AgentResult<AuthorizationResponse> {
        let url = Url::parse(redirect.trim())?;
        let mut code = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => return Err(flow_error("authorization", value.into_owned())),
                _ => {}
            }
        }

        let code = code.ok_or_else(|| flow_error("authorization", "redirect has no code"))?;
        let state = state.unwrap_or_default();
        if state != expected_state {
            return Err(flow_error("authorization", "state mismatch"));
        }
        Ok(AuthorizationResponse { code, state })
    }

    #[tracing::instrument(skip_all, fields(token_url = %self.token_url))]
    pub async fn exchange_code(&self, code: &str) -> AgentResult<OAuth2Token> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| flow_error("token exchange", e.to_string()))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let reason = match serde_json::from_str::<TokenErrorBody>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {description}", err.error),
                    None => err.error,
                },
                Err(_) => format!("HTTP {}: {body}", status.as_u16()),
            };
            tracing::warn!(%reason, "token exchange rejected");
            return Err(flow_error("token exchange", reason));
        }

        let token: OAuth2Token = serde_json::from_str(&body)?;
        tracing::info!(expires_in = ?token.expires_in, "obtained access token");
        Ok(token)
    }
}
