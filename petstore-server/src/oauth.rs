//! Mock OAuth2 authorization server.
//!
//! Implements just enough of the authorization-code grant for a client to
//! obtain a bearer token: a login page, a login submission that redirects back
//! with a code, and a token endpoint that swaps any known code for a token.
//! No client secrets, PKCE, expiry or refresh tokens.

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use dashmap::{DashMap, DashSet};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use petstore_types::{AuthorizationGrant, TokenResponse};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::{
    config::DemoCredentials,
    error::{ApiError, Result},
    routes::ServerState,
};

/// Codes and tokens issued by the mock authorization server.
#[derive(Debug)]
pub struct OAuthState {
    credentials: DemoCredentials,
    token_lifetime_secs: u64,
    codes: DashMap<String, AuthorizationGrant>,
    tokens: DashSet<String>,
}

impl OAuthState {
    pub fn new(credentials: DemoCredentials, token_lifetime_secs: u64) -> Self {
        Self {
            credentials,
            token_lifetime_secs,
            codes: DashMap::new(),
            tokens: DashSet::new(),
        }
    }

    pub fn credentials(&self) -> &DemoCredentials {
        &self.credentials
    }

    /// Checks the demo credentials and mints an authorization code for the client.
    pub fn authorize(&self, username: &str, password: &str, client_id: &str) -> Result<String> {
        if !self.credentials.matches(username, password) {
            return Err(ApiError::InvalidCredentials);
        }

        let code = Uuid::new_v4().to_string();
        self.codes.insert(
            code.clone(),
            AuthorizationGrant {
                client_id: client_id.to_string(),
                user: username.to_string(),
            },
        );
        Ok(code)
    }

    /// Swaps a known authorization code for a new bearer token.
    ///
    /// Codes stay valid after use, so the same code can be exchanged again.
    pub fn exchange(&self, code: Option<&str>) -> Result<TokenResponse> {
        let code = code.ok_or(ApiError::InvalidGrant)?;
        if !self.codes.contains_key(code) {
            return Err(ApiError::InvalidGrant);
        }

        let token = format!("sat_{}_{}", code, Uuid::new_v4());
        self.tokens.insert(token.clone());
        Ok(TokenResponse::bearer(token, self.token_lifetime_secs))
    }

    pub fn grant(&self, code: &str) -> Option<AuthorizationGrant> {
        self.codes.get(code).map(|g| g.value().clone())
    }

    pub fn is_valid_token(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn issued_tokens(&self) -> usize {
        self.tokens.len()
    }
}

pub fn oauth_routes() -> Router<ServerState> {
    Router::new()
        .route("/oauth/authorize", get(authorize_page).post(authorize_submit))
        .route("/oauth/token", post(issue_token))
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub client_id: String,
    pub redirect_uri: String,
    pub state: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default = "default_response_type")]
    pub response_type: String,
}

fn default_response_type() -> String {
    "code".to_string()
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeForm {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub state: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenForm {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
}

async fn authorize_page(
    State(oauth): State<Arc<OAuthState>>,
    query: std::result::Result<Query<AuthorizeQuery>, QueryRejection>,
) -> Result<Html<String>> {
    let Query(query) = query?;
    tracing::info!(
        client_id = %query.client_id,
        scope = %query.scope,
        response_type = %query.response_type,
        "rendering login page"
    );
    Ok(Html(login_page(&query, oauth.credentials()).into_string()))
}

async fn authorize_submit(
    State(oauth): State<Arc<OAuthState>>,
    form: std::result::Result<Form<AuthorizeForm>, FormRejection>,
) -> Result<Response> {
    let Form(form) = form?;

    let code = oauth
        .authorize(&form.username, &form.password, &form.client_id)
        .inspect_err(|_| tracing::warn!(username = %form.username, "login rejected"))?;
    tracing::info!(client_id = %form.client_id, "authorization code issued");

    let location = redirect_with_code(&form.redirect_uri, &code, &form.state);
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

async fn issue_token(
    State(oauth): State<Arc<OAuthState>>,
    form: std::result::Result<Form<TokenForm>, FormRejection>,
) -> Result<Json<TokenResponse>> {
    let Form(form) = form?;
    tracing::info!(
        grant_type = ?form.grant_type,
        code = ?form.code,
        client_id = ?form.client_id,
        redirect_uri = ?form.redirect_uri,
        "token request received"
    );

    let token = oauth
        .exchange(form.code.as_deref())
        .inspect_err(|_| tracing::warn!("invalid grant, code not found"))?;
    tracing::info!(token = %token.access_token, "token issued");
    Ok(Json(token))
}

/// Appends `code` and `state` to the client's redirect URI.
fn redirect_with_code(redirect_uri: &str, code: &str, state: &str) -> String {
    match Url::parse(redirect_uri) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("code", code)
                .append_pair("state", state);
            url.to_string()
        }
        // Relative or otherwise unparsable URIs are passed through as given.
        Err(_) => {
            let sep = if redirect_uri.contains('?') { '&' } else { '?' };
            format!("{redirect_uri}{sep}code={code}&state={state}")
        }
    }
}

const LOGIN_CSS: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Helvetica, Arial, sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; background-color: #f4f4f9; color: #333; }
.container { background: white; padding: 2rem; border-radius: 8px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); width: 100%; max-width: 400px; }
h2 { margin-top: 0; color: #6200ea; }
label { display: block; margin-bottom: 0.5rem; font-weight: 500; }
input { width: 100%; padding: 0.75rem; margin-bottom: 1rem; border: 1px solid #ddd; border-radius: 4px; font-size: 1rem; box-sizing: border-box; }
button { width: 100%; padding: 0.75rem; background-color: #6200ea; color: white; border: none; border-radius: 4px; font-size: 1rem; cursor: pointer; }
button:hover { background-color: #3700b3; }
.info { font-size: 0.875rem; color: #666; margin-bottom: 1.5rem; }
"#;

fn login_page(query: &AuthorizeQuery, credentials: &DemoCredentials) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                title { "PetStore Login" }
                style { (PreEscaped(LOGIN_CSS)) }
            }
            body {
                div.container {
                    h2 { "PetStore Auth" }
                    p.info {
                        "Demo Authorization Server. "
                        br;
                        "Use " b { (credentials.username) } " / " b { (credentials.password) } " to sign in."
                    }
                    form action="/oauth/authorize" method="post" {
                        input type="hidden" name="client_id" value=(query.client_id);
                        input type="hidden" name="redirect_uri" value=(query.redirect_uri);
                        input type="hidden" name="state" value=(query.state);

                        label { "Username" }
                        input type="text" name="username" value=(credentials.username) required;

                        label { "Password" }
                        input type="password" name="password" value=(credentials.password) required;

                        button type="submit" { "Authorize" }
                    }
                }
            }
        }
    }
}
