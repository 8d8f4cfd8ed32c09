use axum::{
    async_trait,
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use petstore_types::ErrorDetail;
use std::{fmt::Debug, sync::Arc};

use crate::oauth::OAuthState;

/// Identity attached to a request that passed authentication.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The access token the caller presented, without its scheme prefix.
    pub token: String,
}

/// Trait for authenticating HTTP requests before they reach a protected route.
#[async_trait]
pub trait AuthExtractor: Send + Sync + 'static {
    /// Extract authentication context from request parts
    async fn extract(&self, parts: &mut Parts) -> Result<AuthContext, AuthError>;
}

/// Authentication error that can be converted to HTTP response
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingCredentials,

    #[error("Invalid or expired token. Please authenticate via the OAuth flow.")]
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))],
            Json(ErrorDetail::new(self.to_string())),
        )
            .into_response()
    }
}

/// Accepts requests whose `Authorization` header carries a token issued by
/// the mock authorization server. Only set membership is checked.
#[derive(Clone)]
pub struct BearerTokenAuth {
    oauth: Arc<OAuthState>,
}

impl BearerTokenAuth {
    pub fn new(oauth: Arc<OAuthState>) -> Self {
        Self { oauth }
    }
}

impl Debug for BearerTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerTokenAuth").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthExtractor for BearerTokenAuth {
    async fn extract(&self, parts: &mut Parts) -> Result<AuthContext, AuthError> {
        let raw = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::MissingCredentials)?;

        let token = bearer_token(raw);
        tracing::debug!(token, "verifying bearer token");

        if !self.oauth.is_valid_token(token) {
            tracing::warn!("token verification failed, token was never issued");
            return Err(AuthError::InvalidToken);
        }

        Ok(AuthContext {
            token: token.to_string(),
        })
    }
}

/// Strips a `Bearer ` prefix and keeps the first space-separated segment after it.
/// Values without the prefix are taken as the token itself.
pub fn bearer_token(header_value: &str) -> &str {
    if header_value.starts_with("Bearer ") {
        header_value.split(' ').nth(1).unwrap_or_default()
    } else {
        header_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_strips_prefix() {
        assert_eq!(bearer_token("Bearer sat_abc"), "sat_abc");
        assert_eq!(bearer_token("sat_abc"), "sat_abc");
        assert_eq!(bearer_token("Bearer a b"), "a");
        assert_eq!(bearer_token("Bearer "), "");
    }

    #[test]
    fn test_bearer_prefix_is_case_sensitive() {
        assert_eq!(bearer_token("bearer sat_abc"), "bearer sat_abc");
    }
}
