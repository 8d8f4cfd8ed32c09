use std::fmt;

/// Which flavour of the Pet Store API to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVariant {
    /// All endpoints public.
    Basic,
    /// Write endpoints require a bearer token from the mock OAuth2 flow.
    OAuth,
}

impl ApiVariant {
    pub fn requires_auth(self) -> bool {
        matches!(self, ApiVariant::OAuth)
    }

    /// The OAuth variant does not default a missing `photoUrls` field.
    pub fn requires_photo_urls(self) -> bool {
        matches!(self, ApiVariant::OAuth)
    }
}

impl fmt::Display for ApiVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiVariant::Basic => f.write_str("basic"),
            ApiVariant::OAuth => f.write_str("oauth2 authorization code"),
        }
    }
}

/// Username and password accepted by the mock login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoCredentials {
    pub username: String,
    pub password: String,
}

impl DemoCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl Default for DemoCredentials {
    fn default() -> Self {
        Self::new("user", "password")
    }
}

pub const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub variant: ApiVariant,
    /// Base URL advertised in `/openapi.json` and in the OAuth2 flow URLs.
    pub public_url: String,
    pub credentials: DemoCredentials,
    /// Reported as `expires_in`; never enforced.
    pub token_lifetime_secs: u64,
}

impl ServerConfig {
    pub fn new(variant: ApiVariant) -> Self {
        Self {
            variant,
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            credentials: DemoCredentials::default(),
            token_lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
        }
    }

    pub fn authorization_url(&self) -> String {
        format!("{}/oauth/authorize", self.public_url.trim_end_matches('/'))
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.public_url.trim_end_matches('/'))
    }
}
