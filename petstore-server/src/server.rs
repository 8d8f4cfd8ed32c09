use axum::{middleware, response::IntoResponse, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::{AuthExtractor, BearerTokenAuth},
    config::{ApiVariant, DemoCredentials, ServerConfig},
    oauth::{oauth_routes, OAuthState},
    openapi::openapi_document,
    routes::{pet_read_routes, pet_write_routes, ServerState},
    store::PetStore,
};

/// Pet Store HTTP server, in either the basic or the OAuth-protected variant.
pub struct PetStoreServer {
    config: Arc<ServerConfig>,
    store: Arc<PetStore>,
    oauth: Arc<OAuthState>,
    auth_extractor: Option<Arc<dyn AuthExtractor>>,
}

impl PetStoreServer {
    /// Create a new server builder
    pub fn builder(variant: ApiVariant) -> PetStoreServerBuilder {
        PetStoreServerBuilder::new(variant)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<PetStore> {
        self.store.clone()
    }

    /// Display server startup information
    fn display_server_info(&self, local_addr: &std::net::SocketAddr) {
        tracing::info!("🚀 Pet Store Server Starting");
        tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        tracing::info!("📡 Server listening at: http://{}", local_addr);
        tracing::info!("🔐 Variant: {}", self.config.variant);
        tracing::info!(
            "📋 OpenAPI document available at: {}/openapi.json",
            self.config.public_url.trim_end_matches('/')
        );
        tracing::info!("🐾 Pets in store: {}", self.store.len());

        if self.config.variant.requires_auth() {
            tracing::info!("  Authorize: {}", self.config.authorization_url());
            tracing::info!("  Token:     {}", self.config.token_url());
            tracing::info!(
                "  Demo login: {} / {}",
                self.config.credentials.username,
                self.config.credentials.password
            );
        }
    }

    /// Convert the server into an Axum router
    pub fn into_router(self) -> Router {
        let state = ServerState {
            store: self.store.clone(),
            oauth: self.oauth.clone(),
            config: self.config.clone(),
        };

        let mut writes = pet_write_routes();
        if let Some(auth_extractor) = self.auth_extractor.clone() {
            writes = writes.route_layer(middleware::from_fn(
                move |req: axum::extract::Request, next: middleware::Next| {
                    let extractor = auth_extractor.clone();
                    async move {
                        let (mut parts, body) = req.into_parts();
                        match extractor.extract(&mut parts).await {
                            Ok(auth) => {
                                parts.extensions.insert(auth);
                                let req = axum::extract::Request::from_parts(parts, body);
                                Ok(next.run(req).await)
                            }
                            Err(e) => Err(e.into_response()),
                        }
                    }
                },
            ));
        }

        let mut app = Router::new()
            .merge(writes)
            .merge(pet_read_routes())
            .route("/openapi.json", get(openapi_document));

        if self.config.variant.requires_auth() {
            app = app.merge(oauth_routes());
        }

        app.with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Run the server on the specified address
    pub async fn serve(self, addr: impl tokio::net::ToSocketAddrs) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        self.serve_listener(listener).await
    }

    /// Run the server on an already bound listener
    pub async fn serve_listener(self, listener: tokio::net::TcpListener) -> Result<(), std::io::Error> {
        let local_addr = listener.local_addr()?;
        self.display_server_info(&local_addr);

        let app = self.into_router();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Builder for configuring a Pet Store server
pub struct PetStoreServerBuilder {
    config: ServerConfig,
    store: Option<Arc<PetStore>>,
    auth_extractor: Option<Arc<dyn AuthExtractor>>,
}

impl PetStoreServerBuilder {
    fn new(variant: ApiVariant) -> Self {
        Self {
            config: ServerConfig::new(variant),
            store: None,
            auth_extractor: None,
        }
    }

    /// Base URL advertised to clients (OpenAPI servers and OAuth2 URLs)
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.config.public_url = url.into();
        self
    }

    /// Credentials accepted by the mock login page
    pub fn with_credentials(mut self, credentials: DemoCredentials) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// Start from an existing store instead of the seeded demo data
    pub fn with_store(mut self, store: Arc<PetStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the bearer-token check on write routes
    pub fn with_auth<E: AuthExtractor + 'static>(mut self, extractor: E) -> Self {
        self.auth_extractor = Some(Arc::new(extractor));
        self
    }

    /// Build the server
    pub fn build(self) -> PetStoreServer {
        let oauth = Arc::new(OAuthState::new(
            self.config.credentials.clone(),
            self.config.token_lifetime_secs,
        ));

        // The OAuth variant checks tokens issued by its own authorization server
        let auth_extractor = match self.auth_extractor {
            Some(extractor) => Some(extractor),
            None if self.config.variant.requires_auth() => {
                Some(Arc::new(BearerTokenAuth::new(oauth.clone())) as Arc<dyn AuthExtractor>)
            }
            None => None,
        };

        PetStoreServer {
            config: Arc::new(self.config),
            store: self.store.unwrap_or_else(|| Arc::new(PetStore::seeded())),
            oauth,
            auth_extractor,
        }
    }
}
